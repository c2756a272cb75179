//! Ship matching and voyage ship selection.

use crewsync_types::{PlatformConfig, Ship, ShipId, ShipSchematic, VoyageDescription};

/// Antimatter bonus for a ship that carries the voyage's ship trait.
pub const VOYAGE_TRAIT_BONUS: u32 = 150;

/// Merge the ship catalogue with the player's ships.
///
/// Each schematic contributes the owned ship of the same name, or its own
/// ship at level 0 with id 0 when the player does not own one. Owned ships
/// with no schematic are appended. Every ship gets its trait display names.
pub fn match_ships(
    schematics: &[ShipSchematic],
    owned: &[Ship],
    platform: &PlatformConfig,
) -> Vec<Ship> {
    let mut ships: Vec<Ship> = schematics
        .iter()
        .map(|schematic| {
            owned
                .iter()
                .find(|ship| ship.name == schematic.ship.name)
                .cloned()
                .unwrap_or_else(|| Ship {
                    level: 0,
                    id: ShipId(0),
                    ..schematic.ship.clone()
                })
        })
        .collect();

    for ship in owned {
        if !ships.iter().any(|s| s.name == ship.name) {
            ships.push(ship.clone());
        }
    }

    for ship in &mut ships {
        ship.trait_names = ship
            .traits
            .iter()
            .chain(&ship.traits_hidden)
            .map(|key| platform.ship_trait_name(key))
            .collect::<Vec<_>>()
            .join(",");
    }
    ships
}

/// Voyage score of one ship.
pub fn voyage_score(ship: &Ship, voyage: &VoyageDescription) -> u32 {
    let bonus = if ship.traits.contains(&voyage.ship_trait) {
        VOYAGE_TRAIT_BONUS
    } else {
        0
    };
    ship.antimatter.saturating_add(bonus)
}

/// The owned ships tied for the best voyage score.
pub fn best_voyage_ships<'a>(ships: &'a [Ship], voyage: &VoyageDescription) -> Vec<&'a Ship> {
    let owned = ships.iter().filter(|ship| ship.is_owned());
    let Some(best) = owned.clone().map(|ship| voyage_score(ship, voyage)).max() else {
        return Vec::new();
    };
    owned
        .filter(|ship| voyage_score(ship, voyage) == best)
        .collect()
}
