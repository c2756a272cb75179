//! Crew complement minimizer.
//!
//! Given the scored candidates of every challenge, find crew whose absence
//! changes no challenge's best score. Greedy: scan the crew in encounter
//! order, drop the first one whose removal keeps the summed best scores at
//! the baseline, and rescan until a full pass drops nobody. The result is
//! minimal with respect to single removals, not globally minimal.
//!
//! The computation is pure. [`ComplementTask`] runs it on the blocking pool
//! and hands the answer back through a one-shot channel so the pipeline
//! never waits on it.

use std::collections::HashSet;

use crewsync_types::{ChallengeSuccess, ComplementResult, CrewId};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::SyncError;

/// Best remaining score of one entry, zero when every candidate is removed.
fn top_score(entry: &ChallengeSuccess, removed: &HashSet<CrewId>) -> f64 {
    entry
        .crew
        .iter()
        .filter(|candidate| !removed.contains(&candidate.crew_id))
        .map(|candidate| candidate.success)
        .fold(0.0, f64::max)
}

/// Sum of every entry's best remaining score.
fn total_score(entries: &[ChallengeSuccess], removed: &HashSet<CrewId>) -> f64 {
    entries.iter().map(|entry| top_score(entry, removed)).sum()
}

/// Every crew id in encounter order, without repeats.
fn crew_universe(entries: &[ChallengeSuccess]) -> Vec<CrewId> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .flat_map(|entry| entry.crew.iter().map(|candidate| candidate.crew_id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Split the observed crew into needed and unneeded crew.
///
/// `needed_crew` and `unneeded_crew` partition every crew id that appears in
/// `entries`; keeping only `needed_crew` reproduces every entry's best score.
pub fn minimal_complement(entries: &[ChallengeSuccess]) -> ComplementResult {
    let mut candidates = crew_universe(entries);
    let baseline = total_score(entries, &HashSet::new());
    let mut removed = HashSet::new();
    let mut unneeded = Vec::new();

    loop {
        // Removing crew never raises a best score, so reaching the baseline
        // means every entry kept its best score.
        let redundant = candidates.iter().position(|&id| {
            removed.insert(id);
            let keeps_outcome = total_score(entries, &removed) >= baseline;
            if !keeps_outcome {
                removed.remove(&id);
            }
            keeps_outcome
        });
        let Some(index) = redundant else {
            break;
        };
        unneeded.push(candidates.remove(index));
    }

    ComplementResult {
        needed_crew: candidates,
        unneeded_crew: unneeded,
    }
}

/// Input of one complement computation.
#[derive(Debug, Clone, Default)]
pub struct ComplementRequest {
    /// Scored challenge entries.
    pub entries: Vec<ChallengeSuccess>,
}

/// Output of one complement computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplementResponse {
    /// The partition of the observed crew.
    pub result: ComplementResult,
    /// Number of challenge entries considered.
    pub entries: usize,
}

/// Runs complement computations off the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplementTask;

impl ComplementTask {
    /// Start a computation on the blocking pool; the handle yields its answer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(request: ComplementRequest) -> ComplementHandle {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let entries = request.entries.len();
            let result = minimal_complement(&request.entries);
            debug!(
                entries,
                needed = result.needed_crew.len(),
                unneeded = result.unneeded_crew.len(),
                "crew complement computed"
            );
            // The receiver may be gone if the caller lost interest.
            let _ = tx.send(ComplementResponse { result, entries });
        });
        ComplementHandle { rx }
    }
}

/// Pending answer of a submitted complement computation.
#[derive(Debug)]
pub struct ComplementHandle {
    rx: oneshot::Receiver<ComplementResponse>,
}

impl ComplementHandle {
    /// Wait for the answer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Minimizer`] if the worker stopped without answering.
    pub async fn wait(self) -> Result<ComplementResponse, SyncError> {
        let response = self
            .rx
            .await
            .map_err(|e| SyncError::Minimizer(e.to_string()))?;
        info!(
            needed = response.result.needed_crew.len(),
            unneeded = response.result.unneeded_crew.len(),
            "crew complement ready"
        );
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use crewsync_types::{CrewSuccess, MissionId, QuestId};

    use super::*;

    fn entry(crew: &[(u64, f64)]) -> ChallengeSuccess {
        ChallengeSuccess::sorted(
            MissionId(1),
            QuestId(1),
            0,
            "command_skill",
            crew.iter()
                .map(|&(id, success)| CrewSuccess {
                    crew_id: CrewId(id),
                    success,
                })
                .collect(),
        )
    }

    fn keep_only(entries: &[ChallengeSuccess], keep: &[CrewId]) -> f64 {
        let removed: HashSet<CrewId> = crew_universe(entries)
            .into_iter()
            .filter(|id| !keep.contains(id))
            .collect();
        total_score(entries, &removed)
    }

    fn assert_partition(entries: &[ChallengeSuccess], result: &ComplementResult) {
        let mut all: Vec<CrewId> = result
            .needed_crew
            .iter()
            .chain(&result.unneeded_crew)
            .copied()
            .collect();
        all.sort_unstable();
        let mut universe = crew_universe(entries);
        universe.sort_unstable();
        assert_eq!(all, universe);
    }

    #[test]
    fn two_entry_example_keeps_the_baseline() {
        let entries = [entry(&[(1, 10.0), (2, 8.0)]), entry(&[(2, 5.0), (1, 3.0)])];
        assert_eq!(total_score(&entries, &HashSet::new()), 15.0);

        let result = minimal_complement(&entries);

        assert_eq!(keep_only(&entries, &result.needed_crew), 15.0);
        assert_partition(&entries, &result);
        assert_eq!(result.needed_crew, vec![CrewId(1), CrewId(2)]);
        assert!(result.unneeded_crew.is_empty());
    }

    #[test]
    fn dominated_crew_are_unneeded() {
        let entries = [
            entry(&[(1, 90.0), (2, 40.0), (3, 40.0)]),
            entry(&[(1, 70.0), (3, 60.0)]),
            entry(&[(4, 20.0), (2, 20.0)]),
        ];

        let result = minimal_complement(&entries);

        assert_partition(&entries, &result);
        assert_eq!(
            keep_only(&entries, &result.needed_crew),
            total_score(&entries, &HashSet::new())
        );
        assert!(result.unneeded_crew.contains(&CrewId(3)));
        // 2 and 4 tie on the last entry; the first scanned one goes.
        assert_eq!(result.needed_crew, vec![CrewId(1), CrewId(4)]);
    }

    #[test]
    fn removing_any_single_unneeded_crew_changes_nothing() {
        let entries = [
            entry(&[(1, 50.0), (2, 50.0), (3, 10.0)]),
            entry(&[(3, 80.0), (4, 80.0)]),
            entry(&[(5, 30.0)]),
            entry(&[]),
        ];
        let baseline = total_score(&entries, &HashSet::new());

        let result = minimal_complement(&entries);

        assert_partition(&entries, &result);
        for id in &result.unneeded_crew {
            let removed = HashSet::from([*id]);
            for entry in &entries {
                assert_eq!(top_score(entry, &removed), top_score(entry, &HashSet::new()));
            }
        }
        assert_eq!(keep_only(&entries, &result.needed_crew), baseline);
        assert_eq!(result.needed_crew.len(), 3);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let result = minimal_complement(&[]);
        assert!(result.needed_crew.is_empty());
        assert!(result.unneeded_crew.is_empty());
    }

    #[tokio::test]
    async fn submitted_task_answers_through_the_handle() {
        let entries = vec![entry(&[(1, 10.0), (2, 10.0)])];
        let expected = minimal_complement(&entries);

        let handle = ComplementTask::submit(ComplementRequest { entries });
        let response = handle.wait().await.unwrap();

        assert_eq!(response.result, expected);
        assert_eq!(response.entries, 1);
        assert_eq!(response.result.needed_crew, vec![CrewId(2)]);
    }
}
