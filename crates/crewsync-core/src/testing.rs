//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crewsync_cache::{CacheError, CacheStore, Table};
use serde_json::Value;

use crate::api::GameApi;
use crate::transport::{Query, Transport, TransportError};

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub params: Query,
    pub token: Option<String>,
}

/// Replies with a fixed body per path (404 otherwise) and records requests.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, Value>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    pub fn reply(mut self, path: &str, body: Value) -> Self {
        self.replies.insert(path.to_owned(), body);
        self
    }

    #[allow(clippy::unwrap_used)]
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.seen().iter().filter(|s| s.path == path).count()
    }

    #[allow(clippy::unwrap_used)]
    fn answer(
        &self,
        path: &str,
        params: &Query,
        token: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.seen.lock().unwrap().push(Seen {
            path: path.to_owned(),
            params: params.clone(),
            token: token.map(str::to_owned),
        });
        self.replies
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::status(404, "not found"))
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Value, TransportError> {
        self.answer(path, query, None)
    }

    async fn post(
        &self,
        path: &str,
        form: &Query,
        token: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.answer(path, form, token)
    }
}

/// A logged-in client over `transport`.
pub fn logged_in(transport: ScriptedTransport) -> GameApi<ScriptedTransport> {
    GameApi::new(transport, Some("secret".to_owned()))
}

/// A cache that is always empty and refuses every write.
pub struct FullDisk;

impl CacheStore for FullDisk {
    async fn get_raw(&self, _table: Table, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn put_raw(&self, _table: Table, _key: &str, _value: String) -> Result<(), CacheError> {
        Err(CacheError::Config("disk full".to_owned()))
    }
}
