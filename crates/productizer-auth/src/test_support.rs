//! In-memory [`HttpFetch`] for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::http::{FetchError, HttpFetch, HttpResponse};

#[derive(Debug, Default)]
pub(crate) struct StaticHttp {
    routes: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<HashMap<String, usize>>,
    panics: Mutex<HashSet<String>>,
}

impl StaticHttp {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond_json(&self, url: &str, status: u16, body: serde_json::Value) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            HttpResponse {
                status,
                body: serde_json::to_vec(&body).unwrap(),
            },
        );
    }

    /// Make requests to `url` panic, as a crashing fetch task would
    pub(crate) fn panic_on(&self, url: &str) {
        self.panics.lock().unwrap().insert(url.to_string());
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HttpFetch for StaticHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let panics = self.panics.lock().unwrap().contains(url);
        if panics {
            panic!("fetch of {url} crashed");
        }
        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("connection refused: {url}")))
    }
}
