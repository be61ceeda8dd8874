use std::sync::Arc;

use core_sim::AssetQuote;
use runtime::{SessionEvent, SessionHandle, SessionSnapshot};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetsResponse {
    pub selected: String,
    pub assets: Vec<AssetQuote>,
}

/// Shared handler state: a handle onto the running session driver.
#[derive(Clone)]
pub struct AppState {
    session: SessionHandle,
}

impl AppState {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.session.snapshot()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe_events()
    }

    pub fn assets(&self) -> AssetsResponse {
        AssetsResponse {
            selected: self.snapshot().asset.clone(),
            assets: self.session.catalogue().to_vec(),
        }
    }
}
