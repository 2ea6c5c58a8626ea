use tracing::{debug, warn};

use crate::io::bridge::PersistenceBridge;
use crate::model::board::BoardState;
use crate::ops::search::{self, SearchResults};

use super::action::Action;
use super::reduce::{self, Outcome};

/// The dispatch/query boundary handed to UI layers and the CLI.
///
/// Owns the live `BoardState` and an optional persistence bridge. All
/// mutation goes through `dispatch`; reads go through `state()` and the
/// query helpers. After each non-transient action the committed state is
/// forwarded to the bridge, which debounces the actual write.
pub struct Store {
    state: BoardState,
    bridge: Option<PersistenceBridge>,
}

impl Store {
    pub fn new(state: BoardState) -> Self {
        Store {
            state,
            bridge: None,
        }
    }

    pub fn with_bridge(state: BoardState, bridge: PersistenceBridge) -> Self {
        Store {
            state,
            bridge: Some(bridge),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Apply an action and commit the resulting state.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let reduction = reduce::reduce(&self.state, &action);
        match &reduction.outcome {
            Outcome::Applied => {}
            Outcome::Ignored => debug!(action = action.name(), "action ignored"),
            Outcome::Failed(err) => warn!(action = action.name(), %err, "action failed"),
        }
        self.state = reduction.state;

        if !action.is_transient()
            && reduction.outcome == Outcome::Applied
            && let Some(bridge) = &self.bridge
        {
            bridge.notify(self.state.clone());
        }
        reduction.outcome
    }

    /// Evaluate the stored search filter against the current state.
    pub fn search(&self) -> SearchResults {
        search::search(&self.state, &self.state.search)
    }

    /// Force any pending debounced write to disk now.
    pub fn flush(&mut self) {
        if let Some(bridge) = &self.bridge {
            bridge.flush();
        }
    }

    /// Last persistence failure, if any, for surfacing as a transient
    /// notification.
    pub fn persistence_error(&self) -> Option<String> {
        self.bridge.as_ref().and_then(|b| b.last_error())
    }
}
