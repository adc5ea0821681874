use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::store::Store;

pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub msg: String,
    pub kind: AlertKind,
}

/// Live alerts, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertsState {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertAction {
    SetAlert(Alert),
    RemoveAlert(Uuid),
}

pub fn alert_reducer(state: &AlertsState, action: AlertAction) -> AlertsState {
    match action {
        AlertAction::SetAlert(alert) => {
            let mut alerts = state.alerts.clone();
            alerts.push(alert);
            AlertsState { alerts }
        }
        AlertAction::RemoveAlert(id) => AlertsState {
            alerts: state.alerts.iter().filter(|a| a.id != id).cloned().collect(),
        },
    }
}

/// Notification queue with self-expiring entries.
///
/// Every `set_alert` schedules its own removal. Scheduled removals only hold
/// a weak reference to the alert list and are aborted on [`teardown`] or
/// drop, so nothing fires into a torn-down owner.
///
/// [`teardown`]: AlertState::teardown
pub struct AlertState {
    store: Arc<Store<AlertsState, AlertAction>>,
    pending: Mutex<Vec<AbortHandle>>,
}

impl Default for AlertState {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertState {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Store::new(AlertsState::default(), alert_reducer)),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn alerts(&self) -> Arc<AlertsState> {
        self.store.snapshot()
    }

    /// Shows `msg` for the default three seconds.
    pub fn set_alert(&self, msg: &str, kind: AlertKind) -> Uuid {
        self.set_alert_for(msg, kind, DEFAULT_ALERT_DURATION)
    }

    pub fn set_alert_for(&self, msg: &str, kind: AlertKind, duration: Duration) -> Uuid {
        let id = Uuid::new_v4();
        self.store.dispatch(AlertAction::SetAlert(Alert {
            id,
            msg: msg.to_string(),
            kind,
        }));

        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "no tokio runtime; alert will not expire on its own");
            return id;
        };

        let store = Arc::downgrade(&self.store);
        let task = rt.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(store) = store.upgrade() {
                store.dispatch(AlertAction::RemoveAlert(id));
                debug!(%id, "alert expired");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(task.abort_handle());
        id
    }

    /// Removes an alert now. Unknown ids are ignored.
    pub fn dismiss(&self, id: Uuid) {
        self.store.dispatch(AlertAction::RemoveAlert(id));
    }

    /// Cancels every scheduled removal.
    pub fn teardown(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in pending.drain(..) {
            handle.abort();
        }
    }

    pub fn pending_removals(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.len()
    }
}

impl Drop for AlertState {
    fn drop(&mut self) {
        self.teardown();
    }
}
