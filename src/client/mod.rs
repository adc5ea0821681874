//! Client-side application state: immutable snapshots behind small stores,
//! plus the async actions that talk to the API.

pub mod alerts;
pub mod api;
pub mod auth;
pub mod contacts;
pub mod navbar;
pub mod store;

use std::sync::Arc;

use alerts::AlertState;
use api::ApiClient;
use auth::AuthSession;
use contacts::ContactContext;

/// Everything a UI tree needs, built once and passed down by reference.
pub struct ClientContext {
    pub api: ApiClient,
    pub alerts: Arc<AlertState>,
    pub auth: AuthSession,
    pub contacts: ContactContext,
}

impl ClientContext {
    pub fn new(base_url: &str) -> Self {
        let api = ApiClient::new(base_url);
        let alerts = Arc::new(AlertState::new());
        Self {
            auth: AuthSession::new(api.clone(), alerts.clone()),
            contacts: ContactContext::new(api.clone()),
            alerts,
            api,
        }
    }

    /// Signs out and forgets the previous user's contacts.
    pub fn log_out(&self, msg: &str) {
        use auth::AuthContext;
        self.auth.log_out(msg);
        self.contacts.clear_contacts();
    }
}

impl Drop for ClientContext {
    fn drop(&mut self) {
        self.alerts.teardown();
    }
}
