use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    alerts::{AlertKind, AlertState},
    api::{ApiClient, ClientError},
    store::Store,
};
use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub user: Option<PublicUser>,
    pub error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            token: None,
            refresh_token: None,
            is_authenticated: false,
            loading: true,
            user: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    UserLoaded(PublicUser),
    AuthError,
    RegisterSuccess(AuthResponse),
    LoginSuccess(AuthResponse),
    RegisterFail(String),
    LoginFail(String),
    Logout,
    ClearErrors,
}

fn signed_out(error: Option<String>) -> AuthState {
    AuthState {
        loading: false,
        error,
        ..AuthState::default()
    }
}

pub fn auth_reducer(state: &AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::UserLoaded(user) => AuthState {
            is_authenticated: true,
            loading: false,
            user: Some(user),
            ..state.clone()
        },
        AuthAction::RegisterSuccess(resp) | AuthAction::LoginSuccess(resp) => AuthState {
            token: Some(resp.token),
            refresh_token: Some(resp.refresh_token),
            is_authenticated: true,
            loading: false,
            user: Some(resp.user),
            error: None,
        },
        AuthAction::AuthError | AuthAction::Logout => signed_out(None),
        AuthAction::RegisterFail(msg) | AuthAction::LoginFail(msg) => signed_out(Some(msg)),
        AuthAction::ClearErrors => AuthState {
            error: None,
            ..state.clone()
        },
    }
}

/// What UI components need from the session.
#[async_trait]
pub trait AuthContext: Send + Sync {
    fn auth_state(&self) -> Arc<AuthState>;
    /// Resolves the current user from the stored token.
    async fn load_user(&self);
    /// Ends the session and confirms with a success alert carrying `msg`.
    fn log_out(&self, msg: &str);
}

pub struct AuthSession {
    store: Store<AuthState, AuthAction>,
    api: ApiClient,
    alerts: Arc<AlertState>,
}

impl AuthSession {
    pub fn new(api: ApiClient, alerts: Arc<AlertState>) -> Self {
        Self {
            store: Store::new(AuthState::default(), auth_reducer),
            api,
            alerts,
        }
    }

    pub fn state(&self) -> Arc<AuthState> {
        self.store.snapshot()
    }

    fn signed_in(&self, resp: AuthResponse, registered: bool) -> PublicUser {
        self.api.set_token(Some(resp.token.clone()));
        let user = resp.user.clone();
        let action = if registered {
            AuthAction::RegisterSuccess(resp)
        } else {
            AuthAction::LoginSuccess(resp)
        };
        self.store.dispatch(action);
        info!(user_id = %user.id, "signed in");
        user
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<PublicUser, ClientError> {
        match self.api.register(&req).await {
            Ok(resp) => Ok(self.signed_in(resp, true)),
            Err(e) => {
                self.api.set_token(None);
                self.store.dispatch(AuthAction::RegisterFail(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<PublicUser, ClientError> {
        match self.api.login(&req).await {
            Ok(resp) => Ok(self.signed_in(resp, false)),
            Err(e) => {
                self.api.set_token(None);
                self.store.dispatch(AuthAction::LoginFail(e.to_string()));
                Err(e)
            }
        }
    }

    /// Swaps the refresh token for a fresh pair; a rejected refresh signs out.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let Some(refresh_token) = self.state().refresh_token.clone() else {
            self.store.dispatch(AuthAction::AuthError);
            return Err(ClientError::Api {
                status: 401,
                msg: "No refresh token".into(),
            });
        };
        match self.api.refresh(&refresh_token).await {
            Ok(resp) => {
                self.signed_in(resp, false);
                Ok(())
            }
            Err(e) => {
                self.api.set_token(None);
                self.store.dispatch(AuthAction::AuthError);
                Err(e)
            }
        }
    }

    pub fn clear_errors(&self) {
        self.store.dispatch(AuthAction::ClearErrors);
    }
}

#[async_trait]
impl AuthContext for AuthSession {
    fn auth_state(&self) -> Arc<AuthState> {
        self.state()
    }

    async fn load_user(&self) {
        if self.api.token().is_none() {
            self.store.dispatch(AuthAction::AuthError);
            return;
        }
        match self.api.load_user().await {
            Ok(user) => {
                self.store.dispatch(AuthAction::UserLoaded(user));
            }
            Err(e) => {
                warn!(error = %e, "load user failed");
                self.api.set_token(None);
                self.store.dispatch(AuthAction::AuthError);
            }
        }
    }

    fn log_out(&self, msg: &str) {
        self.api.set_token(None);
        self.store.dispatch(AuthAction::Logout);
        self.alerts.set_alert(msg, AlertKind::Success);
    }
}
