use super::auth::{AuthContext, AuthState};

pub const LOGOUT_MESSAGE: &str = "Logged out successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

pub const GUEST_LINKS: [NavLink; 3] = [
    NavLink { label: "Login", path: "/login" },
    NavLink { label: "Register", path: "/register" },
    NavLink { label: "About", path: "/about" },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItems {
    Authenticated { greeting: String },
    Guest { links: Vec<NavLink> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavbarView {
    pub title: String,
    pub icon: String,
    pub items: NavItems,
}

/// Top bar: bootstraps the session once and switches links on auth state.
#[derive(Debug, Clone)]
pub struct Navbar {
    pub title: String,
    pub icon: String,
    mounted: bool,
}

impl Default for Navbar {
    fn default() -> Self {
        Self::new("Contact Keeper", "fas fa-id-card")
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Navbar {
    pub fn new(title: &str, icon: &str) -> Self {
        Self {
            title: title.to_string(),
            icon: icon.to_string(),
            mounted: false,
        }
    }

    /// Loads the current user the first time it is called; later calls
    /// (re-renders) do nothing.
    pub async fn mount(&mut self, auth: &dyn AuthContext) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        auth.load_user().await;
    }

    pub fn render(&self, auth: &AuthState) -> NavbarView {
        let items = if auth.is_authenticated {
            let name = auth.user.as_ref().map(|u| capitalize(&u.name)).unwrap_or_default();
            NavItems::Authenticated {
                greeting: format!("Hello, {name}"),
            }
        } else {
            NavItems::Guest {
                links: GUEST_LINKS.to_vec(),
            }
        };
        NavbarView {
            title: self.title.clone(),
            icon: self.icon.clone(),
            items,
        }
    }

    pub fn logout(&self, auth: &dyn AuthContext) {
        auth.log_out(LOGOUT_MESSAGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::PublicUser;
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[derive(Default)]
    struct FakeAuth {
        loads: AtomicUsize,
        logouts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuthContext for FakeAuth {
        fn auth_state(&self) -> Arc<AuthState> {
            Arc::new(AuthState::default())
        }

        async fn load_user(&self) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }

        fn log_out(&self, msg: &str) {
            self.logouts.lock().unwrap().push(msg.to_string());
        }
    }

    fn signed_in(name: &str) -> AuthState {
        AuthState {
            is_authenticated: true,
            loading: false,
            user: Some(PublicUser {
                id: uuid::Uuid::new_v4(),
                name: name.into(),
                email: "x@example.com".into(),
                date: time::OffsetDateTime::now_utc(),
            }),
            ..AuthState::default()
        }
    }

    #[tokio::test]
    async fn mount_loads_user_exactly_once() {
        let auth = FakeAuth::default();
        let mut nav = Navbar::default();
        for _ in 0..3 {
            nav.mount(&auth).await;
            let _ = nav.render(&auth.auth_state());
        }
        assert_eq!(auth.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guest_sees_login_register_about() {
        let view = Navbar::default().render(&AuthState::default());
        assert_eq!(view.title, "Contact Keeper");
        assert_eq!(view.icon, "fas fa-id-card");
        let NavItems::Guest { links } = view.items else {
            panic!("expected guest links");
        };
        let labels: Vec<_> = links.iter().map(|l| l.label).collect();
        assert_eq!(labels, ["Login", "Register", "About"]);
    }

    #[test]
    fn authenticated_greeting_capitalizes_first_letter() {
        let view = Navbar::default().render(&signed_in("ann marie"));
        assert_eq!(
            view.items,
            NavItems::Authenticated {
                greeting: "Hello, Ann marie".into()
            }
        );
    }

    #[test]
    fn authenticated_without_user_yet_has_bare_greeting() {
        let state = AuthState {
            is_authenticated: true,
            ..AuthState::default()
        };
        let view = Navbar::default().render(&state);
        assert_eq!(
            view.items,
            NavItems::Authenticated {
                greeting: "Hello, ".into()
            }
        );
    }

    #[test]
    fn capitalize_handles_unicode_and_empty() {
        assert_eq!(capitalize("émile"), "Émile");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn logout_passes_the_success_message() {
        let auth = FakeAuth::default();
        Navbar::default().logout(&auth);
        assert_eq!(*auth.logouts.lock().unwrap(), vec![LOGOUT_MESSAGE.to_string()]);
    }
}
