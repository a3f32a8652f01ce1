//! Client-Side Router
//!
//! Maps a URL path to the visible screen and, under the authenticated `/app`
//! prefix, to a content view. Resolution rules:
//!
//! - `/app...` without a loaded session redirects to `/login`
//! - `/accept-invitation` and `/reset-password` validate their `token` query
//!   parameter with one backend call before a screen is chosen
//! - unknown `/app/...` paths fall back to the dashboard view, other unknown
//!   paths show the not-found screen
//!
//! Activating a view calls its loader exactly once per navigation. Back and
//! forward re-run resolution without pushing history.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError, ApiResult, InvitationDetails, ResetTokenStatus, LOGIN_PATH};
use crate::notify::Toasts;
use crate::session::SessionManager;

/// Prefix of every authenticated path
pub const APP_PREFIX: &str = "/app";

const MAX_REDIRECTS: usize = 3;

/// Top-level screens; exactly one is visible at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Landing,
    Login,
    Signup,
    ForgotPassword,
    ResetPassword,
    AcceptInvitation,
    InvalidLink,
    App,
    NotFound,
}

impl Screen {
    pub const ALL: [Screen; 9] = [
        Screen::Landing,
        Screen::Login,
        Screen::Signup,
        Screen::ForgotPassword,
        Screen::ResetPassword,
        Screen::AcceptInvitation,
        Screen::InvalidLink,
        Screen::App,
        Screen::NotFound,
    ];

    /// Element id of the screen in the page shell
    pub fn id(&self) -> &'static str {
        match self {
            Screen::Landing => "landing-screen",
            Screen::Login => "login-screen",
            Screen::Signup => "signup-screen",
            Screen::ForgotPassword => "forgot-password-screen",
            Screen::ResetPassword => "reset-password-screen",
            Screen::AcceptInvitation => "accept-invitation-screen",
            Screen::InvalidLink => "invalid-link-screen",
            Screen::App => "app-screen",
            Screen::NotFound => "not-found-screen",
        }
    }
}

/// Content views inside the authenticated app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Dashboard,
    Schedule,
    Events,
    People,
    Teams,
    Solutions,
    Invitations,
    Messages,
    Billing,
    Analytics,
    Onboarding,
    Settings,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Schedule => "schedule",
            View::Events => "events",
            View::People => "people",
            View::Teams => "teams",
            View::Solutions => "solutions",
            View::Invitations => "invitations",
            View::Messages => "messages",
            View::Billing => "billing",
            View::Analytics => "analytics",
            View::Onboarding => "onboarding",
            View::Settings => "settings",
        }
    }

    /// Canonical path of the view
    pub fn path(&self) -> String {
        format!("{}/{}", APP_PREFIX, self.as_str())
    }
}

static SCREEN_ROUTES: &[(&str, Screen)] = &[
    ("/", Screen::Landing),
    ("/login", Screen::Login),
    ("/signup", Screen::Signup),
    ("/forgot-password", Screen::ForgotPassword),
    ("/reset-password", Screen::ResetPassword),
    ("/accept-invitation", Screen::AcceptInvitation),
];

static VIEW_ROUTES: &[(&str, View)] = &[
    ("/app", View::Dashboard),
    ("/app/dashboard", View::Dashboard),
    ("/app/schedule", View::Schedule),
    ("/app/events", View::Events),
    ("/app/people", View::People),
    ("/app/teams", View::Teams),
    ("/app/solutions", View::Solutions),
    ("/app/invitations", View::Invitations),
    ("/app/messages", View::Messages),
    ("/app/billing", View::Billing),
    ("/app/analytics", View::Analytics),
    ("/app/onboarding", View::Onboarding),
    ("/app/settings", View::Settings),
];

/// A parsed URL: path plus decoded query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: HashMap<String, String>,
}

impl Location {
    /// Parse `/path?query#fragment`; a scheme and host are ignored.
    pub fn parse(url: &str) -> Self {
        // Only a `scheme://` ahead of any path, query or fragment is an origin
        let without_origin = match url.find("://") {
            Some(idx) if !url[..idx].contains(['/', '?', '#']) => {
                let rest = &url[idx + 3..];
                rest.find(['/', '?', '#']).map(|i| &rest[i..]).unwrap_or("/")
            }
            _ => url,
        };
        let without_fragment = without_origin.split('#').next().unwrap_or("");
        let (raw_path, raw_query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut path = raw_path.trim_end_matches('/').to_string();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let query = raw_query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();

        Self { path, query }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn is_app_path(&self) -> bool {
        self.path == APP_PREFIX || self.path.starts_with(&format!("{}/", APP_PREFIX))
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Data fetched while resolving a token link
#[derive(Debug, Clone, PartialEq)]
pub enum TokenContext {
    Invitation {
        token: String,
        details: InvitationDetails,
    },
    PasswordReset {
        token: String,
        email: Option<String>,
    },
}

/// Outcome of a navigation
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    /// Path that ended up displayed, after redirects
    pub path: String,
    pub screen: Screen,
    pub view: Option<View>,
    pub token: Option<TokenContext>,
}

impl RouteState {
    pub fn is_visible(&self, screen: Screen) -> bool {
        self.screen == screen
    }

    /// Every screen with its visibility
    pub fn screen_visibility(&self) -> Vec<(Screen, bool)> {
        Screen::ALL.iter().map(|s| (*s, *s == self.screen)).collect()
    }
}

enum Resolution {
    Show {
        screen: Screen,
        view: Option<View>,
        token: Option<TokenContext>,
    },
    Redirect(String),
}

/// Validates tokens from e-mailed links
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate_invitation(&self, token: &str) -> ApiResult<InvitationDetails>;
    async fn validate_reset_token(&self, token: &str) -> ApiResult<ResetTokenStatus>;
}

#[async_trait]
impl TokenValidator for ApiClient {
    async fn validate_invitation(&self, token: &str) -> ApiResult<InvitationDetails> {
        ApiClient::validate_invitation(self, token).await
    }

    async fn validate_reset_token(&self, token: &str) -> ApiResult<ResetTokenStatus> {
        ApiClient::validate_reset_token(self, token).await
    }
}

/// Loads the data a view needs when it becomes active
#[async_trait]
pub trait ViewLoader: Send + Sync {
    async fn load(&self, view: View) -> ApiResult<()>;
}

/// Path router with browser-style history
pub struct Router {
    session: SessionManager,
    validator: Arc<dyn TokenValidator>,
    loader: Arc<dyn ViewLoader>,
    toasts: Toasts,
    history: Vec<String>,
    cursor: usize,
    current: Option<RouteState>,
    return_to: Option<String>,
}

impl Router {
    pub fn new(
        session: SessionManager,
        validator: Arc<dyn TokenValidator>,
        loader: Arc<dyn ViewLoader>,
        toasts: Toasts,
    ) -> Self {
        Self {
            session,
            validator,
            loader,
            toasts,
            history: Vec::new(),
            cursor: 0,
            current: None,
            return_to: None,
        }
    }

    pub fn current(&self) -> Option<&RouteState> {
        self.current.as_ref()
    }

    /// History entries, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Navigate to a URL and push it onto history
    pub async fn navigate(&mut self, url: &str) -> RouteState {
        let (state, resolved_url) = self.resolve(url).await;
        self.history.truncate(if self.history.is_empty() { 0 } else { self.cursor + 1 });
        self.history.push(resolved_url);
        self.cursor = self.history.len() - 1;
        self.current = Some(state.clone());
        state
    }

    /// Browser back button
    pub async fn back(&mut self) -> Option<RouteState> {
        if self.cursor == 0 || self.history.is_empty() {
            return None;
        }
        self.cursor -= 1;
        Some(self.revisit().await)
    }

    /// Browser forward button
    pub async fn forward(&mut self) -> Option<RouteState> {
        if self.cursor + 1 >= self.history.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.revisit().await)
    }

    /// Where to go after a successful login
    pub async fn navigate_after_login(&mut self) -> RouteState {
        let target = self.return_to.take().unwrap_or_else(|| APP_PREFIX.to_string());
        self.navigate(&target).await
    }

    async fn revisit(&mut self) -> RouteState {
        let url = self.history[self.cursor].clone();
        let (state, resolved_url) = self.resolve(&url).await;
        // A redirect replaces the entry rather than pushing a new one
        self.history[self.cursor] = resolved_url;
        self.current = Some(state.clone());
        state
    }

    /// Resolve a URL, following redirects. Also returns the URL finally
    /// shown, query included, so history can replay token links.
    async fn resolve(&mut self, url: &str) -> (RouteState, String) {
        let mut target = url.to_string();
        let mut location = Location::parse(url);

        for _ in 0..=MAX_REDIRECTS {
            match self.resolve_location(&location).await {
                Resolution::Redirect(to) => {
                    tracing::debug!(from = %location.path, to = %to, "Redirecting");
                    location = Location::parse(&to);
                    target = to;
                }
                Resolution::Show { screen, view, token } => {
                    let state = RouteState {
                        path: location.path.clone(),
                        screen,
                        view,
                        token,
                    };

                    if let Some(view) = view {
                        match self.loader.load(view).await {
                            Ok(()) => {}
                            Err(ApiError::Unauthorized { redirect }) => {
                                self.return_to = Some(target.clone());
                                location = Location::parse(&redirect);
                                target = redirect;
                                continue;
                            }
                            Err(e) => {
                                self.toasts
                                    .api_error(&format!("Could not load {}", view.as_str()), &e);
                            }
                        }
                    }

                    tracing::debug!(path = %state.path, screen = ?state.screen, view = ?state.view, "Route resolved");
                    return (state, target);
                }
            }
        }

        tracing::warn!(url, "Too many redirects");
        let state = RouteState {
            path: location.path,
            screen: Screen::NotFound,
            view: None,
            token: None,
        };
        (state, target)
    }

    async fn resolve_location(&mut self, location: &Location) -> Resolution {
        if location.is_app_path() {
            if !self.session.is_loaded() {
                self.return_to = Some(location.path.clone());
                return Resolution::Redirect(LOGIN_PATH.to_string());
            }

            let view = VIEW_ROUTES
                .iter()
                .find(|(path, _)| *path == location.path)
                .map(|(_, view)| *view)
                .unwrap_or_else(|| {
                    tracing::warn!(path = %location.path, "Unknown app path, showing dashboard");
                    View::Dashboard
                });

            return Resolution::Show {
                screen: Screen::App,
                view: Some(view),
                token: None,
            };
        }

        match location.path.as_str() {
            "/" if self.session.is_loaded() => Resolution::Redirect(APP_PREFIX.to_string()),
            "/accept-invitation" => self.resolve_invitation(location.param("token")).await,
            "/reset-password" => self.resolve_password_reset(location.param("token")).await,
            path => {
                let screen = SCREEN_ROUTES
                    .iter()
                    .find(|(p, _)| *p == path)
                    .map(|(_, screen)| *screen)
                    .unwrap_or(Screen::NotFound);
                Resolution::Show {
                    screen,
                    view: None,
                    token: None,
                }
            }
        }
    }

    async fn resolve_invitation(&self, token: Option<&str>) -> Resolution {
        let Some(token) = token else {
            return invalid_link();
        };

        match self.validator.validate_invitation(token).await {
            Ok(details) if details.valid => Resolution::Show {
                screen: Screen::AcceptInvitation,
                view: None,
                token: Some(TokenContext::Invitation {
                    token: token.to_string(),
                    details,
                }),
            },
            Ok(_) => invalid_link(),
            Err(e) => {
                self.toasts.api_error("Could not check invitation", &e);
                invalid_link()
            }
        }
    }

    async fn resolve_password_reset(&self, token: Option<&str>) -> Resolution {
        let Some(token) = token else {
            return invalid_link();
        };

        match self.validator.validate_reset_token(token).await {
            Ok(status) if status.valid => Resolution::Show {
                screen: Screen::ResetPassword,
                view: None,
                token: Some(TokenContext::PasswordReset {
                    token: token.to_string(),
                    email: status.email,
                }),
            },
            Ok(_) => invalid_link(),
            Err(e) => {
                self.toasts.api_error("Could not check reset link", &e);
                invalid_link()
            }
        }
    }
}

fn invalid_link() -> Resolution {
    Resolution::Show {
        screen: Screen::InvalidLink,
        view: None,
        token: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::sample_session;
    use crate::storage::MemoryStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingLoader {
        loads: Mutex<Vec<View>>,
        /// Rejects the first load of this view only
        unauthorized_for: Option<View>,
        rejected: AtomicBool,
        session: Option<SessionManager>,
    }

    #[async_trait]
    impl ViewLoader for RecordingLoader {
        async fn load(&self, view: View) -> ApiResult<()> {
            self.loads.lock().unwrap().push(view);
            if self.unauthorized_for == Some(view) && !self.rejected.swap(true, Ordering::SeqCst) {
                if let Some(session) = &self.session {
                    session.clear().unwrap();
                }
                return Err(ApiError::Unauthorized {
                    redirect: LOGIN_PATH.to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenValidator for StubValidator {
        async fn validate_invitation(&self, token: &str) -> ApiResult<InvitationDetails> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                "good" => Ok(InvitationDetails {
                    valid: true,
                    email: Some("new@example.org".to_string()),
                    org_name: Some("Harbor Food Bank".to_string()),
                    inviter_name: None,
                }),
                "down" => Err(ApiError::Unavailable),
                _ => Ok(InvitationDetails {
                    valid: false,
                    email: None,
                    org_name: None,
                    inviter_name: None,
                }),
            }
        }

        async fn validate_reset_token(&self, token: &str) -> ApiResult<ResetTokenStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResetTokenStatus {
                valid: token == "good",
                email: Some("coord@example.org".to_string()),
            })
        }
    }

    struct Fixture {
        router: Router,
        loader: Arc<RecordingLoader>,
        validator: Arc<StubValidator>,
        session: SessionManager,
        toasts: Toasts,
    }

    fn fixture(logged_in: bool, loader: RecordingLoader) -> Fixture {
        let session = SessionManager::new(Arc::new(MemoryStore::new()));
        if logged_in {
            session.login(sample_session()).unwrap();
        }
        let loader = Arc::new(RecordingLoader {
            session: Some(session.clone()),
            ..loader
        });
        let validator = Arc::new(StubValidator::default());
        let toasts = Toasts::new();
        let router = Router::new(session.clone(), validator.clone(), loader.clone(), toasts.clone());
        Fixture {
            router,
            loader,
            validator,
            session,
            toasts,
        }
    }

    #[test]
    fn test_location_parse() {
        let loc = Location::parse("https://crew.example.org/accept-invitation/?token=a%2Bb&x=1#top");
        assert_eq!(loc.path, "/accept-invitation");
        assert_eq!(loc.param("token"), Some("a+b"));
        assert_eq!(loc.param("x"), Some("1"));
        assert_eq!(loc.param("missing"), None);

        assert_eq!(Location::parse("").path, "/");
        assert_eq!(Location::parse("/").path, "/");
        assert!(Location::parse("/app/people").is_app_path());
        assert!(!Location::parse("/application").is_app_path());

        let loc = Location::parse("/login?next=https://crew.example.org/app/people");
        assert_eq!(loc.path, "/login");
        assert_eq!(loc.param("next"), Some("https://crew.example.org/app/people"));

        let loc = Location::parse("http://localhost:3000?token=x");
        assert_eq!(loc.path, "/");
        assert_eq!(loc.param("token"), Some("x"));
    }

    #[tokio::test]
    async fn test_app_without_session_redirects_to_login() {
        let mut f = fixture(false, RecordingLoader::default());

        let state = f.router.navigate("/app").await;

        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.path, "/login");
        assert!(f.loader.loads.lock().unwrap().is_empty());
        assert_eq!(f.router.history(), &["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_schedule_with_session_loads_once() {
        let mut f = fixture(true, RecordingLoader::default());

        let state = f.router.navigate("/app/schedule").await;

        assert_eq!(state.screen, Screen::App);
        assert_eq!(state.view, Some(View::Schedule));
        assert_eq!(*f.loader.loads.lock().unwrap(), vec![View::Schedule]);
        assert!(state.is_visible(Screen::App));
        assert_eq!(
            state.screen_visibility().iter().filter(|(_, visible)| *visible).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_paths() {
        let mut f = fixture(true, RecordingLoader::default());

        let state = f.router.navigate("/app/nope").await;
        assert_eq!(state.view, Some(View::Dashboard));

        let state = f.router.navigate("/nowhere").await;
        assert_eq!(state.screen, Screen::NotFound);
    }

    #[tokio::test]
    async fn test_root_depends_on_session() {
        let mut anonymous = fixture(false, RecordingLoader::default());
        assert_eq!(anonymous.router.navigate("/").await.screen, Screen::Landing);

        let mut logged_in = fixture(true, RecordingLoader::default());
        let state = logged_in.router.navigate("/").await;
        assert_eq!(state.path, "/app");
        assert_eq!(state.view, Some(View::Dashboard));
    }

    #[tokio::test]
    async fn test_invitation_token_prefetch() {
        let mut f = fixture(false, RecordingLoader::default());

        let state = f.router.navigate("/accept-invitation?token=good").await;
        assert_eq!(state.screen, Screen::AcceptInvitation);
        match state.token {
            Some(TokenContext::Invitation { token, details }) => {
                assert_eq!(token, "good");
                assert_eq!(details.org_name.as_deref(), Some("Harbor Food Bank"));
            }
            other => panic!("unexpected token context {:?}", other),
        }
        assert_eq!(f.validator.calls.load(Ordering::SeqCst), 1);

        let state = f.router.navigate("/accept-invitation?token=stale").await;
        assert_eq!(state.screen, Screen::InvalidLink);

        let state = f.router.navigate("/accept-invitation").await;
        assert_eq!(state.screen, Screen::InvalidLink);
        assert_eq!(f.validator.calls.load(Ordering::SeqCst), 2);

        let state = f.router.navigate("/accept-invitation?token=down").await;
        assert_eq!(state.screen, Screen::InvalidLink);
        assert_eq!(f.toasts.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_token_prefetch() {
        let mut f = fixture(false, RecordingLoader::default());

        let state = f.router.navigate("/reset-password?token=good").await;
        assert_eq!(state.screen, Screen::ResetPassword);
        assert!(matches!(
            state.token,
            Some(TokenContext::PasswordReset { ref email, .. }) if email.as_deref() == Some("coord@example.org")
        ));
    }

    #[tokio::test]
    async fn test_back_forward_do_not_push() {
        let mut f = fixture(true, RecordingLoader::default());
        f.router.navigate("/app/people").await;
        f.router.navigate("/app/teams").await;
        f.router.navigate("/app/billing").await;

        let back = f.router.back().await.unwrap();
        assert_eq!(back.view, Some(View::Teams));
        let back = f.router.back().await.unwrap();
        assert_eq!(back.view, Some(View::People));
        assert!(f.router.back().await.is_none());

        let forward = f.router.forward().await.unwrap();
        assert_eq!(forward.view, Some(View::Teams));
        assert_eq!(f.router.history().len(), 3);

        // Navigating from the middle drops the forward entries
        f.router.navigate("/app/messages").await;
        assert_eq!(
            f.router.history(),
            &[
                "/app/people".to_string(),
                "/app/teams".to_string(),
                "/app/messages".to_string()
            ]
        );
        assert!(f.router.forward().await.is_none());
        // Three navigations, two backs, one forward, one navigation
        assert_eq!(f.loader.loads.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_back_to_token_link_keeps_token() {
        let mut f = fixture(false, RecordingLoader::default());
        let state = f.router.navigate("/accept-invitation?token=good").await;
        assert_eq!(state.screen, Screen::AcceptInvitation);
        f.router.navigate("/login").await;

        assert_eq!(
            f.router.history(),
            &["/accept-invitation?token=good".to_string(), "/login".to_string()]
        );

        let back = f.router.back().await.unwrap();
        assert_eq!(back.screen, Screen::AcceptInvitation);
        assert!(matches!(back.token, Some(TokenContext::Invitation { ref token, .. }) if token == "good"));
        assert_eq!(f.validator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_redirect_target_replaces_history_entry() {
        let mut f = fixture(true, RecordingLoader::default());
        f.router.navigate("/").await;
        f.router.navigate("/reset-password?token=good").await;

        assert_eq!(
            f.router.history(),
            &["/app".to_string(), "/reset-password?token=good".to_string()]
        );
    }

    #[tokio::test]
    async fn test_back_after_logout_redirects() {
        let mut f = fixture(true, RecordingLoader::default());
        f.router.navigate("/login").await;
        f.router.navigate("/app/events").await;
        f.router.back().await.unwrap();

        f.session.clear().unwrap();
        let state = f.router.forward().await.unwrap();
        assert_eq!(state.screen, Screen::Login);
    }

    #[tokio::test]
    async fn test_unauthorized_view_load_redirects_and_returns() {
        let mut f = fixture(
            true,
            RecordingLoader {
                unauthorized_for: Some(View::Analytics),
                ..Default::default()
            },
        );

        let state = f.router.navigate("/app/analytics").await;
        assert_eq!(state.screen, Screen::Login);
        assert!(!f.session.is_loaded());

        f.session.login(sample_session()).unwrap();
        let state = f.router.navigate_after_login().await;
        assert_eq!(state.path, "/app/analytics");
    }

    #[tokio::test]
    async fn test_view_load_failure_still_shows_view() {
        struct Failing;

        #[async_trait]
        impl ViewLoader for Failing {
            async fn load(&self, _view: View) -> ApiResult<()> {
                Err(ApiError::Timeout)
            }
        }

        let session = SessionManager::new(Arc::new(MemoryStore::new()));
        session.login(sample_session()).unwrap();
        let toasts = Toasts::new();
        let mut router = Router::new(
            session,
            Arc::new(StubValidator::default()),
            Arc::new(Failing),
            toasts.clone(),
        );

        let state = router.navigate("/app/people").await;
        assert_eq!(state.view, Some(View::People));
        assert_eq!(
            toasts.drain()[0].message,
            "Could not load people: The server took too long to respond"
        );
    }
}
