use crate::config::SteamSettings;
use serde::{Deserialize, Serialize};

pub const LOGIN_URL: &str = "https://www.pathofexile.com/login/steam";
pub const GAME_SITE: &str = "https://www.pathofexile.com";
pub const PROVIDER_SITE: &str = "https://steamcommunity.com";
pub const SESSION_COOKIE: &str = "POESESSID";
pub const MACHINE_AUTH_PREFIX: &str = "steamMachineAuth";

const GAME_DOMAIN: &str = "pathofexile.com";
const PROVIDER_DOMAIN: &str = "steamcommunity.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Cookie {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
        }
    }

    pub fn same_identity(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    fn is_session(&self) -> bool {
        self.name == SESSION_COOKIE && self.domain.contains(GAME_DOMAIN)
    }

    fn is_machine_auth(&self) -> bool {
        self.name.starts_with(MACHINE_AUTH_PREFIX)
            && self.name.len() > MACHINE_AUTH_PREFIX.len()
            && self.domain.contains(PROVIDER_DOMAIN)
    }

    /// Steam id carried in a machine-auth cookie name.
    pub fn steam_id(&self) -> Option<&str> {
        self.name
            .strip_prefix(MACHINE_AUTH_PREFIX)
            .filter(|id| !id.is_empty())
    }
}

/// The remembered machine-auth cookie to seed before navigating, so the
/// provider skips email verification. Nothing is seeded without a value.
pub fn seed_cookie(settings: &SteamSettings) -> Option<Cookie> {
    let steam_id = settings.steam_id.as_deref().filter(|id| !id.is_empty())?;
    let value = settings
        .machine_auth
        .as_deref()
        .filter(|value| !value.is_empty())?;
    Some(Cookie::new(
        format!("{MACHINE_AUTH_PREFIX}{steam_id}"),
        value,
        PROVIDER_DOMAIN,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// First game-site load hands out a throwaway session.
    AwaitingInitialSession,
    AwaitingProviderAuth,
    /// Provider authorized the machine; the next game session is the real one.
    AwaitingFinalSession,
    Complete,
    Cancelled,
}

impl LoginState {
    pub fn is_finished(self) -> bool {
        matches!(self, LoginState::Complete | LoginState::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    CookieAdded(Cookie),
    PageLoaded(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Pending,
    RememberMachineAuth(Cookie),
    Completed { session_id: String },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SteamLogin {
    state: LoginState,
    cookies: Vec<Cookie>,
    session_id: Option<String>,
    /// Set when a session cookie arrives or changes; cleared on provider auth.
    fresh_session: bool,
    remember_me: bool,
    remembered: Option<Cookie>,
}

impl SteamLogin {
    pub fn new(remember_me: bool, settings: &SteamSettings) -> Self {
        SteamLogin {
            state: LoginState::AwaitingInitialSession,
            cookies: Vec::new(),
            session_id: None,
            fresh_session: false,
            remember_me,
            remembered: seed_cookie(settings),
        }
    }

    pub fn start_url(&self) -> &'static str {
        LOGIN_URL
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn handle(&mut self, event: LoginEvent) -> LoginOutcome {
        if self.state.is_finished() {
            return LoginOutcome::Pending;
        }
        match event {
            LoginEvent::CookieAdded(cookie) => {
                self.store_cookie(cookie);
                LoginOutcome::Pending
            }
            LoginEvent::PageLoaded(url) => self.page_loaded(&url),
            LoginEvent::Closed => {
                self.state = LoginState::Cancelled;
                LoginOutcome::Cancelled
            }
        }
    }

    fn store_cookie(&mut self, cookie: Cookie) {
        if cookie.is_session()
            && !self
                .cookies
                .iter()
                .any(|existing| existing.same_identity(&cookie) && existing.value == cookie.value)
        {
            self.fresh_session = true;
        }
        self.cookies.retain(|existing| !existing.same_identity(&cookie));
        self.cookies.push(cookie);
    }

    fn page_loaded(&mut self, url: &str) -> LoginOutcome {
        if url.starts_with(GAME_SITE) {
            let Some(session_id) = self
                .cookies
                .iter()
                .rev()
                .find(|cookie| cookie.is_session())
                .map(|cookie| cookie.value.clone())
            else {
                return LoginOutcome::Pending;
            };
            self.session_id = Some(session_id.clone());
            match self.state {
                LoginState::AwaitingInitialSession => {
                    self.state = LoginState::AwaitingProviderAuth;
                }
                LoginState::AwaitingFinalSession if self.fresh_session => {
                    self.state = LoginState::Complete;
                    return LoginOutcome::Completed { session_id };
                }
                _ => {}
            }
            return LoginOutcome::Pending;
        }

        if url.starts_with(PROVIDER_SITE) {
            let Some(auth) = self
                .cookies
                .iter()
                .rev()
                .find(|cookie| cookie.is_machine_auth())
                .cloned()
            else {
                return LoginOutcome::Pending;
            };
            if matches!(
                self.state,
                LoginState::AwaitingInitialSession | LoginState::AwaitingProviderAuth
            ) {
                self.state = LoginState::AwaitingFinalSession;
                self.fresh_session = false;
            }
            let changed = self
                .remembered
                .as_ref()
                .is_none_or(|stored| stored.name != auth.name || stored.value != auth.value);
            if self.remember_me && changed {
                self.remembered = Some(auth.clone());
                return LoginOutcome::RememberMachineAuth(auth);
            }
        }

        LoginOutcome::Pending
    }
}
