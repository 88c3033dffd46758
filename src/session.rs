use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cookie::{Cookie, SameSite};
use log::{debug, trace};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn cookie(&self, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, self.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .build()
    }
}

impl FromStr for SessionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s).map(Self).map_err(|_| ())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Success,
    Danger,
    Warning,
    Info,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub category: Category,
    pub message: &'static str,
}

#[derive(Debug, Default)]
pub struct Session {
    username: Option<String>,
    flashes: Vec<Flash>,
}

/// Every browser we've handed a token to, logged in or not.
#[derive(Default)]
pub struct Sessions(HashMap<SessionId, Session>);

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the client's token, issuing a fresh one when it's absent or
    /// unknown. The flag is true for a fresh token. Fresh tokens aren't
    /// recorded until something is stored against them.
    pub fn resume(&self, client: Option<&str>) -> (SessionId, bool) {
        let known = client
            .and_then(|s| SessionId::from_str(s).ok())
            .filter(|id| self.0.contains_key(id));

        match known {
            Some(id) => {
                trace!("resumed session {id}");
                (id, false)
            }
            None => {
                let id = SessionId::new();
                debug!("issued session {id}");
                (id, true)
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn start(&mut self, id: SessionId, username: &str) {
        self.0.entry(id).or_default().username = Some(username.into());
    }

    pub fn current(&self, id: SessionId) -> Option<&str> {
        self.0.get(&id).and_then(|s| s.username.as_deref())
    }

    /// Returns who was logged in, if anyone.
    pub fn end(&mut self, id: SessionId) -> Option<String> {
        self.0.get_mut(&id).and_then(|s| s.username.take())
    }

    pub fn flash(&mut self, id: SessionId, category: Category, message: &'static str) {
        self.0
            .entry(id)
            .or_default()
            .flashes
            .push(Flash { category, message });
    }

    pub fn take_flashes(&mut self, id: SessionId) -> Vec<Flash> {
        self.0
            .get_mut(&id)
            .map(|s| std::mem::take(&mut s.flashes))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn issues_token_for_unknown_cookie() {
        let mut sessions = Sessions::new();

        let (a, fresh) = sessions.resume(None);
        assert!(fresh);

        let (b, fresh) = sessions.resume(Some("garbage"));
        assert!(fresh);
        assert_ne!(a, b);

        let forged = SessionId::new().to_string();
        let (_, fresh) = sessions.resume(Some(&forged));
        assert!(fresh);

        // nothing stored against `a` yet
        let (c, fresh) = sessions.resume(Some(&a.to_string()));
        assert!(fresh);
        assert_ne!(c, a);

        sessions.flash(c, Category::Info, "hola");
        let (again, fresh) = sessions.resume(Some(&c.to_string()));
        assert!(!fresh);
        assert_eq!(again, c);
    }

    #[test]
    fn unused_tokens_are_not_kept() {
        let mut sessions = Sessions::new();

        for _ in 0..1000 {
            let (id, fresh) = sessions.resume(None);
            assert!(fresh);
            assert!(sessions.take_flashes(id).is_empty());
            assert_eq!(sessions.current(id), None);
            assert_eq!(sessions.end(id), None);
        }

        assert_eq!(sessions.len(), 0);

        let (id, _) = sessions.resume(None);
        sessions.start(id, "ana");
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn start_current_end() {
        let mut sessions = Sessions::new();
        let (id, _) = sessions.resume(None);

        assert_eq!(sessions.current(id), None);
        sessions.start(id, "ana");
        assert_eq!(sessions.current(id), Some("ana"));

        assert_eq!(sessions.end(id).as_deref(), Some("ana"));
        assert_eq!(sessions.current(id), None);
        assert_eq!(sessions.end(id), None);
    }

    #[test]
    fn flashes_are_one_shot_and_survive_logout() {
        let mut sessions = Sessions::new();
        let (id, _) = sessions.resume(None);
        sessions.start(id, "ana");

        sessions.end(id);
        sessions.flash(id, Category::Info, "bye");

        let flashes = sessions.take_flashes(id);
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].category, Category::Info);
        assert!(sessions.take_flashes(id).is_empty());
    }

    #[test]
    fn cookie_attributes() {
        let id = SessionId::new();
        let cookie = id.cookie(true).to_string();

        assert!(cookie.starts_with(&format!("session={id}")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }
}
