//! Per-request authentication state
//!
//! A [`RequestContext`] is the crate's view of one incoming request: form
//! parameters and cookies on the way in, session/user slots mutated by the
//! tier operations, queued cookie writes and render data on the way out.
//! The embedding HTTP layer builds one per request and applies the queued
//! cookie writes to the response.

use std::collections::HashMap;

use serde_json::Value;

use crate::auth::directory::UserRecord;
use crate::auth::session::Session;

/// A queued cookie side effect. Writes are fire-and-forget: there is no
/// rollback if the response never reaches the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieWrite {
    Set {
        name: String,
        value: String,
        path: String,
        max_age_minutes: Option<i64>,
    },
    Expire {
        name: String,
        path: String,
    },
}

impl CookieWrite {
    /// Render as a Set-Cookie header value
    pub fn to_header(&self) -> String {
        match self {
            CookieWrite::Set {
                name,
                value,
                path,
                max_age_minutes,
            } => {
                let mut header = format!("{}={}; Path={}; HttpOnly", name, value, path);
                if let Some(minutes) = max_age_minutes {
                    header.push_str(&format!("; Max-Age={}", minutes * 60));
                }
                header
            }
            CookieWrite::Expire { name, path } => {
                format!("{}=; Path={}; Max-Age=0; HttpOnly", name, path)
            }
        }
    }
}

/// Mutable per-request state threaded through the tier operations
#[derive(Debug, Default)]
pub struct RequestContext {
    params: HashMap<String, String>,
    cookies: HashMap<String, String>,
    cookie_writes: Vec<CookieWrite>,

    /// Live session, populated by `login`
    pub session: Option<Session>,
    /// Session id as assigned by the store
    pub session_id: Option<String>,
    /// Authenticated user, populated by `private`
    pub user: Option<UserRecord>,

    render: HashMap<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_session_id(mut self, id: &str) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str, path: &str, max_age_minutes: Option<i64>) {
        self.cookie_writes.push(CookieWrite::Set {
            name: name.to_string(),
            value: value.to_string(),
            path: path.to_string(),
            max_age_minutes,
        });
    }

    pub fn expire_cookie(&mut self, name: &str, path: &str) {
        self.cookie_writes.push(CookieWrite::Expire {
            name: name.to_string(),
            path: path.to_string(),
        });
    }

    pub fn cookie_writes(&self) -> &[CookieWrite] {
        &self.cookie_writes
    }

    /// Drain queued cookie writes for application to a response
    pub fn take_cookie_writes(&mut self) -> Vec<CookieWrite> {
        std::mem::take(&mut self.cookie_writes)
    }

    /// Insert a value into the outgoing render data
    pub fn render_insert(&mut self, key: &str, value: Value) {
        self.render.insert(key.to_string(), value);
    }

    pub fn render_value(&self, key: &str) -> Option<&Value> {
        self.render.get(key)
    }

    pub fn render_data(&self) -> &HashMap<String, Value> {
        &self.render
    }

    pub fn set_login_error(&mut self, message: &str) {
        self.render
            .insert("login_error".to_string(), Value::String(message.to_string()));
    }

    pub fn login_error(&self) -> Option<&str> {
        self.render.get("login_error").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_write_set_header() {
        let write = CookieWrite::Set {
            name: "sessionid".to_string(),
            value: "abc".to_string(),
            path: "/".to_string(),
            max_age_minutes: Some(30),
        };
        assert_eq!(write.to_header(), "sessionid=abc; Path=/; HttpOnly; Max-Age=1800");
    }

    #[test]
    fn test_cookie_write_expire_header() {
        let write = CookieWrite::Expire {
            name: "sessionid".to_string(),
            path: "/".to_string(),
        };
        assert_eq!(write.to_header(), "sessionid=; Path=/; Max-Age=0; HttpOnly");
    }

    #[test]
    fn test_take_cookie_writes_drains() {
        let mut ctx = RequestContext::new();
        ctx.expire_cookie("sessionid", "/");
        assert_eq!(ctx.take_cookie_writes().len(), 1);
        assert!(ctx.cookie_writes().is_empty());
    }

    #[test]
    fn test_login_error_round_trip() {
        let mut ctx = RequestContext::new();
        assert!(ctx.login_error().is_none());
        ctx.set_login_error("Bad username or password");
        assert_eq!(ctx.login_error(), Some("Bad username or password"));
    }
}
