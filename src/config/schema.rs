//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,

    /// User records served by the built-in directory
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4280
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Form field carrying the login name
    #[serde(default = "default_user_field")]
    pub user_field: String,

    /// Form field carrying the password
    #[serde(default = "default_password_field")]
    pub password_field: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Cookie lifetime in minutes; absent means a session cookie
    #[serde(default)]
    pub cookie_expiry_minutes: Option<i64>,
}

fn default_user_field() -> String {
    "user".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

fn default_cookie_name() -> String {
    "sessionid".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_field: default_user_field(),
            password_field: default_password_field(),
            cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            cookie_expiry_minutes: None,
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Directory for the file backend
    #[serde(default = "default_sessions_dir")]
    pub dir: PathBuf,

    /// Idle expiry in minutes
    #[serde(default = "default_session_expiry")]
    pub expiry_minutes: i64,
}

fn default_sessions_dir() -> PathBuf {
    PathBuf::from("./sessions")
}

fn default_session_expiry() -> i64 {
    30
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            dir: default_sessions_dir(),
            expiry_minutes: default_session_expiry(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    File,
}

/// A configured user record. The `id` is fixed; every other key is an
/// arbitrary named field matched by the directory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: String,

    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

impl Config {
    /// Get a configured user entry by id
    pub fn get_user(&self, id: &str) -> Option<&UserEntry> {
        self.users.iter().find(|u| u.id == id)
    }
}
