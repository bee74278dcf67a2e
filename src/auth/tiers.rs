//! Security tiers: public, private, restricted
//!
//! [`AuthSession`] drives the authentication work for one request at one of
//! three tiers:
//!
//! - `public` — a session exists, nothing more;
//! - `private` — the session carries an authenticated user id, established
//!   once from login credentials and reused on later requests;
//! - `restricted` — every request must present a valid ticket (or fresh
//!   credentials, which mint one); nothing restricted is remembered in the
//!   session between requests.
//!
//! Tier operations return `Ok(true)` when the tier is granted, `Ok(false)`
//! for a recoverable denial the caller is expected to branch on (typically
//! re-rendering a login form with the `login_error` render value), and `Err`
//! when a registered failure handler escalates or a store breaks beyond
//! recovery.

use std::sync::Arc;

use serde_json::json;

use crate::auth::directory::{UserDirectory, UserRecord};
use crate::auth::request::RequestContext;
use crate::auth::session::SessionStore;
use crate::auth::ticket;
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Render-data message for failed credential checks
pub const BAD_CREDENTIALS: &str = "Bad username or password";

/// Request field carrying a reauthorization ticket
const TICKET_FIELD: &str = "ticket";

/// Verdict from a registered failure handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// The handler resolved the failure; treat the operation as granted.
    /// For a session-store failure this retries with a fresh session; for a
    /// login failure the handler must have established authorization itself.
    Recover,
    /// Normal denial, same as having no handler registered
    Deny,
    /// Escalate: the operation returns the error and the request dies
    Abort,
}

/// Application-registered callback consulted when an auth failure occurs
pub type FailureHandler = Arc<dyn Fn(&Error) -> Handling + Send + Sync>;

/// A successful credential check
#[derive(Debug, Clone)]
pub struct CredentialMatch {
    /// Matched record's id
    pub uid: String,
    /// Matched record
    pub record: UserRecord,
    /// Raw pair the match was made with, reused for ticket minting
    pub user: String,
    pub password: String,
}

/// Tiered request authentication over injected session and user stores
#[derive(Clone)]
pub struct AuthSession {
    config: AuthConfig,
    sessions: Arc<dyn SessionStore>,
    directory: Arc<dyn UserDirectory>,
    on_session_failure: Option<FailureHandler>,
    on_login_failure: Option<FailureHandler>,
}

impl AuthSession {
    pub fn new(
        config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            config,
            sessions,
            directory,
            on_session_failure: None,
            on_login_failure: None,
        }
    }

    /// Register a handler for session store failures
    pub fn with_session_handler(mut self, handler: FailureHandler) -> Self {
        self.on_session_failure = Some(handler);
        self
    }

    /// Register a handler for credential and ticket failures
    pub fn with_login_handler(mut self, handler: FailureHandler) -> Self {
        self.on_login_failure = Some(handler);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Public tier: ensure a session exists
    pub async fn public(&self, ctx: &mut RequestContext) -> Result<bool> {
        self.login(ctx).await
    }

    /// Attach a session to the request. Idempotent: a request that already
    /// carries a session is left untouched.
    pub async fn login(&self, ctx: &mut RequestContext) -> Result<bool> {
        if ctx.session.is_some() {
            return Ok(true);
        }

        let desired = ctx
            .cookie(&self.config.cookie_name)
            .map(str::to_owned)
            .or_else(|| ctx.session_id.clone());

        let session = match self.sessions.open(desired.as_deref()).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("session store failure: {}", err);
                ctx.expire_cookie(&self.config.cookie_name, &self.config.cookie_path);
                match self.consult(&self.on_session_failure, &err) {
                    Handling::Recover => self.sessions.open(None).await?,
                    Handling::Deny => return Ok(false),
                    Handling::Abort => return Err(err),
                }
            }
        };

        let changed = desired.as_deref() != Some(session.id());

        ctx.session_id = Some(session.id().to_string());
        ctx.render_insert("session", json!(session.data()));
        ctx.render_insert("session_id", json!(session.id()));

        if changed {
            ctx.set_cookie(
                &self.config.cookie_name,
                session.id(),
                &self.config.cookie_path,
                self.config.cookie_expiry_minutes,
            );
        }

        ctx.session = Some(session);
        Ok(true)
    }

    /// Private tier: the session must carry an authenticated user id,
    /// established from form credentials on first contact
    pub async fn private(&self, ctx: &mut RequestContext) -> Result<bool> {
        if !self.public(ctx).await? {
            return Ok(false);
        }

        let uid = ctx
            .session
            .as_ref()
            .and_then(|session| session.uid().map(str::to_owned));

        let uid = match uid {
            Some(uid) => uid,
            None => match self.check_credentials(ctx, None, None).await? {
                Some(matched) => {
                    self.record_uid(ctx, &matched.uid).await?;
                    matched.uid
                }
                None => return self.login_denied(ctx),
            },
        };

        ctx.user = self.uid_to_user(&uid).await;
        Ok(ctx.user.is_some())
    }

    /// Restricted tier: a session plus a per-request ticket
    pub async fn restricted(&self, ctx: &mut RequestContext) -> Result<bool> {
        if !self.public(ctx).await? {
            return Ok(false);
        }
        self.ticket(ctx).await
    }

    /// Tear down the session: clear the user slot, delete the store entry if
    /// one is live, and expire the cookie. Safe to call without a session.
    pub async fn logout(&self, ctx: &mut RequestContext) -> Result<()> {
        ctx.user = None;

        if let Some(session) = ctx.session.take() {
            self.sessions.delete(session.id()).await?;
            tracing::debug!("session {} deleted", session.id());
        }

        ctx.session_id = None;
        ctx.expire_cookie(&self.config.cookie_name, &self.config.cookie_path);
        Ok(())
    }

    /// Verify a credential pair against the user directory. With no explicit
    /// pair the configured form fields are read; a missing field fails
    /// without touching the render data.
    pub async fn check_credentials(
        &self,
        ctx: &mut RequestContext,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<CredentialMatch>> {
        let user = user
            .map(str::to_owned)
            .or_else(|| ctx.param(&self.config.user_field).map(str::to_owned));
        let password = password
            .map(str::to_owned)
            .or_else(|| ctx.param(&self.config.password_field).map(str::to_owned));

        let (Some(user), Some(password)) = (user, password) else {
            return Ok(None);
        };

        let criteria = vec![
            (self.config.user_field.clone(), user.clone()),
            (self.config.password_field.clone(), password.clone()),
        ];

        let mut matches = self.directory.search(&criteria).await;
        let Some(record) = matches.pop() else {
            tracing::debug!("credential check failed for {:?}", user);
            ctx.set_login_error(BAD_CREDENTIALS);
            return Ok(None);
        };

        Ok(Some(CredentialMatch {
            uid: record.id.clone(),
            record,
            user,
            password,
        }))
    }

    /// Resolve a user id through the directory
    pub async fn uid_to_user(&self, uid: &str) -> Option<UserRecord> {
        self.directory.retrieve(uid).await
    }

    /// Ticket reauthorization. A request carrying a `ticket` field is on the
    /// verify path: the decoded pair is checked and the same value echoed
    /// back (never rotated). A request without one is on the issue path:
    /// form credentials are checked and a fresh ticket minted.
    pub async fn ticket(&self, ctx: &mut RequestContext) -> Result<bool> {
        match ctx.param(TICKET_FIELD).map(str::to_owned) {
            Some(raw) => {
                let (user, password) = match ticket::decode(&raw) {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::debug!("ticket decode failed: {}", err);
                        ctx.set_login_error(ticket::INVALID_TICKET);
                        return match self.consult(&self.on_login_failure, &err) {
                            Handling::Recover => Ok(true),
                            Handling::Deny => Ok(false),
                            Handling::Abort => Err(err),
                        };
                    }
                };

                match self
                    .check_credentials(ctx, Some(&user), Some(&password))
                    .await?
                {
                    Some(matched) => {
                        self.record_uid(ctx, &matched.uid).await?;
                        ctx.render_insert(TICKET_FIELD, json!(raw));
                        Ok(true)
                    }
                    None => self.login_denied(ctx),
                }
            }
            None => match self.check_credentials(ctx, None, None).await? {
                Some(matched) => {
                    let fresh = ticket::encode(&matched.user, &matched.password)?;
                    ctx.render_insert(TICKET_FIELD, json!(fresh));
                    Ok(true)
                }
                None => self.login_denied(ctx),
            },
        }
    }

    /// Write the uid into the session (first write wins) and persist it
    async fn record_uid(&self, ctx: &mut RequestContext, uid: &str) -> Result<()> {
        if let Some(session) = ctx.session.as_mut() {
            if session.uid().is_none() {
                session.set_uid(uid);
                self.sessions.save(session).await?;
            }
        }
        Ok(())
    }

    /// Route a login denial through the registered handler, if any
    fn login_denied(&self, ctx: &RequestContext) -> Result<bool> {
        let message = ctx.login_error().unwrap_or(BAD_CREDENTIALS).to_string();
        let err = Error::Login(message);
        match self.consult(&self.on_login_failure, &err) {
            Handling::Recover => Ok(true),
            Handling::Deny => Ok(false),
            Handling::Abort => Err(err),
        }
    }

    fn consult(&self, handler: &Option<FailureHandler>, err: &Error) -> Handling {
        match handler {
            Some(handler) => handler(err),
            None => Handling::Deny,
        }
    }
}
