//! Authentication tier tests

use std::sync::Arc;

use gatehouse::auth::ticket;
use gatehouse::auth::{
    AuthSession, CookieWrite, Handling, MemoryDirectory, MemorySessionStore, RequestContext,
    Session, SessionStore, UserRecord, BAD_CREDENTIALS,
};
use gatehouse::config::AuthConfig;
use gatehouse::error::{Error, Result};

fn directory() -> Arc<MemoryDirectory> {
    Arc::new(MemoryDirectory::new(
        "password",
        vec![
            UserRecord::new("u1")
                .with_field("user", "alice")
                .with_field("password", "secret"),
            UserRecord::new("u2")
                .with_field("user", "bob")
                .with_field("password", "hunter2"),
        ],
    ))
}

fn auth_with_store(store: Arc<dyn SessionStore>) -> AuthSession {
    AuthSession::new(AuthConfig::default(), store, directory())
}

fn auth() -> AuthSession {
    auth_with_store(Arc::new(MemorySessionStore::new(30)))
}

fn credentials() -> RequestContext {
    RequestContext::new()
        .with_param("user", "alice")
        .with_param("password", "secret")
}

/// Session store that fails to load existing ids but can create fresh sessions
struct FlakyStore {
    inner: MemorySessionStore,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(30),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for FlakyStore {
    async fn open(&self, id: Option<&str>) -> Result<Session> {
        match id {
            Some(_) => Err(Error::SessionInit("store offline".to_string())),
            None => self.inner.open(None).await,
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.inner.save(session).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn test_login_twice_is_noop() {
    let auth = auth();
    let mut ctx = RequestContext::new();

    assert!(auth.login(&mut ctx).await.unwrap());
    let id = ctx.session_id.clone().unwrap();
    ctx.session.as_mut().unwrap().insert("color", "green");

    assert!(auth.login(&mut ctx).await.unwrap());
    assert_eq!(ctx.session_id.as_deref(), Some(id.as_str()));
    assert_eq!(ctx.session.as_ref().unwrap().get("color"), Some("green"));
}

#[tokio::test]
async fn test_login_exposes_render_data() {
    let auth = auth();
    let mut ctx = RequestContext::new();

    auth.login(&mut ctx).await.unwrap();
    assert!(ctx.render_value("session").is_some());
    assert_eq!(
        ctx.render_value("session_id").and_then(|v| v.as_str()),
        ctx.session_id.as_deref()
    );
}

#[tokio::test]
async fn test_private_without_credentials_denied() {
    let auth = auth();
    let mut ctx = RequestContext::new();

    assert!(!auth.private(&mut ctx).await.unwrap());
    assert!(ctx.user.is_none());
}

#[tokio::test]
async fn test_private_with_valid_credentials() {
    let auth = auth();
    let mut ctx = credentials();

    assert!(auth.private(&mut ctx).await.unwrap());
    assert_eq!(ctx.session.as_ref().unwrap().uid(), Some("u1"));
    assert_eq!(ctx.user.as_ref().unwrap().id, "u1");
    assert_eq!(ctx.user.as_ref().unwrap().field("user"), Some("alice"));
}

#[tokio::test]
async fn test_bad_password_sets_login_error() {
    let auth = auth();
    let mut ctx = RequestContext::new()
        .with_param("user", "alice")
        .with_param("password", "wrong");

    assert!(!auth.private(&mut ctx).await.unwrap());
    assert!(ctx.user.is_none());
    assert_eq!(ctx.login_error(), Some(BAD_CREDENTIALS));
}

#[tokio::test]
async fn test_session_uid_reused_across_requests() {
    let store = Arc::new(MemorySessionStore::new(30));
    let auth = auth_with_store(store.clone());

    let mut first = credentials();
    assert!(auth.private(&mut first).await.unwrap());
    let id = first.session_id.clone().unwrap();

    // Second request carries only the cookie, no credentials
    let mut second = RequestContext::new().with_cookie("sessionid", &id);
    assert!(auth.private(&mut second).await.unwrap());
    assert_eq!(second.user.as_ref().unwrap().id, "u1");
}

#[tokio::test]
async fn test_ticket_issue_then_verify_round_trip() {
    let auth = auth();

    let mut issue = credentials();
    assert!(auth.restricted(&mut issue).await.unwrap());
    let value = issue
        .render_value("ticket")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let (user, password) = ticket::decode(&value).unwrap();
    assert_eq!(user, "alice");
    assert_eq!(password, "secret");

    // Feed the issued value back through the verify path
    let mut verify = RequestContext::new().with_param("ticket", &value);
    assert!(auth.restricted(&mut verify).await.unwrap());
    assert_eq!(verify.session.as_ref().unwrap().uid(), Some("u1"));

    // Not rotated on verify
    assert_eq!(
        verify.render_value("ticket").and_then(|v| v.as_str()),
        Some(value.as_str())
    );
}

#[tokio::test]
async fn test_restricted_needs_ticket_every_request() {
    let store = Arc::new(MemorySessionStore::new(30));
    let auth = auth_with_store(store);

    let mut first = credentials();
    assert!(auth.restricted(&mut first).await.unwrap());
    let id = first.session_id.clone().unwrap();

    // Session continuity alone is not enough for the restricted tier
    let mut second = RequestContext::new().with_cookie("sessionid", &id);
    assert!(!auth.restricted(&mut second).await.unwrap());
}

#[tokio::test]
async fn test_malformed_ticket_denied() {
    let auth = auth();
    let mut ctx = RequestContext::new().with_param("ticket", "zz-not-hex");

    assert!(!auth.restricted(&mut ctx).await.unwrap());
    assert_eq!(ctx.login_error(), Some("Invalid ticket"));
    assert!(ctx.session.as_ref().unwrap().uid().is_none());
}

#[tokio::test]
async fn test_ticket_verify_does_not_overwrite_uid() {
    let store = Arc::new(MemorySessionStore::new(30));
    let auth = auth_with_store(store);

    let mut first = credentials();
    assert!(auth.private(&mut first).await.unwrap());
    let id = first.session_id.clone().unwrap();

    let bob_ticket = ticket::encode("bob", "hunter2").unwrap();
    let mut second = RequestContext::new()
        .with_cookie("sessionid", &id)
        .with_param("ticket", &bob_ticket);

    assert!(auth.restricted(&mut second).await.unwrap());
    assert_eq!(second.session.as_ref().unwrap().uid(), Some("u1"));
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let store = Arc::new(MemorySessionStore::new(30));
    let auth = auth_with_store(store.clone());

    let mut ctx = credentials();
    assert!(auth.private(&mut ctx).await.unwrap());
    assert_eq!(store.session_count().await, 1);
    ctx.take_cookie_writes();

    auth.logout(&mut ctx).await.unwrap();

    assert!(ctx.user.is_none());
    assert!(ctx.session.is_none());
    assert!(ctx.session_id.is_none());
    assert_eq!(store.session_count().await, 0);

    let writes = ctx.cookie_writes();
    assert!(matches!(&writes[0], CookieWrite::Expire { name, .. } if name == "sessionid"));
}

#[tokio::test]
async fn test_logout_without_session_is_noop() {
    let auth = auth();
    let mut ctx = RequestContext::new();
    auth.logout(&mut ctx).await.unwrap();
    assert!(ctx.session.is_none());
}

#[tokio::test]
async fn test_check_credentials_explicit_pair() {
    let auth = auth();
    let mut ctx = RequestContext::new();

    let matched = auth
        .check_credentials(&mut ctx, Some("bob"), Some("hunter2"))
        .await
        .unwrap()
        .expect("bob should match");

    assert_eq!(matched.uid, "u2");
    assert_eq!(matched.user, "bob");
    assert_eq!(matched.password, "hunter2");
}

#[tokio::test]
async fn test_check_credentials_missing_fields() {
    let auth = auth();
    let mut ctx = RequestContext::new().with_param("user", "alice");

    let matched = auth.check_credentials(&mut ctx, None, None).await.unwrap();
    assert!(matched.is_none());
    assert!(ctx.login_error().is_none());
}

#[tokio::test]
async fn test_uid_to_user() {
    let auth = auth();
    let user = auth.uid_to_user("u1").await.expect("u1 present");
    assert_eq!(user.field("user"), Some("alice"));
    assert!(auth.uid_to_user("u9").await.is_none());
}

#[tokio::test]
async fn test_session_failure_without_handler_denies() {
    let auth = auth_with_store(Arc::new(FlakyStore::new()));
    let mut ctx = RequestContext::new().with_cookie("sessionid", "stale-id");

    assert!(!auth.public(&mut ctx).await.unwrap());
    assert!(ctx.session.is_none());
    assert!(matches!(
        &ctx.cookie_writes()[0],
        CookieWrite::Expire { name, .. } if name == "sessionid"
    ));
}

#[tokio::test]
async fn test_session_failure_abort_handler() {
    let auth = auth_with_store(Arc::new(FlakyStore::new()))
        .with_session_handler(Arc::new(|_| Handling::Abort));
    let mut ctx = RequestContext::new().with_cookie("sessionid", "stale-id");

    let err = auth.public(&mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::SessionInit(_)));
}

#[tokio::test]
async fn test_session_failure_recover_handler_starts_fresh() {
    let auth = auth_with_store(Arc::new(FlakyStore::new()))
        .with_session_handler(Arc::new(|_| Handling::Recover));
    let mut ctx = RequestContext::new().with_cookie("sessionid", "stale-id");

    assert!(auth.public(&mut ctx).await.unwrap());
    let session = ctx.session.as_ref().expect("fresh session");
    assert_ne!(session.id(), "stale-id");
}

#[tokio::test]
async fn test_login_failure_abort_handler() {
    let auth = auth().with_login_handler(Arc::new(|err| match err {
        Error::Login(_) => Handling::Abort,
        _ => Handling::Deny,
    }));
    let mut ctx = RequestContext::new()
        .with_param("user", "alice")
        .with_param("password", "wrong");

    let err = auth.private(&mut ctx).await.unwrap_err();
    assert!(matches!(err, Error::Login(message) if message == BAD_CREDENTIALS));
}
