//! API route handlers
//!
//! Each handler adapts the HTTP request into a [`RequestContext`] (Cookie
//! header and form body in), runs a tier operation, and applies the queued
//! cookie writes to the response on the way out.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::json;

use super::server::SharedState;
use crate::auth::RequestContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Build a request context from the Cookie header and form parameters
pub(crate) fn request_context(
    headers: &HeaderMap,
    params: HashMap<String, String>,
) -> RequestContext {
    let mut ctx = RequestContext::new();

    for (name, value) in params {
        ctx = ctx.with_param(&name, &value);
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=') {
                    ctx = ctx.with_cookie(name, value);
                }
            }
        }
    }

    ctx
}

/// Apply queued cookie writes as Set-Cookie headers
pub(crate) fn with_cookies(ctx: &mut RequestContext, mut response: Response) -> Response {
    for write in ctx.take_cookie_writes() {
        match HeaderValue::from_str(&write.to_header()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("dropping unencodable cookie write: {}", e),
        }
    }
    response
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Tier routes

/// Public tier: ensure a session and hand back its id
pub async fn create_session(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response> {
    let mut ctx = request_context(&headers, HashMap::new());

    if !state.auth.public(&mut ctx).await? {
        let body = Json(ApiResponse::<()>::err("session unavailable"));
        return Ok(with_cookies(
            &mut ctx,
            (StatusCode::SERVICE_UNAVAILABLE, body).into_response(),
        ));
    }

    let body = Json(ApiResponse::ok(json!({ "session_id": ctx.session_id })));
    Ok(with_cookies(&mut ctx, (StatusCode::OK, body).into_response()))
}

/// Private tier from form credentials
pub async fn login(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response> {
    let mut ctx = request_context(&headers, params);

    if state.auth.private(&mut ctx).await? {
        let body = Json(ApiResponse::ok(user_body(&state, &ctx)));
        return Ok(with_cookies(&mut ctx, (StatusCode::OK, body).into_response()));
    }

    let message = ctx.login_error().unwrap_or("login required").to_string();
    let body = Json(ApiResponse::<()>::err(message));
    Ok(with_cookies(
        &mut ctx,
        (StatusCode::UNAUTHORIZED, body).into_response(),
    ))
}

/// Private tier from session continuity alone
pub async fn me(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response> {
    let mut ctx = request_context(&headers, HashMap::new());

    if state.auth.private(&mut ctx).await? {
        let body = Json(ApiResponse::ok(user_body(&state, &ctx)));
        return Ok(with_cookies(&mut ctx, (StatusCode::OK, body).into_response()));
    }

    let body = Json(ApiResponse::<()>::err("login required"));
    Ok(with_cookies(
        &mut ctx,
        (StatusCode::UNAUTHORIZED, body).into_response(),
    ))
}

/// Restricted tier: every request needs a ticket or fresh credentials
pub async fn restricted(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response> {
    let mut ctx = request_context(&headers, params);

    if state.auth.restricted(&mut ctx).await? {
        let body = Json(ApiResponse::ok(json!({
            "granted": true,
            "ticket": ctx.render_value("ticket"),
        })));
        return Ok(with_cookies(&mut ctx, (StatusCode::OK, body).into_response()));
    }

    let message = ctx.login_error().unwrap_or("ticket required").to_string();
    let body = Json(ApiResponse::<()>::err(message));
    Ok(with_cookies(
        &mut ctx,
        (StatusCode::UNAUTHORIZED, body).into_response(),
    ))
}

/// Tear down the session
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response> {
    let mut ctx = request_context(&headers, HashMap::new());

    // Bind the live session from the cookie before deleting it
    state.auth.public(&mut ctx).await?;
    state.auth.logout(&mut ctx).await?;

    let body = Json(ApiResponse::ok("logged out"));
    Ok(with_cookies(&mut ctx, (StatusCode::OK, body).into_response()))
}

fn user_body(state: &SharedState, ctx: &RequestContext) -> serde_json::Value {
    match &ctx.user {
        Some(user) => json!({
            "id": user.id,
            "user": user.field(&state.config.auth.user_field),
        }),
        None => json!(null),
    }
}
