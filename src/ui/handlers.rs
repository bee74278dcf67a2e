//! Web UI handlers
//!
//! A minimal HTML login flow over the private tier. The form re-renders with
//! the `login_error` render value on denial; success redirects to the JSON
//! profile endpoint.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use minijinja::{context, Environment};

use crate::api::routes::{request_context, with_cookies};
use crate::api::server::SharedState;
use crate::error::Result;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sign in - Gatehouse</title>
</head>
<body>
    <h1>Sign in</h1>
    {% if login_error %}<p style="color: #b00">{{ login_error }}</p>{% endif %}
    <form method="post" action="/login">
        <label>User <input type="text" name="{{ user_field }}" value="{{ user }}"></label>
        <label>Password <input type="password" name="{{ password_field }}"></label>
        <button type="submit">Sign in</button>
    </form>
</body>
</html>
"#;

fn render_login(
    state: &SharedState,
    login_error: Option<&str>,
    user: Option<&str>,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("login", LOGIN_PAGE)?;
    let html = env.get_template("login")?.render(context! {
        login_error => login_error,
        user => user.unwrap_or(""),
        user_field => state.config.auth.user_field,
        password_field => state.config.auth.password_field,
    })?;
    Ok(html)
}

/// Login form page
pub async fn login_form(State(state): State<SharedState>) -> Result<Html<String>> {
    Ok(Html(render_login(&state, None, None)?))
}

/// Login form submission - private tier
pub async fn login_submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response> {
    let mut ctx = request_context(&headers, params);

    if state.auth.private(&mut ctx).await? {
        return Ok(with_cookies(&mut ctx, Redirect::to("/api/me").into_response()));
    }

    let user = ctx
        .param(&state.config.auth.user_field)
        .map(str::to_owned);
    let html = render_login(&state, ctx.login_error(), user.as_deref())?;
    Ok(with_cookies(
        &mut ctx,
        (StatusCode::UNAUTHORIZED, Html(html)).into_response(),
    ))
}
