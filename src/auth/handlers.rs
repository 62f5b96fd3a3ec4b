use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;

use crate::auth::accounts::{self, Credentials, Registration};
use crate::auth::gate::{clear_session_cookie, session_cookie};
use crate::error::AppResult;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate;

fn redirect_with_cookie(location: &str, cookie: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "",
    )
        .into_response()
}

/// GET /login: render login page
pub async fn login_page() -> Html<LoginTemplate> {
    Html(LoginTemplate)
}

/// POST /register: create the account, set the session cookie, go to profile
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<Registration>,
) -> AppResult<Response> {
    let (_user, token) = accounts::register(&state, form).await?;
    Ok(redirect_with_cookie(
        "/profile",
        session_cookie(&state.config.auth.cookie_name, &token, state.tokens.ttl()),
    ))
}

/// POST /login: on success set the session cookie; any failure lands back on /login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<Credentials>,
) -> AppResult<Response> {
    let token = accounts::login(&state, form).await?;
    Ok(redirect_with_cookie(
        "/profile",
        session_cookie(&state.config.auth.cookie_name, &token, state.tokens.ttl()),
    ))
}

/// GET /logout: blank the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    redirect_with_cookie(
        "/login",
        clear_session_cookie(&state.config.auth.cookie_name),
    )
}
