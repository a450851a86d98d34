use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use super::{AppState, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use crate::{
    db::Session,
    error::{AppError, AppResult},
    utils::{generate_oauth_state, generate_session_id},
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Sends the browser to the Spotify consent page.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    let oauth_state = generate_oauth_state();
    let url = state.spotify.authorize_url(&oauth_state)?;
    Ok((jar.add(cookie(OAUTH_STATE_COOKIE, oauth_state)), Redirect::to(&url)))
}

/// Completes the authorization-code flow and opens a web session.
///
/// The `state` parameter must match the value stored by [`login`].
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        warn!("Authorization was denied: {}", error);
        return Err(AppError::InvalidInput(format!(
            "Spotify authorization failed: {}",
            error
        )));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            warn!("Rejected callback with a mismatching state");
            return Err(AppError::InvalidInput(
                "Login request could not be verified. Please log in again.".to_string(),
            ));
        }
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code.".to_string()))?;

    let token = state.spotify.exchange_code(&code).await?;
    let profile = state.spotify.api(&token.access_token).current_user().await?;
    state
        .db
        .upsert_user(&profile.id, profile.display_name.as_deref())?;

    let session = Session::new(generate_session_id(), profile.id.clone(), Some(token));
    state.db.create_session(&session)?;
    info!("User {} signed in", profile.id);

    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"))
        .add(cookie(SESSION_COOKIE, session.id));
    Ok((jar, Redirect::to("/")))
}

/// Ends the web session. Works without a valid token.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    if let Some(session) = jar.get(SESSION_COOKIE) {
        state.db.delete_session(session.value())?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")))
}
