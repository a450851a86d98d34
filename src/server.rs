use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    api::{self, AppState},
    error::{AppError, AppResult},
};

/// Builds the router with every route of the application.
pub fn make_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::views::index))
        .route("/health", get(api::health::health))
        .route("/login/", get(api::auth::login))
        .route("/callback/", get(api::auth::callback))
        .route("/logout/", get(api::auth::logout))
        .route("/me/", get(api::views::me))
        .route("/view_top_artists/", get(api::views::top_artists))
        .route("/view_top_artists/{time_range}/", get(api::views::top_artists))
        .route("/view_top_genres/", get(api::views::top_genres))
        .route("/view_top_genres/{time_range}/", get(api::views::top_genres))
        .route("/view_top_songs/", get(api::views::top_songs))
        .route("/view_top_songs/{time_range}/", get(api::views::top_songs))
        .route("/view_recent/", get(api::views::recent))
        .route("/view_user_averages/", get(api::views::user_averages))
        .route(
            "/add_all_songs_to_database/",
            get(api::playlists::add_all_songs),
        )
        .route(
            "/create_genre_playlist/",
            post(api::playlists::create_genre_playlist),
        )
        .route(
            "/create_recommendation_playlist/",
            post(api::playlists::create_recommendation_playlist),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `address` and serves until the process is stopped.
pub async fn start_api_server(state: AppState, address: &str) -> AppResult<()> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| AppError::Config(format!("invalid SERVER_ADDRESS '{}': {}", address, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, make_app(state)).await?;
    Ok(())
}
