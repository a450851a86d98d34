use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use super::open_database;
use crate::{api::AppState, error, info, server::start_api_server, spotify::Spotify, warning};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed, e.g. by tests.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs the web server until the process is stopped.
pub async fn serve(open: bool) {
    init_tracing();
    let (config, db) = open_database();

    let spotify = match Spotify::new(&config) {
        Ok(spotify) => Arc::new(spotify),
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    };

    let address = config.server_address.clone();
    let login_url = format!("http://{}/login/", address);
    let state = AppState::new(config, db, spotify);

    info!("Serving tastemaker on http://{}", address);
    if open && webbrowser::open(&login_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            login_url
        );
    }

    if let Err(e) = start_api_server(state, &address).await {
        error!("Server stopped. Err: {}", e);
    }
}
