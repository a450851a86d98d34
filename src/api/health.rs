use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::{db::Database, error::AppResult};

pub async fn health(State(db): State<Arc<Database>>) -> AppResult<Json<Value>> {
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "songs": db.count_songs()?,
    })))
}
