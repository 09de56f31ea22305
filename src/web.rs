//! Snapshot sync endpoint.
//!
//! A minimal HTTP service over the snapshot document: `GET /` returns the
//! stored snapshot, `POST /` replaces it. No auth, no versioning - the
//! endpoint is a shuttle for one JSON file, not an API over the live
//! registries.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;

use crate::snapshot::{self, Snapshot};

/// Shared application state (path of the stored snapshot document)
#[derive(Clone)]
struct AppState {
    snapshot_path: Arc<PathBuf>,
}

/// GET / - return the stored snapshot document
async fn get_snapshot(State(state): State<AppState>) -> Result<Json<Snapshot>, StatusCode> {
    if !state.snapshot_path.exists() {
        return Err(StatusCode::NOT_FOUND);
    }
    match snapshot::read_snapshot(&state.snapshot_path) {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            log::error!("Failed to read snapshot: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST / - overwrite the stored snapshot document
async fn post_snapshot(
    State(state): State<AppState>,
    Json(body): Json<Snapshot>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match snapshot::write_snapshot(&body, &state.snapshot_path) {
        Ok(()) => Ok(Json(
            serde_json::json!({"message": "Data uploaded successfully"}),
        )),
        Err(e) => {
            log::error!("Failed to store snapshot: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Build the sync endpoint router
pub fn create_router(snapshot_path: PathBuf) -> Router {
    let state = AppState {
        snapshot_path: Arc::new(snapshot_path),
    };

    Router::new()
        .route("/", get(get_snapshot).post(post_snapshot))
        .with_state(state)
}

/// Start the sync endpoint (async)
///
/// Binds to 0.0.0.0 so the endpoint works behind Docker port mapping; use
/// firewall rules or port mapping to restrict external exposure.
pub async fn serve(snapshot_path: PathBuf, port: u16) -> crate::error::Result<()> {
    let app = create_router(snapshot_path);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Snapshot sync endpoint listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_router() {
        let temp_dir = TempDir::new().unwrap();
        let _router = create_router(temp_dir.path().join("materials-data.json"));
        // If we got here without panicking, the router was created successfully
    }

    #[test]
    fn test_app_state_clone() {
        let temp_dir = TempDir::new().unwrap();
        let state = AppState {
            snapshot_path: Arc::new(temp_dir.path().join("materials-data.json")),
        };
        let _state2 = state.clone();
    }
}
