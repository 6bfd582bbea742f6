/// Storage REST API endpoints
///
/// Exposes the storage operations to a host process over HTTP:
/// - GET/PUT /flows, /credentials, /settings, /sessions
/// - GET /library/{type} and /library/{type}/{*path}
/// - PUT /library/{type}/{*path} with `{ "meta": ..., "body": ... }`

use crate::{errors::StorageError, library::LibraryValue, storage::FlowStorage, store::Resource};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Initialized storage for one namespace
    pub storage: Arc<FlowStorage>,
}

/// Request body for library writes
#[derive(Debug, Deserialize)]
pub struct SaveEntryRequest {
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub body: Value,
}

/// Storage failure rendered as an HTTP response
pub struct ApiError(StorageError);

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_conflict() {
            StatusCode::CONFLICT
        } else if matches!(self.0, StorageError::InvalidType(_)) {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        tracing::error!("❌ {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// URL segment for a singleton resource
fn route_name(resource: Resource) -> &'static str {
    match resource {
        Resource::Flows => "flows",
        Resource::Credentials => "credentials",
        Resource::Settings => "settings",
        Resource::Sessions => "sessions",
    }
}

/// Create storage routes
pub fn create_storage_routes() -> Router<AppState> {
    let mut router = Router::new();

    for resource in Resource::ALL {
        router = router.route(
            &format!("/{}", route_name(resource)),
            get(move |State(state): State<AppState>| read_resource(state, resource)).put(
                move |State(state): State<AppState>, Json(payload): Json<Value>| {
                    write_resource(state, resource, payload)
                },
            ),
        );
    }

    router
        .route("/library/{lib_type}", get(get_library_root))
        .route("/library/{lib_type}/{*path}", get(get_library_entry).put(save_library_entry))
}

async fn read_resource(state: AppState, resource: Resource) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.storage.singletons().get(resource).await?))
}

async fn write_resource(state: AppState, resource: Resource, payload: Value) -> Result<StatusCode, ApiError> {
    state.storage.singletons().put(resource, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /library/{type}
async fn get_library_root(
    State(state): State<AppState>,
    Path(lib_type): Path<String>,
) -> Result<Json<LibraryValue>, ApiError> {
    Ok(Json(state.storage.get_library_entry(&lib_type, "").await?))
}

/// GET /library/{type}/{*path}
async fn get_library_entry(
    State(state): State<AppState>,
    Path((lib_type, path)): Path<(String, String)>,
) -> Result<Json<LibraryValue>, ApiError> {
    Ok(Json(state.storage.get_library_entry(&lib_type, &path).await?))
}

/// PUT /library/{type}/{*path}
async fn save_library_entry(
    State(state): State<AppState>,
    Path((lib_type, path)): Path<(String, String)>,
    Json(payload): Json<SaveEntryRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .storage
        .save_library_entry(&lib_type, &path, payload.meta, payload.body)
        .await?;
    tracing::info!("📚 Saved library entry {}:{}", lib_type, path);
    Ok(StatusCode::NO_CONTENT)
}
