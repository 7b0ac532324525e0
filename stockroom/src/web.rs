//! HTTP API for the inventory
//!
//! The signed-in user arrives from the auth layer in the
//! `x-stockroom-user` header. Each request signs a fresh `Repository` into
//! that scope, so no state is shared between users.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockroom_common::{InventoryItem, ItemDraft, RecordStore, Scope};
use tower_http::cors::CorsLayer;

use crate::csv_text::export_csv;
use crate::error::LedgerError;
use crate::query::{self, ItemValue, SortKey, SupplierTotal};
use crate::reconcile::ImportReport;
use crate::repository::{DecrementPolicy, Repository};

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-stockroom-user";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    policy: DecrementPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, policy: DecrementPolicy) -> Self {
        Self { store, policy }
    }
}

/// List query parameters
#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    sort: Option<String>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

#[derive(Serialize)]
struct Summary {
    suppliers: Vec<SupplierTotal>,
    values: Vec<ItemValue>,
    total_value: f64,
}

/// A failed request, rendered as the JSON envelope with a matching status
struct ApiFailure(LedgerError);

impl From<LedgerError> for ApiFailure {
    fn from(err: LedgerError) -> Self {
        ApiFailure(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::PartialImportFailure(_) | LedgerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let data = match &self.0 {
            LedgerError::PartialImportFailure(report) => serde_json::to_value(report).ok(),
            _ => None,
        };
        let body = ApiResponse {
            success: false,
            data,
            error: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiFailure>;

/// Signs a repository into the scope named by the request headers
async fn session(state: &AppState, headers: &HeaderMap) -> Result<Repository, ApiFailure> {
    let scope = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Scope::new)
        .ok_or_else(|| {
            log::warn!("Request without {} header rejected", USER_HEADER);
            LedgerError::Unauthenticated
        })?;

    let mut repo = Repository::new(Arc::clone(&state.store)).with_policy(state.policy);
    repo.sign_in(scope).await?;
    Ok(repo)
}

/// GET /api/items?q={term}&sort={key}
async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<InventoryItem>> {
    let repo = session(&state, &headers).await?;
    let key = params
        .sort
        .as_deref()
        .map(SortKey::parse)
        .unwrap_or_default();
    Ok(ok(query::view(repo.items(), &params.q, key)))
}

/// POST /api/items
async fn add_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<ItemDraft>,
) -> ApiResult<Vec<InventoryItem>> {
    let mut repo = session(&state, &headers).await?;
    Ok(ok(repo.add(&draft).await?.to_vec()))
}

/// PUT /api/items/{name}
async fn edit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(draft): Json<ItemDraft>,
) -> ApiResult<Vec<InventoryItem>> {
    let mut repo = session(&state, &headers).await?;
    Ok(ok(repo.edit(&name, &draft).await?.to_vec()))
}

/// DELETE /api/items/{name}
async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Vec<InventoryItem>> {
    let mut repo = session(&state, &headers).await?;
    Ok(ok(repo.delete(&name).await?.to_vec()))
}

/// POST /api/items/{name}/increment
async fn increment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Vec<InventoryItem>> {
    let mut repo = session(&state, &headers).await?;
    let item = repo
        .get(&name)
        .cloned()
        .ok_or_else(|| LedgerError::NotFound(name.clone()))?;
    Ok(ok(repo.increment(&item).await?.to_vec()))
}

/// POST /api/items/{name}/decrement
async fn decrement_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult<Vec<InventoryItem>> {
    let mut repo = session(&state, &headers).await?;
    Ok(ok(repo.decrement(&name).await?.to_vec()))
}

/// GET /api/export
async fn export_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiFailure> {
    let repo = session(&state, &headers).await?;
    let csv = export_csv(repo.items()).map_err(LedgerError::Io)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// POST /api/import (raw CSV body)
async fn import_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<ImportReport> {
    let mut repo = session(&state, &headers).await?;
    Ok(ok(repo.import_csv(&body).await?))
}

/// GET /api/summary
async fn summary_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Summary> {
    let repo = session(&state, &headers).await?;
    let items = repo.items();
    Ok(ok(Summary {
        suppliers: query::quantity_by_supplier(items),
        values: query::value_by_item(items),
        total_value: query::total_value(items),
    }))
}

/// Build the web server router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/items", get(list_handler).post(add_handler))
        .route("/api/items/{name}", put(edit_handler).delete(delete_handler))
        .route("/api/items/{name}/increment", post(increment_handler))
        .route("/api/items/{name}/decrement", post(decrement_handler))
        .route("/api/export", get(export_handler))
        .route("/api/import", post(import_handler))
        .route("/api/summary", get(summary_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Inventory API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
