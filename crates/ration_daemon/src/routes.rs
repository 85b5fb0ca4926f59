use crate::error::ApiError;
use crate::state::{AppState, StoredRation};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use ration_control::{FixedShareFormulator, LineSource};
use ration_core::{
    AnimalId, GrowingParams, GrowingRow, LactationParams, LactationRequirements, RationEngine,
    RationLine, TableKind,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, "http://localhost:5173").expect("static origin parses")
}

pub fn make_router_with_cors(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin '{cors_origin}'"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/tables/:table/lookup", get(lookup_handler))
        .route(
            "/api/v1/requirements/lactation",
            post(lactation_requirements_handler),
        )
        .route(
            "/api/v1/requirements/growing",
            post(growing_requirements_handler),
        )
        .route("/api/v1/rations/lactation", post(lactation_ration_handler))
        .route("/api/v1/rations/growing", post(growing_ration_handler))
        .route("/api/v1/rations", get(rations_handler))
        .route("/api/v1/formulate", post(formulate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LookupQuery {
    pub key: Decimal,
    #[serde(default)]
    pub gain: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct LactationRationRequest {
    #[serde(default)]
    pub animal_id: Option<AnimalId>,
    #[serde(flatten)]
    pub params: LactationParams,
    #[serde(default)]
    pub lines: Vec<RationLine>,
}

#[derive(Deserialize)]
pub struct GrowingRationRequest {
    #[serde(default)]
    pub animal_id: Option<AnimalId>,
    #[serde(flatten)]
    pub params: GrowingParams,
    #[serde(default)]
    pub lines: Vec<RationLine>,
}

#[derive(Deserialize)]
pub struct FormulateRequest {
    #[serde(default)]
    pub total_kg: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let content = &app_state.content;
    let tables: serde_json::Map<String, serde_json::Value> = content
        .tables
        .row_counts()
        .iter()
        .map(|(kind, n)| (kind.to_string(), serde_json::json!(n)))
        .collect();
    Json(serde_json::json!({
        "content_version": content.content_version,
        "tables": tables,
        "ingredients": content.ingredients.len(),
        "constants": content.constants,
        "history_limit": app_state.history_limit,
    }))
}

pub async fn lookup_handler(
    State(app_state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let kind: TableKind = table.parse().map_err(ApiError::UnknownTable)?;
    let (row, resolution) = app_state.content.tables.lookup(kind, query.key, query.gain)?;
    Ok(Json(serde_json::json!({
        "row": row,
        "resolution": resolution,
    })))
}

pub async fn lactation_requirements_handler(
    State(app_state): State<AppState>,
    Json(params): Json<LactationParams>,
) -> Result<Json<LactationRequirements>, ApiError> {
    let content = &app_state.content;
    let engine = RationEngine::new(&content.tables, &content.ingredients, &content.constants);
    Ok(Json(engine.requirements().lactation(params)?))
}

pub async fn growing_requirements_handler(
    State(app_state): State<AppState>,
    Json(params): Json<GrowingParams>,
) -> Result<Json<GrowingRow>, ApiError> {
    let content = &app_state.content;
    let engine = RationEngine::new(&content.tables, &content.ingredients, &content.constants);
    Ok(Json(engine.requirements().growing(params)?))
}

pub async fn lactation_ration_handler(
    State(app_state): State<AppState>,
    Json(request): Json<LactationRationRequest>,
) -> Result<Json<StoredRation>, ApiError> {
    let content = &app_state.content;
    let engine = RationEngine::new(&content.tables, &content.ingredients, &content.constants);
    let record = engine.lactation_ration(request.animal_id, request.params, request.lines)?;
    Ok(Json(app_state.store(record)))
}

pub async fn growing_ration_handler(
    State(app_state): State<AppState>,
    Json(request): Json<GrowingRationRequest>,
) -> Result<Json<StoredRation>, ApiError> {
    let content = &app_state.content;
    let engine = RationEngine::new(&content.tables, &content.ingredients, &content.constants);
    let record = engine.growing_ration(request.animal_id, request.params, request.lines)?;
    Ok(Json(app_state.store(record)))
}

pub async fn formulate_handler(
    State(app_state): State<AppState>,
    Json(request): Json<FormulateRequest>,
) -> Json<serde_json::Value> {
    let content = &app_state.content;
    let total_kg = request
        .total_kg
        .unwrap_or(content.constants.default_ration_kg);
    let allocations = FixedShareFormulator::allocations(&content.ingredients, &content.constants);
    let lines = FixedShareFormulator.propose_lines(&content.ingredients, &content.constants, total_kg);
    Json(serde_json::json!({
        "total_kg": total_kg,
        "allocations": allocations,
        "lines": lines,
    }))
}

pub async fn rations_handler(State(app_state): State<AppState>) -> Json<Vec<StoredRation>> {
    Json(app_state.recent())
}
