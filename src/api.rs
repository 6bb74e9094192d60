//! REST API for the capacity estimation service.
//!
//! Thin transport layer over the estimation core: request schema
//! validation, container class lookup, JSON encoding and CORS. Uses Axum
//! as the web framework.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::allocator::{
    AllocationConfig, AllocationResult, AllocationStrategy, BindingConstraint, pack,
};
use crate::config::ApiConfig;
use crate::model::{Container, ContainerCatalog, ItemType, PackingError, ValidationError};
use crate::orientation::AxisCounts;
use crate::precheck::validate;
use crate::types::{Dimensional, Dims};

const SERVICE_NAME: &str = "container-fit";

#[derive(Clone)]
struct ApiState {
    catalog: Arc<ContainerCatalog>,
    allocation: AllocationConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// One item type of a packing or validation request.
#[derive(Deserialize, Clone, ToSchema)]
pub struct PackingItem {
    pub item_id: u64,
    pub name: String,
    #[schema(minimum = 1, maximum = 1_000_000_000)]
    pub quantity: u64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub depth_cm: f64,
    pub weight_kg: f64,
}

impl PackingItem {
    fn into_item_type(self) -> Result<ItemType, ApiError> {
        let item_id = self.item_id;
        ItemType::new(
            self.item_id,
            self.name,
            self.quantity,
            Dims::new(self.width_cm, self.height_cm, self.depth_cm),
            self.weight_kg,
        )
        .map_err(|source| ApiError::InvalidItem { item_id, source })
    }
}

/// Request body shared by `/pack` and `/validate`.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "container_type": "20ft",
        "items": [
            {
                "item_id": 1,
                "name": "Pallet box",
                "quantity": 100,
                "width_cm": 100.0,
                "height_cm": 100.0,
                "depth_cm": 100.0,
                "weight_kg": 50.0
            }
        ],
        "strategy": "input_order"
    })
)]
pub struct PackRequest {
    pub container_type: String,
    pub items: Vec<PackingItem>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<AllocationStrategy>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    container: Container,
    items: Vec<ItemType>,
    strategy: Option<AllocationStrategy>,
}

impl PackRequest {
    fn into_validated(self, catalog: &ContainerCatalog) -> Result<ValidatedPackRequest, ApiError> {
        let container = catalog.resolve(&self.container_type)?.clone();
        if self.items.is_empty() {
            return Err(PackingError::EmptyItemList.into());
        }

        let items = self
            .items
            .into_iter()
            .map(PackingItem::into_item_type)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedPackRequest {
            container,
            items,
            strategy: self.strategy,
        })
    }
}

/// Failures of a request, mapped to a status code and an `ErrorResponse`.
#[derive(Debug, Error)]
enum ApiError {
    #[error("Invalid JSON data: {0}")]
    Json(#[from] JsonRejection),
    #[error("Item {item_id}: {source}")]
    InvalidItem {
        item_id: u64,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Packing(#[from] PackingError),
}

impl ApiError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Json(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid JSON data"),
            ApiError::InvalidItem { .. }
            | ApiError::Packing(PackingError::DegenerateItem { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Invalid input data")
            }
            ApiError::Packing(PackingError::UnknownContainerClass(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid container type")
            }
            ApiError::Packing(PackingError::EmptyItemList) => {
                (StatusCode::BAD_REQUEST, "No items provided")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();
        warn!("Rejected request ({}): {}", status.as_u16(), self);
        (status, Json(ErrorResponse::new(title, self.to_string()))).into_response()
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    catalog: &ContainerCatalog,
) -> Result<ValidatedPackRequest, ApiError> {
    let Json(payload) = payload?;
    payload.into_validated(catalog)
}

/// Internal dimensions of the selected container.
#[derive(Serialize, ToSchema)]
pub struct ContainerDimensions {
    pub width_cm: f64,
    pub height_cm: f64,
    pub depth_cm: f64,
    pub cbm: f64,
    pub max_weight_kg: f64,
}

impl ContainerDimensions {
    fn from_container(container: &Container) -> Self {
        Self {
            width_cm: container.dims.width,
            height_cm: container.dims.height,
            depth_cm: container.dims.depth,
            cbm: round_to(container.cbm(), 2),
            max_weight_kg: container.max_weight,
        }
    }
}

/// Allocation outcome of one item type.
#[derive(Serialize, ToSchema)]
pub struct PackedItemType {
    pub item_id: u64,
    pub name: String,
    pub requested: u64,
    pub fitted: u64,
    pub unfitted: u64,
    pub orientation: String,
    pub per_axis: AxisCounts,
    pub items_per_layer: u64,
    pub layers: u64,
    pub volume_max: u64,
    pub weight_max: u64,
    pub constraint: BindingConstraint,
    pub reason: Option<String>,
    pub used_cbm: f64,
    pub used_weight_kg: f64,
}

impl From<AllocationResult> for PackedItemType {
    fn from(result: AllocationResult) -> Self {
        let reason = (result.unfitted > 0).then(|| result.constraint.to_string());
        Self {
            item_id: result.item_id,
            orientation: result.orientation.label().to_string(),
            per_axis: result.orientation.counts,
            items_per_layer: result.orientation.items_per_layer,
            layers: result.orientation.layers,
            name: result.name,
            requested: result.requested,
            fitted: result.fitted,
            unfitted: result.unfitted,
            volume_max: result.volume_max,
            weight_max: result.weight_max,
            constraint: result.constraint,
            reason,
            used_cbm: round_to(result.volume_used / crate::types::CM3_PER_M3, 2),
            used_weight_kg: round_to(result.weight_used, 2),
        }
    }
}

/// Container-wide utilization, rounded for display.
#[derive(Serialize, ToSchema)]
pub struct UtilizationResponse {
    pub volume_percent: f64,
    pub weight_percent: f64,
    pub container_cbm: f64,
    pub used_cbm: f64,
    pub container_weight_kg: f64,
    pub used_weight_kg: f64,
}

/// Response of `/pack`.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub success: bool,
    pub container_type: String,
    pub container_dimensions: ContainerDimensions,
    pub strategy: AllocationStrategy,
    pub total_items_requested: u64,
    pub fitted_count: u64,
    pub unfitted_count: u64,
    pub items: Vec<PackedItemType>,
    pub utilization: UtilizationResponse,
    pub remaining_weight_kg: f64,
    pub warnings: Vec<String>,
}

/// Item type that fits in no orientation.
#[derive(Serialize, ToSchema)]
pub struct OversizedItemResponse {
    pub item_id: u64,
    pub name: String,
    pub dimensions: String,
}

/// Response of `/validate`.
#[derive(Serialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    pub total_cbm: f64,
    pub container_cbm: f64,
    pub cbm_utilization_percent: f64,
    pub total_weight_kg: f64,
    pub max_weight_kg: f64,
    pub weight_utilization_percent: f64,
    pub oversized_items: Vec<OversizedItemResponse>,
    pub warnings: Vec<String>,
}

/// One entry of the container catalog.
#[derive(Serialize, ToSchema)]
pub struct ContainerClassResponse {
    pub name: String,
    pub dimensions: ContainerDimensions,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_health, handle_containers, handle_pack, handle_validate),
    components(
        schemas(
            PackRequest,
            PackingItem,
            PackResponse,
            PackedItemType,
            ContainerDimensions,
            UtilizationResponse,
            ValidateResponse,
            OversizedItemResponse,
            ContainerClassResponse,
            HealthResponse,
            ErrorResponse,
            AllocationStrategy,
            BindingConstraint,
            AxisCounts
        )
    ),
    tags((name = "packing", description = "Container capacity estimation"))
)]
struct ApiDoc;

fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/containers", get(handle_containers))
        .route("/pack", post(handle_pack))
        .route("/validate", post(handle_validate))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from any frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    catalog: ContainerCatalog,
    allocation: AllocationConfig,
) -> std::io::Result<()> {
    let state = ApiState {
        catalog: Arc::new(catalog),
        allocation,
    };
    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: /health, /containers, /pack, /validate, /docs/openapi.json");

    axum::serve(listener, app).await
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "packing"
)]
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/containers",
    responses(
        (status = 200, description = "Known container classes", body = [ContainerClassResponse])
    ),
    tag = "packing"
)]
async fn handle_containers(State(state): State<ApiState>) -> Json<Vec<ContainerClassResponse>> {
    let classes = state
        .catalog
        .iter()
        .map(|(name, container)| ContainerClassResponse {
            name: name.to_string(),
            dimensions: ContainerDimensions::from_container(container),
        })
        .collect();
    Json(classes)
}

/// Handler for POST /pack.
///
/// Estimates how many units of each item type fit into the requested
/// container class.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Capacity estimate", body = PackResponse),
        (status = BAD_REQUEST, description = "Unknown class or no items", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request data", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<Json<PackResponse>, ApiError> {
    let request = parse_pack_request(payload, &state.catalog)?;

    let mut allocation = state.allocation;
    if let Some(strategy) = request.strategy {
        allocation.strategy = strategy;
    }

    info!(
        "New pack request: {} item types, container {}",
        request.items.len(),
        request.container.class.as_deref().unwrap_or("custom")
    );
    let report = pack(&request.container, &request.items, &allocation)?;
    info!(
        "Result: {} of {} units fitted, {:.1}% volume, {:.1}% weight",
        report.total_fitted,
        report.total_requested,
        report.utilization.volume_percent,
        report.utilization.weight_percent
    );

    let utilization = UtilizationResponse {
        volume_percent: round_to(report.utilization.volume_percent, 1),
        weight_percent: round_to(report.utilization.weight_percent, 1),
        container_cbm: round_to(report.utilization.container_cbm, 2),
        used_cbm: round_to(report.utilization.used_cbm, 2),
        container_weight_kg: report.utilization.container_weight,
        used_weight_kg: round_to(report.utilization.used_weight, 2),
    };

    Ok(Json(PackResponse {
        success: report.is_complete(),
        container_type: report.container.class.clone().unwrap_or_default(),
        container_dimensions: ContainerDimensions::from_container(&report.container),
        strategy: report.strategy,
        total_items_requested: report.total_requested,
        fitted_count: report.total_fitted,
        unfitted_count: report.total_unfitted,
        items: report.items.into_iter().map(PackedItemType::from).collect(),
        utilization,
        remaining_weight_kg: round_to(report.remaining_weight, 2),
        warnings: report.warnings,
    }))
}

/// Handler for POST /validate.
///
/// Quick check whether an order can potentially fit, without allocation.
#[utoipa::path(
    post,
    path = "/validate",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Feasibility check", body = ValidateResponse),
        (status = BAD_REQUEST, description = "Unknown class or no items", body = ErrorResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request data", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_validate(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let request = parse_pack_request(payload, &state.catalog)?;
    let report = validate(&request.container, &request.items)?;

    Ok(Json(ValidateResponse {
        valid: report.valid,
        total_cbm: round_to(report.total_cbm, 2),
        container_cbm: round_to(report.container_cbm, 2),
        cbm_utilization_percent: round_to(report.volume_percent, 1),
        total_weight_kg: round_to(report.total_weight, 2),
        max_weight_kg: report.max_weight,
        weight_utilization_percent: round_to(report.weight_percent, 1),
        oversized_items: report
            .oversized_items
            .into_iter()
            .map(|item| OversizedItemResponse {
                item_id: item.item_id,
                name: item.name,
                dimensions: format!("{} cm", item.dims),
            })
            .collect(),
        warnings: report.warnings,
    }))
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_router() -> Router {
        build_router(ApiState {
            catalog: Arc::new(ContainerCatalog::standard()),
            allocation: AllocationConfig::default(),
        })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn cube_request(container_type: &str, quantity: u64) -> Value {
        json!({
            "container_type": container_type,
            "items": [{
                "item_id": 1,
                "name": "Cube",
                "quantity": quantity,
                "width_cm": 100.0,
                "height_cm": 100.0,
                "depth_cm": 100.0,
                "weight_kg": 50.0
            }]
        })
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/health", "/containers", "/pack", "/validate"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["PackRequest", "PackResponse", "ValidateResponse", "ErrorResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn pack_request_parses_optional_strategy() {
        let request: PackRequest = serde_json::from_value(cube_request("20ft", 1)).unwrap();
        assert_eq!(request.strategy, None);

        let mut body = cube_request("20ft", 1);
        body["strategy"] = json!("largest_first");
        let request: PackRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.strategy, Some(AllocationStrategy::LargestFirst));

        let mut body = cube_request("20ft", 1);
        body["strategy"] = json!("INPUT_ORDER");
        let request: PackRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.strategy, Some(AllocationStrategy::InputOrder));

        let mut body = cube_request("20ft", 1);
        body["strategy"] = json!("densest");
        assert!(serde_json::from_value::<PackRequest>(body).is_err());
    }

    #[tokio::test]
    async fn pack_endpoint_reports_cube_scenario() {
        let (status, body) = post_json("/pack", cube_request("20ft", 100)).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(body["success"], json!(false));
        assert_eq!(body["container_type"], json!("20ft"));
        assert_eq!(body["container_dimensions"]["cbm"], json!(32.8));
        assert_eq!(body["total_items_requested"], json!(100));
        assert_eq!(body["fitted_count"], json!(20));
        assert_eq!(body["unfitted_count"], json!(80));
        assert_eq!(body["strategy"], json!("input_order"));

        let item = &body["items"][0];
        assert_eq!(item["orientation"], json!("WHD"));
        assert_eq!(item["per_axis"], json!({"x": 5, "y": 2, "z": 2}));
        assert_eq!(item["items_per_layer"], json!(10));
        assert_eq!(item["layers"], json!(2));
        assert_eq!(item["constraint"], json!("space_limited"));
        assert_eq!(item["reason"], json!("Could not fit in remaining space"));

        assert_eq!(body["utilization"]["used_cbm"], json!(20.0));
        assert_eq!(body["utilization"]["volume_percent"], json!(61.0));
        assert_eq!(body["utilization"]["weight_percent"], json!(3.9));
        assert_eq!(
            body["warnings"],
            json!(["80 items could not fit in the container"])
        );
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_unknown_container_type() {
        let (status, body) = post_json("/pack", cube_request("45ft", 1)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid container type"));
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_empty_item_list() {
        let (status, body) =
            post_json("/pack", json!({"container_type": "40ft", "items": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("No items provided"));
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_invalid_items() {
        let (status, body) = post_json("/pack", cube_request("20ft", 0)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("Invalid input data"));

        let mut request = cube_request("20ft", 1);
        request["items"][0]["width_cm"] = json!(0.0);
        let (status, _) = post_json("/pack", request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let mut request = cube_request("20ft", u64::MAX);
        request["items"]
            .as_array_mut()
            .unwrap()
            .push(cube_request("20ft", 2)["items"][0].clone());
        let (status, body) = post_json("/pack", request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("Invalid input data"));

        let (status, body) = post_json("/pack", json!({"container_type": "20ft"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("Invalid JSON data"));
    }

    #[tokio::test]
    async fn validate_endpoint_reports_oversized_items() {
        let request = json!({
            "container_type": "20ft",
            "items": [{
                "item_id": 7,
                "name": "Boiler",
                "quantity": 1,
                "width_cm": 300.0,
                "height_cm": 300.0,
                "depth_cm": 600.0,
                "weight_kg": 900.0
            }]
        });
        let (status, body) = post_json("/validate", request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], json!(false));
        assert_eq!(body["container_cbm"], json!(32.8));
        assert_eq!(body["total_cbm"], json!(54.0));
        assert_eq!(body["oversized_items"][0]["item_id"], json!(7));
        assert_eq!(
            body["oversized_items"][0]["dimensions"],
            json!("300 x 300 x 600 cm")
        );
    }

    #[tokio::test]
    async fn health_and_containers_endpoints() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy", "service": "container-fit"}));

        let (status, body) = get_json("/containers").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["20ft", "40ft"]);
    }
}
