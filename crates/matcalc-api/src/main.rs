use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use matcalc_core::{Catalog, Estimate, EstimateRequest, Estimator, EstimatorError};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting floor mat estimate API");

    let catalog = match std::env::var("MATCALC_CATALOG") {
        Ok(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read catalog {path}"))?;
            info!("Using price catalog from {}", path);
            Catalog::from_json_str(&content)
                .with_context(|| format!("invalid catalog {path}"))?
        }
        Err(_) => Catalog::builtin(),
    };

    let app = app(AppState {
        catalog: Arc::new(catalog),
    });

    let addr = std::env::var("MATCALC_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/catalog", get(catalog))
        .route("/api/estimate", post(estimate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "matcalc-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Product lines, thicknesses and prices the estimator works with
async fn catalog(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

/// Main estimation endpoint
async fn estimate(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<Estimate>, AppError> {
    info!(
        "Received estimate request for {} {} with {} spaces",
        request.product,
        request.thickness,
        request.spaces.len()
    );

    let requested = request.spaces.len();
    let estimator = Estimator::new(request, &state.catalog)?;
    let estimate = estimator.estimate();

    info!("Estimate complete: {}", completion_summary(requested, &estimate));

    Ok(Json(estimate))
}

/// Log line for a finished estimate. Unpriced spaces are missing from `estimate`,
/// so the requested count is passed in.
fn completion_summary(requested: usize, estimate: &Estimate) -> String {
    format!(
        "{} of {} spaces priced, total {}",
        estimate.summary.active_spaces, requested, estimate.summary.total_price
    )
}

/// Application error type
enum AppError {
    Estimator(EstimatorError),
}

impl From<EstimatorError> for AppError {
    fn from(err: EstimatorError) -> Self {
        AppError::Estimator(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Estimator(err) => {
                let status = match err {
                    EstimatorError::UnknownProduct(_)
                    | EstimatorError::UnknownThickness { .. }
                    | EstimatorError::UnsupportedProduct { .. }
                    | EstimatorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
        };

        error!("Request error: {}", message);

        (
            status,
            Json(json!({
                "error": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState {
            catalog: Arc::new(Catalog::builtin()),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_estimate(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/estimate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_catalog_lists_products() {
        let response = test_app()
            .oneshot(Request::get("/api/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["products"]["puzzle"]["tile_prices"]["25"], 17_900);
    }

    #[tokio::test]
    async fn test_estimate() {
        let response = test_app()
            .oneshot(post_estimate(json!({
                "product": "puzzle",
                "thickness": "25",
                "spaces": [{
                    "name": "kids room",
                    "width": 300,
                    "height": 200,
                    "product_type": "tile-square-50",
                    "calc_mode": "exact"
                }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["summary"]["total_price"], 6 * 17_900);
        assert_eq!(body["summary"]["packs_50"], 6);
    }

    #[test]
    fn test_completion_summary_counts_requested_spaces() {
        let request: EstimateRequest = serde_json::from_value(json!({
            "product": "puzzle",
            "thickness": "25",
            "spaces": [
                {"width": 300, "height": 200, "product_type": "tile-square-50", "calc_mode": "exact"},
                {"width": 0, "height": 200, "product_type": "tile-square-50"}
            ]
        }))
        .unwrap();
        let requested = request.spaces.len();
        let estimate = Estimator::new(request, &Catalog::builtin())
            .unwrap()
            .estimate();

        assert_eq!(estimate.spaces.len(), 1);
        assert_eq!(
            completion_summary(requested, &estimate),
            format!("1 of 2 spaces priced, total {}", 6 * 17_900)
        );
    }

    #[tokio::test]
    async fn test_unknown_product_is_bad_request() {
        let response = test_app()
            .oneshot(post_estimate(json!({
                "product": "carpet",
                "thickness": "25",
                "spaces": [{"width": 100, "height": 100, "product_type": "hybrid-tile"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unknown product 'carpet'");
    }
}
