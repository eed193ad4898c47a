//! HTTP server implementation using axum.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use qsync_core::{process_batch, PortfolioTable, TemplateFile};
use qsync_telemetry::Metrics;

use crate::auth::require_basic_auth;
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::state::RunStore;
use crate::types::{ErrorBody, HealthResponse, RunResponse};

/// Multipart field carrying the portfolio CSV.
pub const PORTFOLIO_FIELD: &str = "portfolio";
/// Multipart field carrying order templates (repeatable).
pub const TEMPLATES_FIELD: &str = "templates";

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub(crate) runs: RunStore,
    pub(crate) config: DashboardConfig,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            runs: RunStore::new(config.max_stored_runs),
            config,
        }
    }
}

/// Create the axum router.
///
/// Everything except `/health` sits behind basic auth when it is configured.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(serve_index))
        .route("/metrics", get(get_metrics))
        .route("/api/sync", post(sync_upload))
        .route("/api/runs/{run_id}", get(get_run))
        .route("/api/runs/{run_id}/files/{file_name}", get(download_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the upload page.
async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_metrics() -> Response {
    match Metrics::encode_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::message(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Accept one portfolio CSV and one or more order templates, run the batch and
/// keep the generated files for download.
async fn sync_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RunResponse>, DashboardError> {
    let mut portfolio: Option<Vec<u8>> = None;
    let mut templates = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();

        match field_name.as_str() {
            PORTFOLIO_FIELD => portfolio = Some(field.bytes().await?.to_vec()),
            TEMPLATES_FIELD => {
                let data = field.bytes().await?;
                // Browsers submit an empty part when no file was picked.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                let name = if file_name.is_empty() {
                    format!("template_{}.json", templates.len() + 1)
                } else {
                    file_name
                };
                templates.push(TemplateFile::new(name, data.to_vec()));
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let portfolio = portfolio
        .filter(|p| !p.is_empty())
        .ok_or(DashboardError::MissingField(PORTFOLIO_FIELD))?;
    if templates.is_empty() {
        return Err(DashboardError::MissingField(TEMPLATES_FIELD));
    }

    let table = PortfolioTable::from_reader(portfolio.as_slice())?;
    let report = process_batch(&table, &templates)?;
    let response = state.runs.insert(report);

    info!(
        run_id = %response.run_id,
        files = response.files.len(),
        updated = response.total_updated,
        "Sync run stored"
    );
    Ok(Json(response))
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<RunResponse>, DashboardError> {
    state
        .runs
        .get(&run_id)
        .map(Json)
        .ok_or_else(|| DashboardError::NotFound(format!("run {run_id}")))
}

async fn download_file(
    State(state): State<AppState>,
    Path((run_id, file_name)): Path<(Uuid, String)>,
) -> Result<Response, DashboardError> {
    let file = state
        .runs
        .file(&run_id, &file_name)
        .ok_or_else(|| DashboardError::NotFound(format!("{file_name} in run {run_id}")))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.name.replace(['"', '\r', '\n'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.contents,
    )
        .into_response())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the dashboard HTTP server until Ctrl-C.
pub async fn run_server(
    config: DashboardConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.bind_addr();
    let app = create_router(AppState::new(config.clone()));

    info!(
        addr = %addr,
        auth = config.auth_enabled(),
        max_upload_bytes = config.max_upload_bytes,
        "Starting dashboard server"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Dashboard server stopped");
    Ok(())
}
