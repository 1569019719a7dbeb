// Student Registry - Web Server
// REST API over the registration workflow with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use student_registry::{
    catalog, logging, AppConfig, Catalog, CatalogError, Changes, Record, Registrar, Session,
    StoreContents, Submission, WorkflowError,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Workflow plus the session of whoever registers through this server
struct Registry {
    registrar: Registrar,
    session: Session,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: Arc<Mutex<Registry>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    fn fail(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            errors,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    Workflow(WorkflowError),
    Catalog(CatalogError),
    Internal(String),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Workflow(err) => {
                let status = match &err {
                    WorkflowError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    WorkflowError::NotFound(_) | WorkflowError::NoRecords => StatusCode::NOT_FOUND,
                    WorkflowError::Storage(e) => {
                        error!(error = %e, "storage failure");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.messages())
            }
            ApiError::Catalog(err) => (StatusCode::FORBIDDEN, vec![err.to_string()]),
            ApiError::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, vec![message])
            }
        };

        (status, Json(ApiResponse::<()>::fail(errors))).into_response()
    }
}

/// Run a workflow call on the blocking pool, one at a time
async fn with_registry<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Registry) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);

    tokio::task::spawn_blocking(move || {
        let mut guard = registry
            .lock()
            .map_err(|_| ApiError::Internal("registry lock poisoned".to_string()))?;
        f(&mut guard)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("worker task failed: {}", e)))?
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/students - Every stored registration (empty when no file yet)
async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Record>>>, ApiError> {
    let records = with_registry(&state, |registry| {
        Ok(registry
            .registrar
            .list()
            .map(StoreContents::into_records)?)
    })
    .await?;

    Ok(Json(ApiResponse::ok(records)))
}

/// POST /api/students - Register a student
async fn create_student(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<(StatusCode, Json<ApiResponse<Record>>), ApiError> {
    let record = with_registry(&state, move |registry| {
        let Registry { registrar, session } = registry;
        Ok(registrar.create(session, &submission)?)
    })
    .await?;

    info!(identifier = %record.identifier, "student registered over HTTP");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// GET /api/students/:id
async fn get_student(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    let record = with_registry(&state, move |registry| {
        Ok(registry.registrar.find(&identifier)?)
    })
    .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// PUT /api/students/:id - Edit email, address fields and birth date
async fn update_student(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(changes): Json<Changes>,
) -> Result<Json<ApiResponse<Record>>, ApiError> {
    let record = with_registry(&state, move |registry| {
        Ok(registry.registrar.update(&identifier, &changes)?)
    })
    .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// DELETE /api/students/:id
async fn delete_student(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let deleted = with_registry(&state, move |registry| {
        registry.registrar.delete(&identifier)?;
        Ok(identifier)
    })
    .await?;

    Ok(Json(ApiResponse::ok(deleted)))
}

/// GET /api/courses - Catalog, once a registration went through
async fn get_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<&'static Catalog>>, ApiError> {
    let catalog = with_registry(&state, |registry| Ok(catalog::open(&registry.session)?)).await?;

    Ok(Json(ApiResponse::ok(catalog)))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/courses", get(get_courses))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    logging::init_tracing(&config.log_level)?;

    println!("🌐 Student Registry - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let registrar = Registrar::from_config(&config)?;
    println!("✓ Record file: {}", registrar.store().path().display());

    let state = AppState {
        registry: Arc::new(Mutex::new(Registry {
            registrar,
            session: Session::new(),
        })),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    info!(addr = %config.server_addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/students", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .await
        .context("Server terminated")?;

    Ok(())
}
