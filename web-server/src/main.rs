use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use estate_crm::{
    database::EnquiryRepository,
    intake::TracingNotifier,
    services::IntakeService,
    webforms::WebformsClient,
    BatchSummary, CrmError, Enquiry, ItemOutcome, RequestContext, RoutingPolicy,
};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
}

// API types
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct EnquiryInfo {
    pub enquiry_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub source: String,
    pub status: String,
    pub assigned_agent_id: Option<String>,
    pub created_at: String,
}

impl From<Enquiry> for EnquiryInfo {
    fn from(e: Enquiry) -> Self {
        Self {
            enquiry_id: e.enquiry_id.to_string(),
            first_name: e.first_name,
            last_name: e.last_name,
            email: e.email,
            phone: e.phone,
            source: e.source.to_string(),
            status: e.status.to_string(),
            assigned_agent_id: e.assigned_agent_id.map(|id| id.to_string()),
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub agent_id: Option<uuid::Uuid>,
    pub policy: Option<String>,
    pub country: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("estate_crm_web_server=info,estate_crm=info,tower_http=debug")
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Database connection
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost:5432/estate-crm".to_string());

    info!("Connecting to database: {}", database_url);
    let pool = sqlx::PgPool::connect(&database_url).await?;

    // Intake service over the Postgres repository
    let repository = EnquiryRepository::new(pool);
    let mut intake = IntakeService::new(Arc::new(repository), Arc::new(TracingNotifier));

    // Optional CMS sync configuration
    if let Ok(base) = std::env::var("WEBFORMS_API_BASE") {
        let form_ids = std::env::var("WEBFORMS_FORM_IDS")
            .unwrap_or_else(|_| "1,2,3".to_string())
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        intake = intake.with_webforms(WebformsClient::new(base)?, form_ids);
    }

    let app_state = AppState {
        intake: Arc::new(intake),
    };

    // Build our application with routes
    let app = create_router(app_state);

    // Determine port
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        // API routes
        .route("/api/health", get(health_check))
        .route("/api/webhooks/forms", post(receive_form_webhook))
        .route("/api/sync/run", post(run_sync))
        .route("/api/enquiries", get(list_enquiries))
        .route("/api/enquiries/:enquiry_id", get(get_enquiry))
        .route("/api/enquiries/:enquiry_id/assign", post(assign_enquiry))
        // Add middleware
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
    // Note: In production, add auth middleware layer here; every route
    // assumes an already-authenticated caller.
}

/// Caller identity from forwarded headers. The auth layer in front of this
/// service (out of scope here) is responsible for setting them.
fn request_context(headers: &HeaderMap) -> RequestContext {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| uuid::Uuid::parse_str(s).ok());
    let name = headers
        .get("x-user-name")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    match (user_id, name) {
        (Some(id), Some(name)) => RequestContext::new(id, name),
        _ => RequestContext::system(),
    }
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        success: true,
        data: Some("OK".to_string()),
        error: None,
    })
}

// Receive one website-form submission
async fn receive_form_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<ItemOutcome>>, StatusCode> {
    let ctx = request_context(&headers);
    match state.intake.handle_webhook(&ctx, &payload).await {
        Ok(outcome) => Ok(Json(ApiResponse {
            success: true,
            data: Some(outcome),
            error: None,
        })),
        Err(CrmError::Payload { message }) => {
            warn!("Rejected webhook payload: {}", message);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(e) => {
            warn!("Failed to process webhook: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Pull recent CMS submissions and process them as a batch
async fn run_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<BatchSummary>>, StatusCode> {
    let ctx = request_context(&headers);
    match state.intake.run_sync(&ctx).await {
        Ok(summary) => Ok(Json(ApiResponse {
            success: true,
            data: Some(summary),
            error: None,
        })),
        Err(CrmError::Upstream { status, detail }) => {
            warn!("CMS sync failed upstream ({}): {}", status, detail);
            Err(StatusCode::BAD_GATEWAY)
        }
        Err(e) => {
            warn!("Failed to run sync: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// List recent enquiries
async fn list_enquiries(
    Query(query): Query<ListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EnquiryInfo>>>, StatusCode> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    match state.intake.list_enquiries(limit).await {
        Ok(enquiries) => Ok(Json(ApiResponse {
            success: true,
            data: Some(enquiries.into_iter().map(Into::into).collect()),
            error: None,
        })),
        Err(e) => {
            warn!("Failed to list enquiries: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Get a single enquiry
async fn get_enquiry(
    Path(enquiry_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EnquiryInfo>>, StatusCode> {
    match uuid::Uuid::parse_str(&enquiry_id) {
        Ok(enquiry_uuid) => match state.intake.get_enquiry(enquiry_uuid).await {
            Ok(Some(enquiry)) => Ok(Json(ApiResponse {
                success: true,
                data: Some(enquiry.into()),
                error: None,
            })),
            Ok(None) => Err(StatusCode::NOT_FOUND),
            Err(e) => {
                warn!("Failed to fetch enquiry: {:?}", e);
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
        Err(_) => Err(StatusCode::BAD_REQUEST),
    }
}

// Assign an enquiry to a chosen agent, or let a policy pick one
async fn assign_enquiry(
    Path(enquiry_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AssignRequest>,
) -> Result<Json<ApiResponse<Option<String>>>, StatusCode> {
    let enquiry_uuid = match uuid::Uuid::parse_str(&enquiry_id) {
        Ok(id) => id,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };

    let policy = match request.policy.as_deref() {
        Some("round_robin") => RoutingPolicy::RoundRobin,
        Some("territory") => RoutingPolicy::Territory,
        Some("capacity") => RoutingPolicy::Capacity,
        _ => RoutingPolicy::default(),
    };

    let ctx = request_context(&headers);
    match state
        .intake
        .assign(&ctx, enquiry_uuid, request.agent_id, policy, request.country)
        .await
    {
        Ok(assigned) => Ok(Json(ApiResponse {
            success: assigned.is_some(),
            data: Some(assigned.map(|id| id.to_string())),
            error: assigned
                .is_none()
                .then(|| "no eligible agent or enquiry not assignable".to_string()),
        })),
        Err(e) => {
            warn!("Failed to assign enquiry: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
