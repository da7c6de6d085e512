use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use clausewise_agents::{
    AgentContext, ComplianceChecker, ComplianceReport, ContractAnalyzer, ContractReport,
    NegotiationAdvisor, NegotiationReport, NegotiationRequest, RfqEvaluator, RfqReport,
    RfqRequest, SavingsReport, SavingsRequest, SavingsTracker, VendorReport, VendorRequest,
    VendorRiskAgent, WeightSettings,
};
use clausewise_core::{AnalysisError, AnalysisRequest};
use clausewise_llm::LlmClient;

struct AppState {
    contract: ContractAnalyzer,
    compliance: ComplianceChecker,
    vendor: VendorRiskAgent,
    rfq: RfqEvaluator,
    negotiation: NegotiationAdvisor,
    savings: SavingsTracker,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    let llm = match LlmClient::from_env() {
        Ok(client) => {
            info!(provider = client.provider().as_str(), model = client.model(), "llm ready");
            Some(client)
        }
        Err(err) => {
            warn!(error = %err, "llm unavailable, analyses run pattern-only");
            None
        }
    };
    let ctx = AgentContext::new(llm, load_weight_settings());
    let state = Arc::new(AppState {
        contract: ContractAnalyzer::new(ctx.clone()),
        compliance: ComplianceChecker::new(ctx.clone()),
        vendor: VendorRiskAgent::new(),
        rfq: RfqEvaluator::new(),
        negotiation: NegotiationAdvisor::new(ctx),
        savings: SavingsTracker::new(),
    });
    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/contracts/analyze", post(handle_contract))
        .route("/compliance/check", post(handle_compliance))
        .route("/vendors/evaluate", post(handle_vendor))
        .route("/rfq/evaluate", post(handle_rfq))
        .route("/negotiations/prepare", post(handle_negotiation))
        .route("/savings/report", post(handle_savings))
        .with_state(state);
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_contract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<ContractReport>, AppError> {
    let report = state.contract.analyze(&request).await?;
    Ok(Json(report))
}

async fn handle_compliance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<ComplianceReport>, AppError> {
    let report = state.compliance.check(&request)?;
    Ok(Json(report))
}

async fn handle_vendor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VendorRequest>,
) -> Result<Json<VendorReport>, AppError> {
    let report = state.vendor.evaluate(&request)?;
    Ok(Json(report))
}

async fn handle_rfq(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RfqRequest>,
) -> Result<Json<RfqReport>, AppError> {
    let report = state.rfq.evaluate(&request)?;
    Ok(Json(report))
}

async fn handle_negotiation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NegotiationRequest>,
) -> Result<Json<NegotiationReport>, AppError> {
    let report = state.negotiation.prepare(&request).await?;
    Ok(Json(report))
}

async fn handle_savings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SavingsRequest>,
) -> Result<Json<SavingsReport>, AppError> {
    let report = state.savings.report(&request)?;
    Ok(Json(report))
}

fn load_weight_settings() -> WeightSettings {
    let config_path =
        std::env::var("CLAUSEWISE_CONFIG").unwrap_or_else(|_| "clausewise.toml".to_string());
    let path = Path::new(&config_path);
    if !path.exists() {
        return WeightSettings::default();
    }
    match fs::read_to_string(path) {
        Ok(contents) => toml::from_str::<ServiceConfig>(&contents)
            .map(|cfg| cfg.weights)
            .unwrap_or_default(),
        Err(_) => WeightSettings::default(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServiceConfig {
    #[serde(default)]
    weights: WeightSettings,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Analysis(AnalysisError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, "validation_failure", message)
            }
            AppError::Analysis(AnalysisError::Extraction(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failure", message)
            }
            AppError::Analysis(err @ AnalysisError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout_failure", err.to_string())
            }
            AppError::Analysis(err) => {
                error!(error = %err, "analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code(),
                    err.to_string(),
                )
            }
            AppError::Internal(err) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}
