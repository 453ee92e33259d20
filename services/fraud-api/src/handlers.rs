use crate::errors::ApiError;
use crate::metrics::{self, ANALYSIS_PERSIST_FAILURES, PREDICTIONS_TOTAL, SCORE_DISTRIBUTION};
use crate::middleware::{AuthenticatedUser, JwtAuth, TokenIssuer};
use crate::model_client::ModelServiceClient;
use crate::models::*;
use crate::passwords::{hash_password, verify_password};
use crate::repository::{AnalysisRepository, UserRepository, HISTORY_LIMIT};
use actix_web::{web, HttpResponse};
use prometheus::Registry;
use risk_engine::{Prediction, RiskScorer, Threshold, TransactionInput, MODEL_TYPE};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub type Users = web::Data<Arc<dyn UserRepository>>;
pub type Analyses = web::Data<Arc<dyn AnalysisRepository>>;

// ===== Health Check =====
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        service: "fraud-backend".to_string(),
        version: MODEL_TYPE.to_string(),
    })
}

// ===== Register =====
pub async fn register(
    req: web::Json<CredentialsRequest>,
    users: Users,
    issuer: web::Data<Arc<TokenIssuer>>,
) -> Result<HttpResponse, ApiError> {
    let (email, password) = req
        .normalized()
        .map(|(email, password)| (email, password.to_string()))
        .ok_or(ApiError::MissingCredentials)?;

    if users.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::UserExists);
    }

    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let user = users.create_user(&email, &password_hash).await?;
    let token = issuer.issue(&user)?;

    info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

// ===== Login =====
pub async fn login(
    req: web::Json<CredentialsRequest>,
    users: Users,
    issuer: web::Data<Arc<TokenIssuer>>,
) -> Result<HttpResponse, ApiError> {
    let (email, password) = req
        .normalized()
        .map(|(email, password)| (email, password.to_string()))
        .ok_or(ApiError::MissingCredentials)?;

    let user = users
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let stored_hash = user.password_hash.clone();
    let verified = web::block(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    if !verified {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issuer.issue(&user)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

// ===== Heuristic Prediction =====
pub async fn predict(
    user: AuthenticatedUser,
    req: web::Json<PredictRequest>,
    scorer: web::Data<Arc<RiskScorer>>,
    threshold: web::Data<Threshold>,
    analyses: Analyses,
) -> Result<HttpResponse, ApiError> {
    let payload =
        TransactionPayload::parse(req.into_inner().transaction).map_err(ApiError::InvalidPayload)?;
    let input = TransactionInput::from(payload);

    let prediction = threshold.classify(scorer.score(&input));

    PREDICTIONS_TOTAL
        .with_label_values(&[&prediction.fraud_label.as_u8().to_string()])
        .inc();
    SCORE_DISTRIBUTION.observe(prediction.fraud_probability);

    info!(
        "Fraud probability {:.4} (label {}) for user {}",
        prediction.fraud_probability,
        prediction.fraud_label.as_u8(),
        user.id
    );

    record_analysis(analyses.get_ref().as_ref(), user.id, &input, &prediction).await;

    Ok(HttpResponse::Ok().json(prediction))
}

/// Store the analysis; failures are logged and never reach the caller
async fn record_analysis(
    analyses: &dyn AnalysisRepository,
    user_id: Uuid,
    input: &TransactionInput,
    prediction: &Prediction,
) {
    let stored = match (serde_json::to_value(input), serde_json::to_value(prediction)) {
        (Ok(input), Ok(result)) => analyses
            .create_analysis(user_id, &input, &result)
            .await
            .map(|_| ()),
        (Err(e), _) | (_, Err(e)) => Err(e.into()),
    };

    if let Err(e) = stored {
        error!("Error saving analysis history for user {}: {}", user_id, e);
        ANALYSIS_PERSIST_FAILURES.inc();
    }
}

// ===== Model Service Proxy =====
pub async fn predict_model(
    req: web::Json<ModelPredictRequest>,
    model: web::Data<Arc<ModelServiceClient>>,
) -> Result<HttpResponse, ApiError> {
    let features =
        ModelFeatures::parse(req.into_inner().features).map_err(ApiError::InvalidFeatures)?;

    let data = model.predict(&features).await?;

    Ok(HttpResponse::Ok().json(data))
}

// ===== Analysis History =====
pub async fn my_analyses(
    user: AuthenticatedUser,
    analyses: Analyses,
) -> Result<HttpResponse, ApiError> {
    let records = analyses.analyses_for_user(user.id, HISTORY_LIMIT).await?;

    Ok(HttpResponse::Ok().json(AnalysesResponse {
        analyses: records.into_iter().map(AnalysisResponse::from).collect(),
    }))
}

// ===== Prometheus =====
pub async fn prometheus_metrics(registry: web::Data<Registry>) -> HttpResponse {
    match metrics::render(registry.get_ref()) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig, issuer: Arc<TokenIssuer>) {
    cfg.route("/api/health", web::get().to(health_check))
        .route("/api/auth/register", web::post().to(register))
        .route("/api/auth/login", web::post().to(login))
        .route("/api/predict-model", web::post().to(predict_model))
        .service(
            web::resource("/api/predict")
                .wrap(JwtAuth::new(issuer.clone()))
                .route(web::post().to(predict)),
        )
        .service(
            web::resource("/api/analyses/me")
                .wrap(JwtAuth::new(issuer))
                .route(web::get().to(my_analyses)),
        )
        .route("/metrics", web::get().to(prometheus_metrics));
}
