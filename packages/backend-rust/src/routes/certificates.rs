use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mathlingo_algo::{Certificate, CertificateStatus, SubjectId, UserId};
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::routes::adaptive::UserQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ensure", post(ensure_certificate))
}

pub fn subjects_router() -> Router<AppState> {
    Router::new().route("/:id/progress", get(subject_progress))
}

/// Public, unauthenticated verification.
pub fn verify_router() -> Router<AppState> {
    Router::new().route("/:hash", get(verify))
}

#[derive(Debug, Deserialize)]
struct EnsureRequest {
    user_id: UserId,
    subject_id: SubjectId,
}

#[derive(Debug, Serialize)]
struct EnsureResponse {
    issued: bool,
    certificate: Option<Certificate>,
}

#[derive(Debug, Serialize)]
struct VerificationResponse {
    valid: bool,
    certificate: Certificate,
}

async fn ensure_certificate(
    State(state): State<AppState>,
    Json(payload): Json<EnsureRequest>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = state
        .engine()
        .ensure_subject_certificate(payload.user_id, payload.subject_id)
        .await?;
    Ok(ok(EnsureResponse {
        issued: certificate.is_some(),
        certificate,
    }))
}

async fn subject_progress(
    State(state): State<AppState>,
    Path(subject_id): Path<SubjectId>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let evaluation = state
        .engine()
        .subject_progress(query.user_id, subject_id)
        .await?;
    Ok(ok(evaluation))
}

async fn verify(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = state
        .engine()
        .verify_certificate(&hash)
        .await?
        .ok_or_else(|| AppError::not_found("Certificate not found"))?;
    Ok(ok(VerificationResponse {
        valid: certificate.status == CertificateStatus::Valid,
        certificate,
    }))
}
