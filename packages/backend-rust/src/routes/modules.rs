use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use mathlingo_algo::{ModuleId, SubjectId};
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_modules))
        .route("/:id", get(get_module))
}

#[derive(Debug, Deserialize)]
struct ModuleQuery {
    subject_id: Option<SubjectId>,
}

async fn list_modules(
    State(state): State<AppState>,
    Query(query): Query<ModuleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let modules = state.content().list_modules(query.subject_id).await?;
    Ok(ok(modules))
}

async fn get_module(
    State(state): State<AppState>,
    Path(module_id): Path<ModuleId>,
) -> Result<impl IntoResponse, AppError> {
    let module = state.content().get_module(module_id).await?;
    Ok(ok(module))
}
