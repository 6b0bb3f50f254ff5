use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser, models::evaluation::DetailedEvaluation, utils::errors::AppError, AppState,
};

pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<DetailedEvaluation>, AppError> {
    let detailed = state
        .engine
        .get_detailed_evaluation(auth_user.user_id, interview_id)
        .await?;

    Ok(Json(detailed))
}
