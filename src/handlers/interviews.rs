use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::{
        evaluation::SessionEvaluation,
        interview::{InterviewSession, StartInterviewRequest, SubmitAnswerRequest, SubmitAnswerResponse},
    },
    utils::errors::AppError,
    AppState,
};

pub async fn start_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<StartInterviewRequest>,
) -> Result<Json<InterviewSession>, AppError> {
    payload.validate()?;

    let session = state
        .engine
        .start_session(auth_user.user_id, payload.interview_type, payload.focus_area)
        .await?;

    Ok(Json(session))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    payload.validate()?;

    let answer_text = payload.answer_text.trim();
    if answer_text.is_empty() {
        return Err(AppError::BadRequest("Answer cannot be empty".to_string()));
    }

    let response = state
        .engine
        .submit_answer(auth_user.user_id, payload.interview_id, payload.question_id, answer_text)
        .await?;

    Ok(Json(response))
}

pub async fn complete_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<SessionEvaluation>, AppError> {
    let evaluation = state
        .engine
        .complete_session(auth_user.user_id, interview_id)
        .await?;

    Ok(Json(evaluation))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<InterviewSession>>, AppError> {
    Ok(Json(state.engine.get_history(auth_user.user_id).await?))
}

pub async fn get_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewSession>, AppError> {
    Ok(Json(state.engine.get_session(auth_user.user_id, interview_id).await?))
}
