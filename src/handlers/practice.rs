use axum::{extract::Path, response::Json};

use crate::{
    models::{interview::InterviewType, practice::PracticeQuestion},
    services::question_bank::practice_bank,
};

pub async fn get_practice_questions(Path(category): Path<InterviewType>) -> Json<Vec<PracticeQuestion>> {
    Json(practice_bank(category))
}
