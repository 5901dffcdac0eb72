//! Question handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AuthenticatedUser, OptionalUser};
use crate::models::{AnswerQuestionRequest, CreateQuestionRequest, CreatedResponse, Question};
use crate::services::QuestionService;

#[derive(Debug, serde::Serialize)]
pub struct QuestionBody {
    pub question: Question,
}

/// GET /questions/:id
pub async fn get_question(
    State(service): State<Arc<QuestionService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Question>, ApiError> {
    Ok(Json(service.get(id).await?))
}

/// PUT /questions/:id/answer
pub async fn put_answer(
    State(service): State<Arc<QuestionService>>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let user = user.ok_or_else(|| {
        ApiError::Unauthorized("You must be logged in to answer questions.".to_string())
    })?;

    Ok(Json(service.answer(id, user.user_id, request).await?))
}

/// GET /listings/:id/questions
pub async fn list_questions(
    State(service): State<Arc<QuestionService>>,
    _user: AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(service.list_for_listing(listing_id).await?))
}

/// POST /listings/:id/questions
pub async fn ask_question(
    State(service): State<Arc<QuestionService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<QuestionBody>>), ApiError> {
    let question = service.ask(listing_id, user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            successful: true,
            text: "Question Successfully Created".to_string(),
            data: QuestionBody { question },
        }),
    ))
}
