//! Message handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{CreateMessageRequest, MessageResponse, MessageView, UserResponse};
use crate::services::MessageService;

/// POST /messages
pub async fn create_message(
    State(service): State<Arc<MessageService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    service.create(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::success("Message Successfully Created")),
    ))
}

/// GET /messages/:listing_id/:first_user_id/:second_user_id
pub async fn find_messages(
    State(service): State<Arc<MessageService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((listing_id, first, second)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let thread = service.thread(user.user_id, listing_id, first, second).await?;
    Ok(Json(thread))
}

/// GET /messages/:listing_id/users
pub async fn find_users_in_message_thread(
    State(service): State<Arc<MessageService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = service.thread_participants(user.user_id, listing_id).await?;
    Ok(Json(users))
}
