use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{CreateFlagRequest, CreatedResponse, ListingFlag};
use crate::services::FlagService;

#[derive(Debug, serde::Serialize)]
pub struct FlagBody {
    pub flag: ListingFlag,
}

/// POST /flags
pub async fn create_flag(
    State(service): State<Arc<FlagService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<CreateFlagRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<FlagBody>>), ApiError> {
    let flag = service.flag(user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            successful: true,
            text: "Listing Successfully Flagged".to_string(),
            data: FlagBody { flag },
        }),
    ))
}
