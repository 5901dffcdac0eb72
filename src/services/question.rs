//! Questions asked on listings and their answers

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Store;
use crate::error::{ApiError, ApiResult};
use crate::models::{AnswerQuestionRequest, CreateQuestionRequest, NewQuestion, Question};

use super::ListingService;

#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn Store>,
    listings: ListingService,
}

impl QuestionService {
    pub fn new(store: Arc<dyn Store>, listings: ListingService) -> Self {
        Self { store, listings }
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Question> {
        self.store
            .find_question(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
    }

    pub async fn list_for_listing(&self, listing_id: Uuid) -> ApiResult<Vec<Question>> {
        self.listings.find(listing_id).await?;
        Ok(self.store.list_questions(listing_id).await?)
    }

    pub async fn ask(
        &self,
        listing_id: Uuid,
        asker_id: Uuid,
        request: CreateQuestionRequest,
    ) -> ApiResult<Question> {
        request.validate()?;
        self.listings.find(listing_id).await?;

        let question = self
            .store
            .insert_question(NewQuestion {
                listing_id,
                asker_id,
                question: request.question.trim().to_string(),
            })
            .await?;

        tracing::info!(question_id = %question.id, listing_id = %listing_id, "Question asked");
        Ok(question)
    }

    /// Record an answer. Only the owner of the listing may answer.
    pub async fn answer(
        &self,
        id: Uuid,
        answerer: Uuid,
        request: AnswerQuestionRequest,
    ) -> ApiResult<Question> {
        request.validate()?;
        let question = self.get(id).await?;
        let listing = self.listings.find(question.listing_id).await?;

        if listing.owner_id != answerer {
            return Err(ApiError::Forbidden(
                "Only the listing owner can answer questions".to_string(),
            ));
        }

        self.store
            .answer_question(id, request.answer.trim())
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
    }
}
