pub mod models;
pub mod serializer;
pub mod store;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shelf_db::{Database, StoreResult};
use shelf_http::openapi::{
    id_parameter, json_body, json_response, schema_ref, validation_response,
};
use shelf_http::{viewset, AppError};
use shelf_kernel::{InitCtx, Migration, Module};

use crate::modules::books::store::BookStore;
use models::{Review, ReviewDraft};
use store::ReviewStore;

/// Reviews module: the `/api/reviews` collection
pub struct ReviewsModule;

impl ReviewsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        viewset::router(ReviewResource::new(ctx.db))
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List reviews",
                        "tags": ["Reviews"],
                        "responses": {
                            "200": json_response("All reviews", json!({ "type": "array", "items": schema_ref("Review") }))
                        }
                    },
                    "post": {
                        "summary": "Create a review",
                        "tags": ["Reviews"],
                        "requestBody": json_body(schema_ref("ReviewInput")),
                        "responses": {
                            "201": json_response("Created review", schema_ref("Review")),
                            "400": validation_response()
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_parameter(),
                    "get": {
                        "summary": "Retrieve a review",
                        "tags": ["Reviews"],
                        "responses": {
                            "200": json_response("The review", schema_ref("Review")),
                            "404": { "description": "No review with this id" }
                        }
                    },
                    "put": {
                        "summary": "Replace a review",
                        "tags": ["Reviews"],
                        "requestBody": json_body(schema_ref("ReviewInput")),
                        "responses": {
                            "200": json_response("Updated review", schema_ref("Review")),
                            "400": validation_response(),
                            "404": { "description": "No review with this id" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a review",
                        "tags": ["Reviews"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": { "description": "No review with this id" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "book": { "type": "integer", "format": "int64" },
                            "reviewer": { "type": "string", "maxLength": serializer::REVIEWER_MAX_LEN },
                            "text": { "type": "string" },
                            "rating": { "type": "integer", "minimum": serializer::RATING_MIN, "maximum": serializer::RATING_MAX },
                            "created_at": { "type": "string", "format": "date-time", "readOnly": true }
                        },
                        "required": ["id", "book", "reviewer", "text", "rating", "created_at"]
                    },
                    "ReviewInput": {
                        "type": "object",
                        "properties": {
                            "book": { "type": "integer", "format": "int64" },
                            "reviewer": { "type": "string", "maxLength": serializer::REVIEWER_MAX_LEN },
                            "text": { "type": "string" },
                            "rating": { "type": "integer", "minimum": serializer::RATING_MIN, "maximum": serializer::RATING_MAX }
                        },
                        "required": ["book", "reviewer", "text", "rating"]
                    },
                    "BookReviewInput": {
                        "type": "object",
                        "properties": {
                            "reviewer": { "type": "string", "maxLength": serializer::REVIEWER_MAX_LEN },
                            "text": { "type": "string" },
                            "rating": { "type": "integer", "minimum": serializer::RATING_MIN, "maximum": serializer::RATING_MAX }
                        },
                        "required": ["reviewer", "text", "rating"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE review (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    book_id    INTEGER NOT NULL REFERENCES book (id) ON DELETE CASCADE,
                    reviewer   TEXT NOT NULL CHECK (reviewer != ''),
                    text       TEXT NOT NULL CHECK (text != ''),
                    rating     INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    created_at TEXT NOT NULL
                );
                CREATE INDEX review_book_id_idx ON review (book_id);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "reviews module stopped");
        Ok(())
    }
}

/// Generic CRUD endpoints over [`ReviewStore`]
#[derive(Clone)]
pub struct ReviewResource {
    reviews: ReviewStore,
    books: BookStore,
}

impl ReviewResource {
    pub fn new(db: &Database) -> Self {
        Self {
            reviews: ReviewStore::new(db.clone()),
            books: BookStore::new(db.clone()),
        }
    }
}

#[async_trait]
impl viewset::Resource for ReviewResource {
    type Entity = Review;
    type Draft = ReviewDraft;

    const NAME: &'static str = "review";

    fn id_of(review: &Review) -> i64 {
        review.id
    }

    async fn validate(&self, payload: &Value) -> Result<ReviewDraft, AppError> {
        serializer::validate_review(payload, &self.books).await
    }

    async fn list(&self) -> StoreResult<Vec<Review>> {
        self.reviews.fetch_all().await
    }

    async fn create(&self, draft: ReviewDraft) -> StoreResult<Review> {
        self.reviews.insert(&draft).await
    }

    async fn retrieve(&self, id: i64) -> StoreResult<Review> {
        self.reviews.fetch(id).await
    }

    async fn update(&self, id: i64, draft: ReviewDraft) -> StoreResult<Review> {
        self.reviews.update(id, &draft).await
    }

    async fn destroy(&self, id: i64) -> StoreResult<()> {
        self.reviews.delete(id).await
    }
}

/// `/{id}/reviews` routes, merged into the books module router
pub fn book_scoped_router(db: &Database) -> Router {
    Router::new()
        .route(
            "/{id}/reviews",
            get(list_book_reviews).post(create_book_review),
        )
        .with_state(ReviewResource::new(db))
}

async fn list_book_reviews(
    State(resource): State<ReviewResource>,
    Path(book_id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    resource.books.fetch(book_id).await?;
    Ok(Json(resource.reviews.fetch_for_book(book_id).await?))
}

async fn create_book_review(
    State(resource): State<ReviewResource>,
    Path(book_id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    resource.books.fetch(book_id).await?;

    let payload = viewset::json_body(payload)?;
    let draft = serializer::validate_book_review(&payload, book_id)?;
    let review = resource.reviews.insert(&draft).await?;
    tracing::info!(entity = "review", id = review.id, book_id, "entity created");
    Ok((StatusCode::CREATED, Json(review)))
}

/// Create a new instance of the reviews module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ReviewsModule::new())
}
