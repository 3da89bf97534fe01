//! Plain JSON endpoints that bypass the viewset machinery.

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use shelf_http::openapi::{json_response, schema_ref};
use shelf_http::AppError;
use shelf_kernel::{InitCtx, Module};

use crate::modules::reviews::store::ReviewStore;

/// Demo module serving a static book list and a flattened review list
pub struct DemoModule;

impl DemoModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for DemoModule {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        Router::new()
            .route("/books", get(static_books))
            .route("/reviews", get(flat_reviews))
            .with_state(ReviewStore::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "Hardcoded sample books",
                        "tags": ["Demo"],
                        "responses": {
                            "200": json_response("Two sample books", json!({ "type": "array", "items": schema_ref("DemoBook") }))
                        }
                    }
                },
                "/reviews": {
                    "get": {
                        "summary": "Every stored review, flattened",
                        "tags": ["Demo"],
                        "responses": {
                            "200": json_response("Reviews under a `review` key", schema_ref("FlatReviews"))
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "DemoBook": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "reviews": { "type": "array", "items": {} }
                        },
                        "required": ["id", "title", "author", "reviews"]
                    },
                    "FlatReviews": {
                        "type": "object",
                        "properties": {
                            "review": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "book": { "type": "integer" },
                                        "reviewer": { "type": "string" },
                                        "text": { "type": "string" },
                                        "rating": { "type": "integer" }
                                    }
                                }
                            }
                        },
                        "required": ["review"]
                    }
                }
            }
        }))
    }
}

#[derive(Debug, Serialize)]
struct DemoBook {
    id: i64,
    title: &'static str,
    author: &'static str,
    reviews: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct FlatReview {
    book: i64,
    reviewer: String,
    text: String,
    rating: i64,
}

#[derive(Debug, Serialize)]
struct FlatReviews {
    review: Vec<FlatReview>,
}

/// Sample books that never touch the store
async fn static_books() -> Json<Vec<DemoBook>> {
    Json(vec![
        DemoBook {
            id: 1,
            title: "To Kill a Mockingbird",
            author: "Harper Lee",
            reviews: Vec::new(),
        },
        DemoBook {
            id: 2,
            title: "1984",
            author: "George Orwell",
            reviews: Vec::new(),
        },
    ])
}

async fn flat_reviews(State(reviews): State<ReviewStore>) -> Result<Json<FlatReviews>, AppError> {
    let review = reviews
        .fetch_all()
        .await?
        .into_iter()
        .map(|review| FlatReview {
            book: review.book,
            reviewer: review.reviewer,
            text: review.text,
            rating: review.rating,
        })
        .collect();

    Ok(Json(FlatReviews { review }))
}

/// Create a new instance of the demo module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(DemoModule::new())
}
