pub mod models;
pub mod serializer;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use shelf_db::StoreResult;
use shelf_http::openapi::{
    id_parameter, json_body, json_response, schema_ref, validation_response,
};
use shelf_http::{viewset, AppError};
use shelf_kernel::{InitCtx, Migration, Module};

use models::{Book, BookDraft};
use store::BookStore;

/// Books module: the `/api/books` collection plus book-scoped reviews
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        viewset::router(BookResource::new(BookStore::new(ctx.db.clone())))
            .merge(crate::modules::reviews::book_scoped_router(ctx.db))
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": json_response("All books", json!({ "type": "array", "items": schema_ref("Book") }))
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": json_body(schema_ref("BookInput")),
                        "responses": {
                            "201": json_response("Created book", schema_ref("Book")),
                            "400": validation_response()
                        }
                    }
                },
                "/{id}": {
                    "parameters": id_parameter(),
                    "get": {
                        "summary": "Retrieve a book",
                        "tags": ["Books"],
                        "responses": {
                            "200": json_response("The book", schema_ref("Book")),
                            "404": { "description": "No book with this id" }
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "requestBody": json_body(schema_ref("BookInput")),
                        "responses": {
                            "200": json_response("Updated book", schema_ref("Book")),
                            "400": validation_response(),
                            "404": { "description": "No book with this id" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book and its reviews",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": { "description": "No book with this id" }
                        }
                    }
                },
                "/{id}/reviews": {
                    "parameters": id_parameter(),
                    "get": {
                        "summary": "List reviews of a book",
                        "tags": ["Books", "Reviews"],
                        "responses": {
                            "200": json_response("Reviews of the book", json!({ "type": "array", "items": schema_ref("Review") })),
                            "404": { "description": "No book with this id" }
                        }
                    },
                    "post": {
                        "summary": "Review a book",
                        "tags": ["Books", "Reviews"],
                        "requestBody": json_body(schema_ref("BookReviewInput")),
                        "responses": {
                            "201": json_response("Created review", schema_ref("Review")),
                            "400": validation_response(),
                            "404": { "description": "No book with this id" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string", "maxLength": serializer::TITLE_MAX_LEN },
                            "author": { "type": "string", "maxLength": serializer::AUTHOR_MAX_LEN },
                            "published_date": { "type": "string", "format": "date" }
                        },
                        "required": ["id", "title", "author", "published_date"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": serializer::TITLE_MAX_LEN },
                            "author": { "type": "string", "maxLength": serializer::AUTHOR_MAX_LEN },
                            "published_date": { "type": "string", "format": "date" }
                        },
                        "required": ["title", "author", "published_date"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE book (
                    id             INTEGER PRIMARY KEY AUTOINCREMENT,
                    title          TEXT NOT NULL CHECK (title != ''),
                    author         TEXT NOT NULL CHECK (author != ''),
                    published_date TEXT NOT NULL
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Generic CRUD endpoints over [`BookStore`]
#[derive(Clone)]
pub struct BookResource {
    store: BookStore,
}

impl BookResource {
    pub fn new(store: BookStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl viewset::Resource for BookResource {
    type Entity = Book;
    type Draft = BookDraft;

    const NAME: &'static str = "book";

    fn id_of(book: &Book) -> i64 {
        book.id
    }

    async fn validate(&self, payload: &Value) -> Result<BookDraft, AppError> {
        Ok(serializer::validate_book(payload)?)
    }

    async fn list(&self) -> StoreResult<Vec<Book>> {
        self.store.fetch_all().await
    }

    async fn create(&self, draft: BookDraft) -> StoreResult<Book> {
        self.store.insert(&draft).await
    }

    async fn retrieve(&self, id: i64) -> StoreResult<Book> {
        self.store.fetch(id).await
    }

    async fn update(&self, id: i64, draft: BookDraft) -> StoreResult<Book> {
        self.store.update(id, &draft).await
    }

    async fn destroy(&self, id: i64) -> StoreResult<()> {
        self.store.delete(id).await
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use crate::testing::{self, TestApp};
    use axum::http::StatusCode;
    use serde_json::json;

    fn dune() -> serde_json::Value {
        json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "published_date": "1965-06-01"
        })
    }

    #[tokio::test]
    async fn create_then_retrieve_returns_submitted_fields() {
        let app = TestApp::spawn().await;

        let (status, created) = app.post("/api/books", dune()).await;
        assert_eq!(status, StatusCode::CREATED);
        let created = created.unwrap();
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = app.get(&format!("/api/books/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        let fetched = fetched.unwrap();
        for field in ["title", "author", "published_date"] {
            assert_eq!(fetched[field], dune()[field], "field {field}");
        }
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn invalid_book_is_rejected_with_field_errors() {
        let app = TestApp::spawn().await;

        let (status, body) = app
            .post(
                "/api/books",
                json!({ "title": "", "author": "Anon", "published_date": "June 1965" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = &body.unwrap()["error"]["details"];
        assert_eq!(details["title"][0], "This field may not be blank.");
        assert!(details["published_date"].is_array());
        assert!(details.get("author").is_none());

        assert_eq!(app.list_len("/api/books").await, 0);
    }

    #[tokio::test]
    async fn update_is_full_replace() {
        let app = TestApp::spawn().await;
        let (_, created) = app.post("/api/books", dune()).await;
        let id = created.unwrap()["id"].as_i64().unwrap();

        let (status, body) = app
            .put(&format!("/api/books/{id}"), json!({ "title": "Dune Messiah" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let details = &body.unwrap()["error"]["details"];
        assert!(details["author"].is_array());
        assert!(details["published_date"].is_array());

        let (status, body) = app
            .put(
                &format!("/api/books/{id}"),
                json!({
                    "title": "Dune Messiah",
                    "author": "Frank Herbert",
                    "published_date": "1969-10-15"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.unwrap(),
            json!({
                "id": id,
                "title": "Dune Messiah",
                "author": "Frank Herbert",
                "published_date": "1969-10-15"
            })
        );
    }

    #[tokio::test]
    async fn missing_ids_are_404_with_empty_body() {
        let app = TestApp::spawn().await;

        let (status, body) = app.get("/api/books/42").await;
        assert_eq!((status, body), (StatusCode::NOT_FOUND, None));

        let (status, body) = app.put("/api/books/42", dune()).await;
        assert_eq!((status, body), (StatusCode::NOT_FOUND, None));

        let (status, body) = app.delete("/api/books/42").await;
        assert_eq!((status, body), (StatusCode::NOT_FOUND, None));
    }

    #[tokio::test]
    async fn list_counts_and_order_are_stable() {
        let app = TestApp::spawn().await;
        for _ in 0..3 {
            app.post("/api/books", dune()).await;
        }

        let (_, first) = app.get("/api/books").await;
        let (_, second) = app.get("/api/books").await;
        assert_eq!(first.as_ref().unwrap().as_array().unwrap().len(), 3);
        assert_eq!(first, second);

        let id = first.unwrap()[1]["id"].as_i64().unwrap();
        let (status, body) = app.delete(&format!("/api/books/{id}")).await;
        assert_eq!((status, body), (StatusCode::NO_CONTENT, None));
        assert_eq!(app.list_len("/api/books").await, 2);
    }

    #[tokio::test]
    async fn book_scoped_reviews_require_existing_book() {
        let app = TestApp::spawn().await;

        let (status, _) = app.get("/api/books/7/reviews").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post(
                "/api/books/7/reviews",
                json!({ "reviewer": "Alice", "text": "Great", "rating": 5 }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.list_len("/api/reviews").await, 0);
    }

    #[tokio::test]
    async fn book_scoped_review_takes_book_from_path() {
        let app = TestApp::spawn().await;
        let book_id = testing::create_book(&app, "Dune").await;
        let other_id = testing::create_book(&app, "Emma").await;

        let (status, review) = app
            .post(
                &format!("/api/books/{book_id}/reviews"),
                json!({ "book": other_id, "reviewer": "Alice", "text": "Great", "rating": 5 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review.unwrap()["book"], book_id);

        let (status, reviews) = app.get(&format!("/api/books/{book_id}/reviews")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reviews.unwrap().as_array().unwrap().len(), 1);

        let (_, reviews) = app.get(&format!("/api/books/{other_id}/reviews")).await;
        assert!(reviews.unwrap().as_array().unwrap().is_empty());
    }
}
