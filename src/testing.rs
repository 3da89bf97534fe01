//! Router-level test harness backed by a private in-memory database

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_kernel::{settings::Settings, Database, InitCtx};
use tower::ServiceExt;

/// Fresh in-memory database with every module's schema applied
pub async fn migrated_db() -> Database {
    let db = Database::in_memory().await.expect("in-memory database");
    db.apply_migrations(&crate::registry().collect_migrations())
        .await
        .expect("migrations apply");
    db
}

/// Fully wired router over its own database
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let settings = Settings::default();
        let db = migrated_db().await;
        let registry = crate::registry();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        Self {
            router: shelf_http::build_router(&registry, &ctx),
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Option<Value>) {
        self.call("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Option<Value>) {
        self.call("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Option<Value>) {
        self.call("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Option<Value>) {
        self.call("DELETE", uri, None).await
    }

    /// Length of the JSON array served at `uri`
    pub async fn list_len(&self, uri: &str) -> usize {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
        body.and_then(|body| body.as_array().map(Vec::len))
            .expect("list body")
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<Value>) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = (!bytes.is_empty())
            .then(|| serde_json::from_slice(&bytes).expect("JSON body"));
        (status, body)
    }
}

/// Create a book titled `title` and return its id
pub async fn create_book(app: &TestApp, title: &str) -> i64 {
    let (status, body) = app
        .post(
            "/api/books",
            json!({ "title": title, "author": "Anon", "published_date": "2000-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body.and_then(|body| body["id"].as_i64()).expect("book id")
}
