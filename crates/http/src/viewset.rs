//! Generic list/create/retrieve/update/destroy handlers.
//!
//! A [`Resource`] supplies validation and storage for one entity type;
//! [`router`] exposes it over a collection endpoint (`/`) and an item
//! endpoint (`/{id}`). Every request runs the same pipeline: extract,
//! validate, execute against the store, serialize.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use shelf_db::StoreResult;

use crate::error::AppError;

/// Capability set backing a collection/item endpoint pair
#[async_trait]
pub trait Resource: Clone + Send + Sync + 'static {
    /// Stored representation returned to clients
    type Entity: Serialize + Send;
    /// Validated input ready to be persisted
    type Draft: Send;

    /// Entity name used in logs
    const NAME: &'static str;

    fn id_of(entity: &Self::Entity) -> i64;

    /// Turn a raw JSON payload into a draft or field errors.
    async fn validate(&self, payload: &Value) -> Result<Self::Draft, AppError>;

    async fn list(&self) -> StoreResult<Vec<Self::Entity>>;

    async fn create(&self, draft: Self::Draft) -> StoreResult<Self::Entity>;

    async fn retrieve(&self, id: i64) -> StoreResult<Self::Entity>;

    /// Replace every writable field of entity `id` with `draft`.
    async fn update(&self, id: i64, draft: Self::Draft) -> StoreResult<Self::Entity>;

    async fn destroy(&self, id: i64) -> StoreResult<()>;
}

/// Build the collection and item routes for `resource`
pub fn router<R: Resource>(resource: R) -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/{id}",
            get(retrieve::<R>).put(update::<R>).delete(destroy::<R>),
        )
        .with_state(resource)
}

/// Unwrap a JSON body, mapping syntax and content-type failures to 400.
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn list<R: Resource>(State(resource): State<R>) -> Result<Json<Vec<R::Entity>>, AppError> {
    let entities = resource.list().await?;
    tracing::debug!(entity = R::NAME, count = entities.len(), "listed entities");
    Ok(Json(entities))
}

async fn create<R: Resource>(
    State(resource): State<R>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<R::Entity>), AppError> {
    let payload = json_body(payload)?;
    let draft = resource.validate(&payload).await?;
    let created = resource.create(draft).await?;
    tracing::info!(entity = R::NAME, id = R::id_of(&created), "entity created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn retrieve<R: Resource>(
    State(resource): State<R>,
    Path(id): Path<i64>,
) -> Result<Json<R::Entity>, AppError> {
    Ok(Json(resource.retrieve(id).await?))
}

async fn update<R: Resource>(
    State(resource): State<R>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R::Entity>, AppError> {
    // A missing entity is reported before any payload problem.
    resource.retrieve(id).await?;

    let payload = json_body(payload)?;
    let draft = resource.validate(&payload).await?;
    let updated = resource.update(id, draft).await?;
    tracing::info!(entity = R::NAME, id, "entity updated");
    Ok(Json(updated))
}

async fn destroy<R: Resource>(
    State(resource): State<R>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    resource.destroy(id).await?;
    tracing::info!(entity = R::NAME, id, "entity deleted");
    Ok(StatusCode::NO_CONTENT)
}
