//! REST endpoints shared by every record collection.
//!
//! The handlers are generic over the [`Record`] shape. Each entity gets a thin
//! module of concrete wrappers so the OpenAPI document can describe it.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::{
    dao::models::{Filter, Highscore, Player, Record, Track},
    dto::{links::Decorated, payload::parse_payload},
    error::{AppError, ErrorBody, ServiceError},
    services::record_service::RecordService,
    state::{AppState, SharedState},
};

/// Public path of the collection endpoint of `R`, including the configured prefix.
pub fn collection_url<R: Record>(state: &AppState) -> String {
    format!("{}/{}", state.resource_prefix(), R::RESOURCE)
}

fn not_found<R: Record>() -> ServiceError {
    ServiceError::NotFound(format!("{} not found", R::LABEL))
}

/// Search with the query string as exact-match filter.
pub async fn list<R: Record>(
    State(state): State<SharedState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Decorated<R>>>, AppError> {
    let service = RecordService::<R>::from_state(&state).await?;
    let records = service.search(query.into_iter().collect::<Filter>()).await?;
    let url = collection_url::<R>(&state);
    Ok(Json(
        records
            .into_iter()
            .map(|stored| Decorated::new(stored, &url))
            .collect(),
    ))
}

/// Create a record from the (optional) JSON body.
pub async fn create<R: Record>(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload = parse_payload(&body)?;
    let service = RecordService::<R>::from_state(&state).await?;
    let stored = service.create(payload.as_ref()).await?;

    let decorated = Decorated::new(stored, &collection_url::<R>(&state));
    let location = decorated.links.read.url.clone();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(decorated),
    ))
}

/// Fetch one record.
pub async fn read<R: Record>(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Decorated<R>>, AppError> {
    let service = RecordService::<R>::from_state(&state).await?;
    let stored = service.read(&id).await?.ok_or_else(not_found::<R>)?;
    Ok(Json(Decorated::new(stored, &collection_url::<R>(&state))))
}

/// Patch the truthy fields of the JSON body into a record (PUT and PATCH alike).
pub async fn update<R: Record>(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Decorated<R>>), AppError> {
    let payload = parse_payload(&body)?;
    let service = RecordService::<R>::from_state(&state).await?;
    let stored = service
        .update(&id, payload.as_ref())
        .await?
        .ok_or_else(not_found::<R>)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(Decorated::new(stored, &collection_url::<R>(&state))),
    ))
}

/// Remove a record; absent records are not an error.
pub async fn remove<R: Record>(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let service = RecordService::<R>::from_state(&state).await?;
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Declare the documented per-entity handlers and their router.
macro_rules! record_resource {
    ($module:ident, $record:ident, $tag:tt, $collection:tt, $entity:tt) => {
        #[doc = concat!("Endpoints of the `", $tag, "` collection.")]
        pub mod $module {
            use super::*;

            /// Routes of this collection, relative to the API prefix.
            pub fn router() -> Router<SharedState> {
                Router::new()
                    .route($collection, get(list).post(create))
                    .route(
                        $entity,
                        get(read).put(replace).patch(patch).delete(remove),
                    )
            }

            #[utoipa::path(
                get,
                path = $collection,
                tag = $tag,
                operation_id = concat!("list_", $tag),
                responses(
                    (status = 200, description = "Matching records in sort order", body = [Decorated<$record>]),
                    (status = 503, description = "Storage unavailable", body = ErrorBody)
                )
            )]
            /// List the records matching the query string (`?field=value&...`, exact match).
            pub async fn list(
                state: State<SharedState>,
                query: Query<Vec<(String, String)>>,
            ) -> Result<Json<Vec<Decorated<$record>>>, AppError> {
                super::list::<$record>(state, query).await
            }

            #[utoipa::path(
                post,
                path = $collection,
                tag = $tag,
                operation_id = concat!("create_", $tag),
                request_body(content = $record, description = "Omitted or empty fields default to \"\""),
                responses(
                    (status = 201, description = "Record created", body = Decorated<$record>,
                        headers(("Location" = String, description = "URL of the new record"))),
                    (status = 400, description = "Body is not a JSON object", body = ErrorBody),
                    (status = 422, description = "Unknown referenced record (enforced reference policy only)", body = ErrorBody)
                )
            )]
            /// Create a record.
            pub async fn create(
                state: State<SharedState>,
                body: Bytes,
            ) -> Result<impl IntoResponse, AppError> {
                super::create::<$record>(state, body).await
            }

            #[utoipa::path(
                get,
                path = $entity,
                tag = $tag,
                operation_id = concat!("read_", $tag),
                params(("id" = String, Path, description = "Record identifier")),
                responses(
                    (status = 200, description = "Record found", body = Decorated<$record>),
                    (status = 404, description = "Record not found", body = ErrorBody)
                )
            )]
            /// Fetch a record by id.
            pub async fn read(
                state: State<SharedState>,
                id: Path<String>,
            ) -> Result<Json<Decorated<$record>>, AppError> {
                super::read::<$record>(state, id).await
            }

            #[utoipa::path(
                put,
                path = $entity,
                tag = $tag,
                operation_id = concat!("replace_", $tag),
                params(("id" = String, Path, description = "Record identifier")),
                request_body(content = $record, description = "Only non-empty fields are applied"),
                responses(
                    (status = 202, description = "Record updated", body = Decorated<$record>),
                    (status = 404, description = "Record not found", body = ErrorBody),
                    (status = 422, description = "Unknown referenced record (enforced reference policy only)", body = ErrorBody)
                )
            )]
            /// Update a record.
            pub async fn replace(
                state: State<SharedState>,
                id: Path<String>,
                body: Bytes,
            ) -> Result<(StatusCode, Json<Decorated<$record>>), AppError> {
                super::update::<$record>(state, id, body).await
            }

            #[utoipa::path(
                patch,
                path = $entity,
                tag = $tag,
                operation_id = concat!("patch_", $tag),
                params(("id" = String, Path, description = "Record identifier")),
                request_body(content = $record, description = "Only non-empty fields are applied"),
                responses(
                    (status = 202, description = "Record updated", body = Decorated<$record>),
                    (status = 404, description = "Record not found", body = ErrorBody),
                    (status = 422, description = "Unknown referenced record (enforced reference policy only)", body = ErrorBody)
                )
            )]
            /// Update a record (same semantics as PUT).
            pub async fn patch(
                state: State<SharedState>,
                id: Path<String>,
                body: Bytes,
            ) -> Result<(StatusCode, Json<Decorated<$record>>), AppError> {
                super::update::<$record>(state, id, body).await
            }

            #[utoipa::path(
                delete,
                path = $entity,
                tag = $tag,
                operation_id = concat!("delete_", $tag),
                params(("id" = String, Path, description = "Record identifier")),
                responses(
                    (status = 204, description = "Record removed or never existed"),
                    (status = 404, description = "Malformed identifier", body = ErrorBody)
                )
            )]
            /// Delete a record.
            pub async fn remove(
                state: State<SharedState>,
                id: Path<String>,
            ) -> Result<StatusCode, AppError> {
                super::remove::<$record>(state, id).await
            }
        }
    };
}

record_resource!(player, Player, "player", "/player", "/player/{id}");
record_resource!(track, Track, "track", "/track", "/track/{id}");
record_resource!(highscore, Highscore, "highscore", "/highscore", "/highscore/{id}");

/// Every record collection.
pub fn router() -> Router<SharedState> {
    player::router()
        .merge(track::router())
        .merge(highscore::router())
}
