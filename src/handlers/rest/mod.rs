
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_macros::debug_handler;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{ErrorResponse, MessageResponse, NoteCreatedResponse, NoteRequest, NoteResponse},
    service::{NoteService, ServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(get_all_notes, get_one_note, create_note, update_note, delete_note),
    components(schemas(
        NoteResponse,
        NoteRequest,
        NoteCreatedResponse,
        MessageResponse,
        ErrorResponse
    )),
    tags(
        (name = "notes", description = "Notes management API")
    )
)]
pub struct ApiDoc;

pub fn router(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/api/notes", get(get_all_notes).post(create_note))
        .route(
            "/api/notes/{id}",
            get(get_one_note).put(update_note).delete(delete_note),
        )
        .route("/api-doc/openapi.json", get(openapi))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingFields => error(StatusCode::BAD_REQUEST, "All fields are required"),
            Self::NotFound => error(StatusCode::NOT_FOUND, "Note not found"),
            Self::Database(e) => {
                tracing::error!("database error: {}", e);
                error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
        }
    }
}

fn invalid_body(reason: &str) -> Response {
    tracing::debug!("rejected request body: {}", reason);
    error(StatusCode::BAD_REQUEST, "Invalid request body")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| {
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}

/// Only a body that claims to be JSON and fails to parse as an object or
/// array is rejected. Non-JSON, empty and array bodies carry no fields and
/// fall through to field validation.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<NoteRequest, Response> {
    if !is_json(headers) || body.trim_ascii().is_empty() {
        return Ok(NoteRequest::default());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|e| invalid_body(&e.to_string()))
        }
        Ok(Value::Array(_)) => Ok(NoteRequest::default()),
        Ok(_) => Err(invalid_body("top-level value is not an object")),
        Err(e) => Err(invalid_body(&e.to_string())),
    }
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, description = "List of all notes", body = Vec<NoteResponse>),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<NoteService>>) -> Response {
    match service.get_all_notes().await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.get_one_note(&id).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteCreatedResponse),
        (status = 400, description = "A required field is missing", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match parse_body(&headers, &body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match service.create_note(payload).await {
        Ok(note_id) => {
            tracing::info!("created note {}", note_id);
            (
                StatusCode::CREATED,
                Json(NoteCreatedResponse {
                    message: "Note added successfully".to_string(),
                    note_id,
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Note updated", body = MessageResponse),
        (status = 400, description = "A required field is missing", body = ErrorResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match parse_body(&headers, &body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match service.update_note(&id, payload).await {
        Ok(()) => message(StatusCode::OK, "Note updated successfully"),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.delete_note(&id).await {
        Ok(()) => message(StatusCode::OK, "Note deleted successfully"),
        Err(e) => e.into_response(),
    }
}
