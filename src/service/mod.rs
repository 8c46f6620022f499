use crate::{
    dto::{NoteRequest, NoteResponse},
    models::NoteFields,
    repository::{NoteStore, RepositoryError},
};

use serde_json::Value;

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("all fields are required")]
    MissingFields,

    #[error("note not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

/// Absent, `null`, `false`, zero and `""` count as missing. Anything else is
/// kept as text: strings as-is, other values in their JSON form.
fn required(field: Option<Value>) -> Option<String> {
    match field? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl TryFrom<NoteRequest> for NoteFields {
    type Error = ServiceError;

    fn try_from(request: NoteRequest) -> Result<Self, Self::Error> {
        match (
            required(request.title),
            required(request.datetime),
            required(request.note),
        ) {
            (Some(title), Some(datetime), Some(note)) => Ok(Self {
                title,
                datetime,
                note,
            }),
            _ => Err(ServiceError::MissingFields),
        }
    }
}

/// Ids come straight from the path. One that is not an integer cannot match
/// a row, so it is reported the same way as an unknown id.
fn parse_id(id: &str) -> Result<i64, ServiceError> {
    id.parse().map_err(|_| ServiceError::NotFound)
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub async fn get_all_notes(&self) -> Result<Vec<NoteResponse>, ServiceError> {
        let notes = self.store.get_all_notes().await?;
        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }

    pub async fn get_one_note(&self, id: &str) -> Result<NoteResponse, ServiceError> {
        let id = parse_id(id)?;
        self.store
            .get_one_note(id)
            .await?
            .map(NoteResponse::from)
            .ok_or(ServiceError::NotFound)
    }

    pub async fn create_note(&self, request: NoteRequest) -> Result<i64, ServiceError> {
        let fields = NoteFields::try_from(request)?;
        Ok(self.store.create_note(fields).await?)
    }

    pub async fn update_note(&self, id: &str, request: NoteRequest) -> Result<(), ServiceError> {
        let fields = NoteFields::try_from(request)?;
        let id = parse_id(id)?;
        if self.store.update_note(id, fields).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        if self.store.delete_note(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }
}
