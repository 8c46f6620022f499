use async_trait::async_trait;

use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use super::{NoteStore, RepositoryError};
use crate::models::{Note, NoteFields};

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Note>,
    last_id: i64,
}

/// In-memory stand-in for the `notes` table with auto-increment ids that
/// are never handed out twice.
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
    failing: AtomicBool,
    statements: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following statement fail as a closed connection would.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Number of statements issued so far, failed ones included.
    pub fn statements(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    pub fn row(&self, id: i64) -> Option<Note> {
        self.table.lock().unwrap().rows.get(&id).cloned()
    }

    fn begin(&self) -> Result<(), RepositoryError> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError> {
        self.begin()?;
        Ok(self.table.lock().unwrap().rows.values().cloned().collect())
    }

    async fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        self.begin()?;
        Ok(self.row(id))
    }

    async fn create_note(&self, fields: NoteFields) -> Result<i64, RepositoryError> {
        self.begin()?;
        let mut table = self.table.lock().unwrap();
        table.last_id += 1;
        let id = table.last_id;
        table.rows.insert(
            id,
            Note {
                id,
                title: fields.title,
                datetime: fields.datetime,
                note: fields.note,
            },
        );
        Ok(id)
    }

    async fn update_note(&self, id: i64, fields: NoteFields) -> Result<bool, RepositoryError> {
        self.begin()?;
        let mut table = self.table.lock().unwrap();
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(false);
        };
        row.title = fields.title;
        row.datetime = fields.datetime;
        row.note = fields.note;
        Ok(true)
    }

    async fn delete_note(&self, id: i64) -> Result<bool, RepositoryError> {
        self.begin()?;
        Ok(self.table.lock().unwrap().rows.remove(&id).is_some())
    }
}
