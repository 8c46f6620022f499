/// A row of the `notes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub datetime: String,
    pub note: String,
}

/// The three content columns written together by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFields {
    pub title: String,
    pub datetime: String,
    pub note: String,
}
