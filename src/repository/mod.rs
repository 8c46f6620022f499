#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Row};

use crate::models::{Note, NoteFields};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("database connection is closed")]
    Closed,
}

/// Database access used by the service. Each method runs exactly one
/// parameterized statement against the `notes` table.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError>;

    async fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError>;

    /// Returns the id assigned by the database.
    async fn create_note(&self, fields: NoteFields) -> Result<i64, RepositoryError>;

    /// Returns `false` when no row has the given id.
    async fn update_note(&self, id: i64, fields: NoteFields) -> Result<bool, RepositoryError>;

    /// Returns `false` when no row has the given id.
    async fn delete_note(&self, id: i64) -> Result<bool, RepositoryError>;
}

pub struct Repository {
    client: Client,
    connection: JoinHandle<()>,
}

impl Repository {
    pub async fn new(config: &tokio_postgres::Config) -> Result<Self, tokio_postgres::Error> {
        let (client, con) = config.connect(NoTls).await?;

        let connection = tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("connection error: {}", e);
            }
        });

        Ok(Self { client, connection })
    }

    /// Drops the client and waits for the connection task to wind down.
    pub async fn close(self) {
        drop(self.client);

        if let Err(e) = self.connection.await {
            tracing::error!("connection task failed: {}", e);
        }

        tracing::info!("Database connection closed");
    }

    fn client(&self) -> Result<&Client, RepositoryError> {
        if self.client.is_closed() {
            Err(RepositoryError::Closed)
        } else {
            Ok(&self.client)
        }
    }
}

/// Column types that do not map onto `Note` come back as errors, not panics.
fn note_from_row(row: &Row) -> Result<Note, tokio_postgres::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        datetime: row.try_get("datetime")?,
        note: row.try_get("note")?,
    })
}

#[async_trait]
impl NoteStore for Repository {
    async fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError> {
        let rows = self
            .client()?
            .query("SELECT id, title, datetime, note FROM notes ORDER BY id", &[])
            .await?;

        Ok(rows.iter().map(note_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let row = self
            .client()?
            .query_opt(
                "SELECT id, title, datetime, note FROM notes WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }

    async fn create_note(&self, fields: NoteFields) -> Result<i64, RepositoryError> {
        let row = self
            .client()?
            .query_one(
                "INSERT INTO notes (title, datetime, note) VALUES ($1, $2, $3) RETURNING id",
                &[&fields.title, &fields.datetime, &fields.note],
            )
            .await?;

        Ok(row.try_get("id")?)
    }

    async fn update_note(&self, id: i64, fields: NoteFields) -> Result<bool, RepositoryError> {
        let rows = self
            .client()?
            .execute(
                "UPDATE notes SET title = $1, datetime = $2, note = $3 WHERE id = $4",
                &[&fields.title, &fields.datetime, &fields.note, &id],
            )
            .await?;

        Ok(rows > 0)
    }

    async fn delete_note(&self, id: i64) -> Result<bool, RepositoryError> {
        let rows = self
            .client()?
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await?;

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    // Temporary tables are per session and shadow `public.notes` on this connection.
    async fn connect_with_table(ddl: &str) -> Repository {
        let cfg = Config::from_vars(std::env::vars()).unwrap();
        let repo = Repository::new(&cfg.pg_config()).await.unwrap();
        repo.client.batch_execute(ddl).await.unwrap();
        repo
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL server configured through HOST/USER/PASSWORD/DATABASE"]
    async fn mismatched_column_types_are_errors() {
        let repo = connect_with_table(
            "CREATE TEMPORARY TABLE notes (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                datetime TIMESTAMP NOT NULL,
                note TEXT NOT NULL
            );
            INSERT INTO notes (title, datetime, note) VALUES ('A', '2024-01-01', 'x');",
        )
        .await;

        assert!(matches!(
            repo.get_all_notes().await,
            Err(RepositoryError::Postgres(_))
        ));
        assert!(matches!(
            repo.get_one_note(1).await,
            Err(RepositoryError::Postgres(_))
        ));

        repo.close().await;
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL server configured through HOST/USER/PASSWORD/DATABASE"]
    async fn text_table_round_trips() {
        let repo = connect_with_table(
            "CREATE TEMPORARY TABLE notes (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                datetime TEXT NOT NULL,
                note TEXT NOT NULL
            );",
        )
        .await;

        let fields = NoteFields {
            title: "A".to_string(),
            datetime: "2024-01-01".to_string(),
            note: "x".to_string(),
        };
        let id = repo.create_note(fields.clone()).await.unwrap();
        let note = repo.get_one_note(id).await.unwrap().unwrap();

        assert_eq!(note.title, fields.title);
        assert_eq!(note.datetime, fields.datetime);
        assert_eq!(note.note, fields.note);
        assert!(repo.delete_note(id).await.unwrap());
        assert!(repo.get_one_note(id).await.unwrap().is_none());

        repo.close().await;
    }
}
