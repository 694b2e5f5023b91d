//! Read-only access to the workflow interaction log in `state.db`.

use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection, OpenFlags};

use crate::Result;

pub const DEFAULT_LOG_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub created_at: Option<String>,
    pub pack_id: Option<String>,
    pub workflow_id: Option<String>,
    pub intent: Option<String>,
    pub status: Option<String>,
    pub message_preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogQuery {
    /// The store file does not exist yet
    NoDatabase,
    /// The store exists but no workflow has written to it
    NoTable,
    Rows(Vec<Interaction>),
}

pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest interactions first, optionally for one pack
    pub fn recent(&self, pack_id: Option<&str>, limit: usize) -> Result<LogQuery> {
        if !self.path.exists() {
            return Ok(LogQuery::NoDatabase);
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'interactions')",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(LogQuery::NoTable);
        }

        let mut sql = String::from(
            "SELECT created_at, pack_id, workflow_id, intent, status, message_preview FROM interactions",
        );
        let mut params: Vec<String> = Vec::new();
        if let Some(pack_id) = pack_id {
            sql.push_str(" WHERE pack_id = ?");
            params.push(pack_id.to_string());
        }
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT {}", limit));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(Interaction {
                    created_at: row.get(0)?,
                    pack_id: row.get(1)?,
                    workflow_id: row.get(2)?,
                    intent: row.get(3)?,
                    status: row.get(4)?,
                    message_preview: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::debug!("Read {} interactions from {}", rows.len(), self.path.display());
        Ok(LogQuery::Rows(rows))
    }
}
