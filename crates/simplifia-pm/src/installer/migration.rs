//! Best-effort SQLite migrations shipped inside a pack.
//!
//! Scripts run in declared order, each in isolation. A failing script is
//! recorded and the runner moves on to the next one; nothing is rolled
//! back and nothing is propagated to the caller as an error.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::MigrationError;
use crate::pack::DbConfig;
use crate::util::{is_contained_relative, resolve_template};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    /// Listed in the manifest but absent from the pack
    Missing,
    Failed(MigrationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    pub script: String,
    pub outcome: MigrationOutcome,
}

/// Collected result of one migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Store the scripts ran against; `None` when the block was skipped
    pub database: Option<PathBuf>,
    pub steps: Vec<MigrationStep>,
}

impl MigrationReport {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == MigrationOutcome::Applied)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MigrationError> {
        self.steps.iter().filter_map(|s| match &s.outcome {
            MigrationOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }
}

pub struct MigrationRunner {
    home_dir: PathBuf,
    root_dir: PathBuf,
}

impl MigrationRunner {
    pub fn new(home_dir: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            root_dir: root_dir.into(),
        }
    }

    /// Expand the store path template; relative paths join the workspace root.
    ///
    /// The result must lie under the home directory or the workspace root.
    pub fn resolve_database(&self, db: &DbConfig) -> Result<PathBuf, String> {
        resolve_template(&db.path, &self.home_dir, &self.root_dir)
    }

    /// Apply every listed script found under `pack_root`
    pub fn migrate(&self, pack_root: &Path, db: &DbConfig) -> MigrationReport {
        if !db.is_sqlite() {
            log::warn!(
                "Unsupported database type '{}', skipping migrations",
                db.kind.as_deref().unwrap_or("(none)")
            );
            return MigrationReport::default();
        }

        let database = match self.resolve_database(db) {
            Ok(database) => database,
            Err(message) => {
                log::warn!("Rejecting database path '{}': {}", db.path, message);
                return MigrationReport {
                    database: None,
                    steps: Self::fail_all(db, &message),
                };
            }
        };

        let mut report = MigrationReport {
            database: Some(database.clone()),
            steps: Vec::with_capacity(db.migrations.len()),
        };

        let connection = match Self::open(&database) {
            Ok(conn) => conn,
            Err(message) => {
                log::warn!("Cannot open {}: {}", database.display(), message);
                report.steps = Self::fail_all(db, &message);
                return report;
            }
        };

        for script in &db.migrations {
            let step = Self::apply(&connection, pack_root, script);
            if let MigrationOutcome::Failed(err) = &step.outcome {
                log::warn!("{}", err);
            }
            report.steps.push(step);
        }

        log::info!(
            "Applied {}/{} migrations to {}",
            report.applied(),
            db.migrations.len(),
            database.display()
        );
        report
    }

    fn fail_all(db: &DbConfig, message: &str) -> Vec<MigrationStep> {
        db.migrations
            .iter()
            .map(|script| Self::failed(script, message))
            .collect()
    }

    fn open(database: &Path) -> Result<Connection, String> {
        if let Some(parent) = database.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        Connection::open(database).map_err(|e| e.to_string())
    }

    fn apply(connection: &Connection, pack_root: &Path, script: &str) -> MigrationStep {
        if !is_contained_relative(Path::new(script)) {
            return Self::failed(script, "script path escapes the pack root");
        }

        let path = pack_root.join(script);
        if !path.is_file() {
            log::debug!("Migration {} not present in pack, skipping", script);
            return MigrationStep {
                script: script.to_string(),
                outcome: MigrationOutcome::Missing,
            };
        }

        let sql = match std::fs::read_to_string(&path) {
            Ok(sql) => sql,
            Err(e) => return Self::failed(script, &e.to_string()),
        };

        match connection.execute_batch(&sql) {
            Ok(()) => {
                log::debug!("Applied migration {}", script);
                MigrationStep {
                    script: script.to_string(),
                    outcome: MigrationOutcome::Applied,
                }
            }
            Err(e) => Self::failed(script, &e.to_string()),
        }
    }

    fn failed(script: &str, message: &str) -> MigrationStep {
        MigrationStep {
            script: script.to_string(),
            outcome: MigrationOutcome::Failed(MigrationError {
                script: script.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db_config(path: &str, migrations: &[&str]) -> DbConfig {
        DbConfig {
            kind: Some("sqlite".to_string()),
            path: path.to_string(),
            migrations: migrations.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn setup() -> (TempDir, MigrationRunner, PathBuf) {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let pack = dir.path().join("pack");
        std::fs::create_dir_all(pack.join("db")).unwrap();
        let runner = MigrationRunner::new(&home, home.join(".simplifia"));
        (dir, runner, pack)
    }

    #[test]
    fn test_failures_do_not_stop_later_scripts() {
        let (dir, runner, pack) = setup();
        std::fs::write(pack.join("db/001.sql"), "CREATE TABLE leads (id INTEGER PRIMARY KEY);").unwrap();
        std::fs::write(pack.join("db/002.sql"), "THIS IS NOT SQL;").unwrap();
        std::fs::write(pack.join("db/003.sql"), "CREATE TABLE notes (body TEXT);").unwrap();

        let report = runner.migrate(
            &pack,
            &db_config("~/.simplifia/crm.db", &["db/001.sql", "db/002.sql", "db/missing.sql", "db/003.sql"]),
        );

        let outcomes: Vec<_> = report.steps.iter().map(|s| &s.outcome).collect();
        assert_eq!(outcomes[0], &MigrationOutcome::Applied);
        assert!(matches!(outcomes[1], MigrationOutcome::Failed(e) if e.script == "db/002.sql"));
        assert_eq!(outcomes[2], &MigrationOutcome::Missing);
        assert_eq!(outcomes[3], &MigrationOutcome::Applied);
        assert_eq!(report.applied(), 2);
        assert_eq!(report.failures().count(), 1);

        let database = dir.path().join("home/.simplifia/crm.db");
        assert_eq!(report.database.as_deref(), Some(database.as_path()));

        let conn = Connection::open(&database).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('leads', 'notes')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_escaping_script_is_failure() {
        let (dir, runner, pack) = setup();
        std::fs::write(dir.path().join("outside.sql"), "CREATE TABLE x (a);").unwrap();

        let report = runner.migrate(&pack, &db_config("state.db", &["../outside.sql"]));
        assert!(matches!(report.steps[0].outcome, MigrationOutcome::Failed(_)));
        assert_eq!(report.applied(), 0);
    }

    #[test]
    fn test_relative_database_joins_root() {
        let (dir, runner, _pack) = setup();
        let path = runner.resolve_database(&db_config("data/crm.db", &[])).unwrap();
        assert_eq!(path, dir.path().join("home/.simplifia/data/crm.db"));
    }

    #[test]
    fn test_non_sqlite_is_skipped() {
        let (_dir, runner, pack) = setup();
        let mut db = db_config("~/x.db", &["db/001.sql"]);
        db.kind = Some("postgres".to_string());

        let report = runner.migrate(&pack, &db);
        assert!(report.database.is_none());
        assert!(report.steps.is_empty());
    }

    #[test]
    fn test_untyped_block_is_skipped() {
        let (dir, runner, pack) = setup();
        std::fs::write(pack.join("db/001.sql"), "CREATE TABLE leads (id INTEGER);").unwrap();

        let db: DbConfig =
            serde_json::from_str(r#"{"path": "x.db", "migrations": ["db/001.sql"]}"#).unwrap();
        let report = runner.migrate(&pack, &db);

        assert_eq!(report, MigrationReport::default());
        assert!(!dir.path().join("home/.simplifia/x.db").exists());
    }

    #[test]
    fn test_database_outside_workspace_is_rejected() {
        let (dir, runner, pack) = setup();
        std::fs::write(pack.join("db/001.sql"), "CREATE TABLE leads (id INTEGER);").unwrap();
        let outside = dir.path().join("elsewhere/outside.db");

        let report = runner.migrate(
            &pack,
            &db_config(outside.to_str().unwrap(), &["db/001.sql"]),
        );

        assert!(report.database.is_none());
        assert_eq!(report.applied(), 0);
        assert!(matches!(report.steps[0].outcome, MigrationOutcome::Failed(_)));
        assert!(!outside.exists());
        assert!(runner.resolve_database(&db_config("~/../../x.db", &[])).is_err());
    }
}
