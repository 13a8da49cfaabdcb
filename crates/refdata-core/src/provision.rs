//! Lazy provisioning of date-partitioned data files.
//!
//! Every requested date yields a usable data file: the first access to a
//! date creates the file, defines the demo schema, and seeds it with
//! synthetic rows. Subsequent accesses find the populated file and return
//! it untouched (check-existing policy: the file is skipped when it already
//! contains the `users` table).
//!
//! Seeding runs inside a single transaction, so a torn provisioning attempt
//! leaves either a fully seeded file or one with no rows at all; the latter
//! is re-seeded on the next access. Concurrent first accesses to the same
//! date are serialized with a per-path lock so the check-then-provision
//! sequence cannot interleave.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rand::Rng;
use rusqlite::{Connection, params};

use crate::date::CalendarDate;
use crate::error::{Error, Result};
use crate::layout::StoreLayout;

/// Number of synthetic users seeded into a fresh file.
const USER_COUNT: usize = 25;

/// Maximum number of orders seeded per user (uniform in `1..=MAX`).
const MAX_ORDERS_PER_USER: usize = 5;

/// Order statuses the fixture draws from.
const ORDER_STATUSES: [&str; 5] = ["pending", "completed", "cancelled", "shipped", "delivered"];

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    amount REAL NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

/// Creates data files on demand and seeds them with the demo fixture.
#[derive(Debug)]
pub struct Provisioner {
    layout: StoreLayout,
    /// Per-path locks serializing the check-then-provision sequence.
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Provisioner {
    /// Creates a provisioner over the given layout.
    #[must_use]
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the layout this provisioner writes through.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Resolves the data file for a date, creating and seeding it if absent.
    ///
    /// Idempotent: a file that already contains the `users` table is
    /// returned unchanged, so calling this twice leaves row counts intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when directory creation, file creation,
    /// or fixture seeding fails.
    pub fn ensure(&self, date: &CalendarDate) -> Result<PathBuf> {
        let path = self.layout.resolve(date);
        let lock = self.path_lock(&path);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if is_provisioned(&path)? {
            return Ok(path);
        }

        let parent = path.parent().ok_or_else(|| {
            Error::storage(format!("data file path has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent).map_err(|err| {
            Error::storage_with_source(
                format!("failed to create partition directory {}", parent.display()),
                err,
            )
        })?;

        let mut conn = open_for_write(&path)?;
        seed_fixture(&mut conn)?;
        tracing::info!(date = %date, path = %path.display(), "Provisioned data file");
        Ok(path)
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}

/// Checks whether the file exists and already carries the demo schema.
///
/// A zero-byte or schema-less file (for example, left behind by a crashed
/// earlier attempt) counts as unprovisioned and is seeded again.
fn is_provisioned(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let conn = open_for_write(path)?;
    let has_users = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'users'",
            [],
            |_| Ok(()),
        )
        .map(|()| true)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(Error::storage_with_source(
                format!("failed to inspect {}", path.display()),
                other,
            )),
        })?;
    Ok(has_users)
}

fn open_for_write(path: &Path) -> Result<Connection> {
    Connection::open(path).map_err(|err| {
        Error::storage_with_source(format!("failed to open {}", path.display()), err)
    })
}

/// Creates the demo schema and inserts the synthetic rows, atomically.
fn seed_fixture(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|err| Error::storage_with_source("failed to begin seeding transaction", err))?;

    tx.execute_batch(SCHEMA_SQL)
        .map_err(|err| Error::storage_with_source("failed to create demo schema", err))?;

    let mut rng = rand::thread_rng();
    for index in 1..=USER_COUNT {
        // Emails derive from the index, so natural keys never collide.
        tx.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![format!("User {index:02}"), format!("user{index:03}@example.com")],
        )
        .map_err(|err| Error::storage_with_source("failed to seed users", err))?;
        let user_id = tx.last_insert_rowid();

        let order_count = rng.gen_range(1..=MAX_ORDERS_PER_USER);
        for _ in 0..order_count {
            let amount = f64::from(rng.gen_range(500..50_000)) / 100.0;
            let status = ORDER_STATUSES[rng.gen_range(0..ORDER_STATUSES.len())];
            tx.execute(
                "INSERT INTO orders (user_id, amount, status) VALUES (?1, ?2, ?3)",
                params![user_id, amount, status],
            )
            .map_err(|err| Error::storage_with_source("failed to seed orders", err))?;
        }
    }

    tx.commit()
        .map_err(|err| Error::storage_with_source("failed to commit seeding transaction", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provisioner() -> (tempfile::TempDir, Provisioner) {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = StoreLayout::new(dir.path());
        (dir, Provisioner::new(layout))
    }

    fn row_count(path: &Path, table: &str) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_ensure_creates_and_seeds() {
        let (_dir, provisioner) = provisioner();
        let date = CalendarDate::new(2024, 1, 15).unwrap();
        let path = provisioner.ensure(&date).unwrap();

        assert!(path.is_file());
        assert_eq!(row_count(&path, "users"), USER_COUNT as i64);
        let orders = row_count(&path, "orders");
        assert!(orders >= USER_COUNT as i64);
        assert!(orders <= (USER_COUNT * MAX_ORDERS_PER_USER) as i64);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let (_dir, provisioner) = provisioner();
        let date = CalendarDate::new(2024, 1, 15).unwrap();

        let path = provisioner.ensure(&date).unwrap();
        let users_before = row_count(&path, "users");
        let orders_before = row_count(&path, "orders");

        let again = provisioner.ensure(&date).unwrap();
        assert_eq!(path, again);
        assert_eq!(row_count(&path, "users"), users_before);
        assert_eq!(row_count(&path, "orders"), orders_before);
    }

    #[test]
    fn test_ensure_reseeds_schemaless_file() {
        let (_dir, provisioner) = provisioner();
        let date = CalendarDate::new(2024, 1, 15).unwrap();
        let path = provisioner.layout().resolve(&date);

        // Simulate a crashed earlier attempt: the file exists but holds
        // no schema.
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();

        provisioner.ensure(&date).unwrap();
        assert_eq!(row_count(&path, "users"), USER_COUNT as i64);
    }

    #[test]
    fn test_order_statuses_come_from_fixture_set() {
        let (_dir, provisioner) = provisioner();
        let date = CalendarDate::new(2024, 1, 15).unwrap();
        let path = provisioner.ensure(&date).unwrap();

        let conn = Connection::open(&path).unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT status FROM orders").unwrap();
        let statuses: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|status| status.unwrap())
            .collect();
        assert!(!statuses.is_empty());
        for status in statuses {
            assert!(ORDER_STATUSES.contains(&status.as_str()), "{status}");
        }
    }

    #[test]
    fn test_concurrent_first_access_seeds_once() {
        let (_dir, provisioner) = provisioner();
        let provisioner = Arc::new(provisioner);
        let date = CalendarDate::new(2024, 1, 15).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let provisioner = Arc::clone(&provisioner);
                std::thread::spawn(move || provisioner.ensure(&date).unwrap())
            })
            .collect();
        let paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(paths.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(row_count(&paths[0], "users"), USER_COUNT as i64);
    }
}
