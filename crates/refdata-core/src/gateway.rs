//! Query gateway: table listing, paginated reads, and SQL execution.
//!
//! All engine access goes through this module. Every call opens its own
//! connection to the target file and closes it on all exit paths; nothing
//! is pooled or cached across calls.
//!
//! Caller-supplied SQL is executed as-is. The keyword-uppercased,
//! reindented copy attached to responses is display-only and never reaches
//! the engine, so a formatting quirk can never change statement semantics.
//! Caller-supplied *table names* are never spliced into query text until
//! they have been checked against the file's own `sqlite_master` catalog.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params};
use serde_json::Value;

use crate::error::{Error, Result};

/// Default page size for table reads.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Upper bound on rows returned by `execute` for a read statement.
const MAX_RESULT_ROWS: usize = 10_000;

/// Outcome of executing caller-supplied SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// A read statement's columns and rows.
    Rows {
        /// Column names in result order.
        columns: Vec<String>,
        /// Row values, one inner vector per row.
        rows: Vec<Vec<Value>>,
    },
    /// A write or DDL statement committed successfully.
    Ack {
        /// Human-readable acknowledgement.
        message: String,
    },
    /// The engine reported an error; the transaction was rolled back.
    Failure {
        /// The engine's error message, verbatim.
        message: String,
    },
}

/// One page of a table read.
#[derive(Debug, Clone)]
pub struct TablePage {
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Row values for this page.
    pub rows: Vec<Vec<Value>>,
    /// Total row count of the table.
    pub total: u64,
    /// The 1-based page number that was read.
    pub page: u32,
    /// The page size that was applied.
    pub page_size: u32,
    /// Display-formatted SELECT used for this page.
    pub formatted_sql: String,
}

/// Stateless facade over the embedded engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryGateway;

impl QueryGateway {
    /// Creates a gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Lists the tables in a data file, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file does not exist, and
    /// [`Error::Storage`] when the engine cannot read it.
    pub fn list_tables(&self, path: &Path) -> Result<Vec<String>> {
        let conn = open_existing(path)?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )
            .map_err(engine_read_error)?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(engine_read_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(engine_read_error)?;
        Ok(tables)
    }

    /// Reads one page of a named table.
    ///
    /// `page` is 1-based; a `page_size` of `None` applies
    /// [`DEFAULT_PAGE_SIZE`]. The name is validated against the file's own
    /// table catalog before any query text is built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file or table does not exist,
    /// [`Error::InvalidInput`] for a zero or oversized page parameter, and
    /// [`Error::Storage`] when the engine fails.
    pub fn read_table(
        &self,
        path: &Path,
        table: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<TablePage> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err(Error::InvalidInput("page must be at least 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidInput(format!(
                "per_page must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let conn = open_existing(path)?;
        if !table_exists(&conn, table)? {
            return Err(Error::NotFound(format!("table not found: {table}")));
        }

        let offset = u64::from(page - 1) * u64::from(page_size);
        let select = format!("SELECT * FROM \"{table}\" LIMIT ?1 OFFSET ?2");
        let mut stmt = conn.prepare(&select).map_err(engine_read_error)?;
        let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows = Vec::new();
        let mut raw = stmt
            .query(params![page_size, offset])
            .map_err(engine_read_error)?;
        while let Some(row) = raw.next().map_err(engine_read_error)? {
            rows.push(row_values(row, columns.len())?);
        }

        let total: u64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                row.get(0)
            })
            .map_err(engine_read_error)?;

        Ok(TablePage {
            columns,
            rows,
            total,
            page,
            page_size,
            formatted_sql: format_for_display(&format!(
                "SELECT * FROM \"{table}\" LIMIT {page_size} OFFSET {offset}"
            )),
        })
    }

    /// Executes caller-supplied SQL against a data file.
    ///
    /// Statements whose trimmed text starts with `SELECT`
    /// (case-insensitive) are read as [`QueryResult::Rows`], capped at
    /// 10 000 rows. Anything else runs inside an explicit transaction and
    /// acknowledges with [`QueryResult::Ack`] after committing. Engine
    /// errors roll the transaction back and surface as
    /// [`QueryResult::Failure`]; they are never raised out of this method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file does not exist and
    /// [`Error::InvalidInput`] for empty SQL. Engine-reported execution
    /// errors are carried inside the returned [`QueryResult::Failure`].
    pub fn execute(&self, path: &Path, sql: &str) -> Result<QueryResult> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("sql cannot be empty".to_string()));
        }

        let mut conn = open_existing(path)?;
        if is_read_statement(trimmed) {
            return Ok(run_read(&conn, trimmed));
        }
        Ok(run_write(&mut conn, trimmed))
    }
}

/// Formats SQL for display: uppercased keywords, two-space reindent.
///
/// Applied to a copy only; the executed text is always the caller's
/// original.
#[must_use]
pub fn format_for_display(sql: &str) -> String {
    sqlformat::format(
        sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions {
            indent: sqlformat::Indent::Spaces(2),
            uppercase: true,
            lines_between_queries: 1,
        },
    )
}

fn is_read_statement(sql: &str) -> bool {
    sql.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
}

fn run_read(conn: &Connection, sql: &str) -> QueryResult {
    match read_rows(conn, sql) {
        Ok((columns, rows)) => QueryResult::Rows { columns, rows },
        Err(message) => QueryResult::Failure { message },
    }
}

fn read_rows(
    conn: &Connection,
    sql: &str,
) -> std::result::Result<(Vec<String>, Vec<Vec<Value>>), String> {
    let mut stmt = conn.prepare(sql).map_err(|err| err.to_string())?;
    let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

    let mut rows = Vec::new();
    let mut raw = stmt.query([]).map_err(|err| err.to_string())?;
    while let Some(row) = raw.next().map_err(|err| err.to_string())? {
        if rows.len() >= MAX_RESULT_ROWS {
            break;
        }
        rows.push(row_values(row, columns.len()).map_err(|err| err.to_string())?);
    }
    Ok((columns, rows))
}

fn run_write(conn: &mut Connection, sql: &str) -> QueryResult {
    let tx = match conn.transaction() {
        Ok(tx) => tx,
        Err(err) => {
            return QueryResult::Failure {
                message: err.to_string(),
            };
        }
    };
    match tx.execute(sql, []) {
        Ok(affected) => match tx.commit() {
            Ok(()) => QueryResult::Ack {
                message: format!("statement executed; {affected} row(s) affected"),
            },
            Err(err) => QueryResult::Failure {
                message: err.to_string(),
            },
        },
        // Dropping the transaction rolls it back.
        Err(err) => QueryResult::Failure {
            message: err.to_string(),
        },
    }
}

/// Converts one engine row into JSON values.
fn row_values(row: &rusqlite::Row<'_>, column_count: usize) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value = row.get_ref(index).map_err(engine_read_error)?;
        values.push(json_value(value));
    }
    Ok(values)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) | ValueRef::Blob(text) => {
            Value::String(String::from_utf8_lossy(text).into_owned())
        }
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |_| Ok(()),
    )
    .map(|()| true)
    .or_else(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => Ok(false),
        other => Err(engine_read_error(other)),
    })
}

/// Opens an existing data file read-write, without creating it.
fn open_existing(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(Error::NotFound(format!(
            "data file not found: {}",
            path.display()
        )));
    }
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|err| Error::storage_with_source(format!("failed to open {}", path.display()), err))
}

fn engine_read_error(err: rusqlite::Error) -> Error {
    Error::storage_with_source("engine read failed", err)
}
