//! SQLite loader for the disaster message corpus.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use thiserror::Error;
use tracing::{info, warn};

/// Table read when no other table is configured.
pub const DEFAULT_TABLE: &str = "messages";

/// Non-label columns of the corpus table.
pub const ID_COLUMN: &str = "id";
pub const MESSAGE_COLUMN: &str = "message";
pub const ORIGINAL_COLUMN: &str = "original";
pub const GENRE_COLUMN: &str = "genre";

const METADATA_COLUMNS: [&str; 4] = [ID_COLUMN, MESSAGE_COLUMN, ORIGINAL_COLUMN, GENRE_COLUMN];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("table {table} not found")]
    MissingTable { table: String },
    #[error("table {table} has no {column} column")]
    MissingColumn { table: String, column: String },
    #[error("table {table} has no category columns")]
    NoCategories { table: String },
    #[error("row {row} has no message text")]
    MissingMessage { row: usize },
    #[error("row {row} has a non-binary value in category {column}")]
    InvalidLabel { row: usize, column: String },
    #[error("label matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Messages with their metadata and category flags, in table order.
#[derive(Debug, Clone)]
pub struct MessageCorpus {
    pub ids: Vec<i64>,
    pub messages: Vec<String>,
    pub originals: Vec<Option<String>>,
    pub genres: Vec<Option<String>>,
    /// Category names in label column order.
    pub categories: Vec<String>,
    /// `messages.len() x categories.len()` matrix of 0/1 flags.
    pub labels: Array2<u8>,
}

impl MessageCorpus {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// BLAKE3 hex digest over categories, messages and labels.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in &self.categories {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }
        for (message, labels) in self.messages.iter().zip(self.labels.rows()) {
            hasher.update(message.as_bytes());
            hasher.update(&[0]);
            for &label in labels {
                hasher.update(&[label]);
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Split into the message texts, label matrix and category names.
    pub fn into_parts(self) -> (Vec<String>, Array2<u8>, Vec<String>) {
        (self.messages, self.labels, self.categories)
    }
}

/// Read message texts, the label matrix and category names from the
/// `messages` table.
pub fn load_data(path: &Path) -> Result<(Vec<String>, Array2<u8>, Vec<String>), LoadError> {
    Ok(load_corpus(path, DEFAULT_TABLE)?.into_parts())
}

/// Read the full corpus from `table`.
///
/// Category columns are every column other than `id`, `message`,
/// `original` and `genre`, in table order. Nonzero integer flags count as
/// positive.
pub fn load_corpus(path: &Path, table: &str) -> Result<MessageCorpus, LoadError> {
    let conn = open_read_only(path)?;
    if !table_exists(&conn, table)? {
        return Err(LoadError::MissingTable {
            table: table.to_string(),
        });
    }
    let columns = table_columns(&conn, table)?;
    if !columns.iter().any(|name| name == MESSAGE_COLUMN) {
        return Err(LoadError::MissingColumn {
            table: table.to_string(),
            column: MESSAGE_COLUMN.to_string(),
        });
    }
    let categories: Vec<String> = columns
        .iter()
        .filter(|name| !METADATA_COLUMNS.contains(&name.as_str()))
        .cloned()
        .collect();
    if categories.is_empty() {
        return Err(LoadError::NoCategories {
            table: table.to_string(),
        });
    }
    let has_column = |column: &str| columns.iter().any(|name| name == column);
    let optional_text = |column: &str| {
        if has_column(column) {
            quote_identifier(column)
        } else {
            "NULL".to_string()
        }
    };
    let id_expr = if has_column(ID_COLUMN) {
        quote_identifier(ID_COLUMN)
    } else {
        "rowid".to_string()
    };
    let mut select = vec![
        id_expr,
        quote_identifier(MESSAGE_COLUMN),
        optional_text(ORIGINAL_COLUMN),
        optional_text(GENRE_COLUMN),
    ];
    select.extend(categories.iter().map(|name| quote_identifier(name)));
    let sql = format!(
        "SELECT {} FROM {}",
        select.join(", "),
        quote_identifier(table)
    );

    let mut ids = Vec::new();
    let mut messages = Vec::new();
    let mut originals = Vec::new();
    let mut genres = Vec::new();
    let mut flat_labels = Vec::new();
    let mut binarized = 0usize;
    {
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut row_idx = 0usize;
        while let Some(row) = rows.next()? {
            ids.push(integer_id(row.get_ref(0)?).unwrap_or(row_idx as i64));
            let message = text_value(row.get_ref(1)?);
            messages.push(message.ok_or(LoadError::MissingMessage { row: row_idx })?);
            originals.push(text_value(row.get_ref(2)?));
            genres.push(text_value(row.get_ref(3)?));
            for (offset, name) in categories.iter().enumerate() {
                let flag = label_flag(row.get_ref(4 + offset)?).ok_or_else(|| {
                    LoadError::InvalidLabel {
                        row: row_idx,
                        column: name.clone(),
                    }
                })?;
                if flag > 1 {
                    binarized += 1;
                }
                flat_labels.push(u8::from(flag != 0));
            }
            row_idx += 1;
        }
    }
    drop(conn);

    if binarized > 0 {
        warn!(binarized, "Binarized label values greater than 1 to 1");
    }
    let labels = Array2::from_shape_vec((messages.len(), categories.len()), flat_labels)?;
    info!(
        path = %path.display(),
        table,
        messages = messages.len(),
        categories = categories.len(),
        "Loaded message corpus"
    );
    Ok(MessageCorpus {
        ids,
        messages,
        originals,
        genres,
        categories,
        labels,
    })
}

fn open_read_only(path: &Path) -> Result<Connection, LoadError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Integer id, parsing numeric text; `None` for anything else.
fn integer_id(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(value) => Some(value),
        ValueRef::Text(text) => std::str::from_utf8(text).ok()?.trim().parse().ok(),
        _ => None,
    }
}

/// Column value rendered as text; `None` only for NULL.
fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value.to_string()),
        ValueRef::Real(value) => Some(value.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Non-negative integral flag value, or `None` for anything else.
fn label_flag(value: ValueRef<'_>) -> Option<u64> {
    match value {
        ValueRef::Integer(value) if value >= 0 => Some(value as u64),
        ValueRef::Real(value) if value >= 0.0 && value.fract() == 0.0 => Some(value as u64),
        _ => None,
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
