//! Record shape and query results.

use serde::{Deserialize, Serialize};

/// A vehicle record stored in the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub year: i32,
}

/// Rows returned by a statement plus the number of rows it touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    pub row_count: u64,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let row_count = rows.len() as u64;
        Self { rows, row_count }
    }

    /// First row, if any
    pub fn into_first(self) -> Option<Record> {
        self.rows.into_iter().next()
    }
}
