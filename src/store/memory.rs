//! In-process store session.
//!
//! Interprets the statement catalogue over a map keyed by id, with the same
//! observable behaviour as the PostgreSQL table: primary-key uniqueness,
//! `RETURNING` rows and row counts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::record::{QueryResult, Record};
use super::statement::{Param, Statement};
use super::StoreSession;

/// In-memory record table
pub struct MemorySession {
    rows: RwLock<BTreeMap<i64, Record>>,
    closed: AtomicBool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Session pre-loaded with `records`
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let rows = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            rows: RwLock::new(rows),
            closed: AtomicBool::new(false),
        }
    }

    /// Copy of the current table contents, ordered by id
    pub async fn snapshot(&self) -> Vec<Record> {
        self.rows.read().await.values().cloned().collect()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

// Statement::check_params has already validated arity and kinds, so the
// accessors below cannot miss.
fn bigint(params: &[Param], index: usize) -> i64 {
    params[index].as_bigint().unwrap_or_default()
}

fn int(params: &[Param], index: usize) -> i32 {
    params[index].as_int().unwrap_or_default()
}

fn text(params: &[Param], index: usize) -> String {
    params[index].as_text().unwrap_or_default().to_string()
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn query(&self, statement: Statement, params: &[Param]) -> StoreResult<QueryResult> {
        self.ensure_open()?;
        statement.check_params(params)?;

        match statement {
            Statement::InsertRecord => {
                let record = Record {
                    id: bigint(params, 0),
                    brand: text(params, 1),
                    model: text(params, 2),
                    year: int(params, 3),
                };
                let mut rows = self.rows.write().await;
                if rows.contains_key(&record.id) {
                    return Err(StoreError::DuplicateKey(record.id));
                }
                rows.insert(record.id, record.clone());
                Ok(QueryResult::from_rows(vec![record]))
            }
            Statement::SelectAllRecords => {
                let rows = self.rows.read().await;
                Ok(QueryResult::from_rows(rows.values().cloned().collect()))
            }
            Statement::SelectRecordById => {
                let rows = self.rows.read().await;
                let found = rows.get(&bigint(params, 0)).cloned();
                Ok(QueryResult::from_rows(found.into_iter().collect()))
            }
            Statement::UpdateRecordById => {
                let mut rows = self.rows.write().await;
                let updated = rows.get_mut(&bigint(params, 3)).map(|record| {
                    record.brand = text(params, 0);
                    record.model = text(params, 1);
                    record.year = int(params, 2);
                    record.clone()
                });
                Ok(QueryResult::from_rows(updated.into_iter().collect()))
            }
            Statement::DeleteRecordById => {
                let mut rows = self.rows.write().await;
                let removed = rows.remove(&bigint(params, 0));
                Ok(QueryResult::from_rows(removed.into_iter().collect()))
            }
        }
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
