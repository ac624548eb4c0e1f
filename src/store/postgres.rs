//! PostgreSQL store session.
//!
//! One connection, opened at process start and shared by every request.
//! Statements are serialized on it the same way a single client session
//! queues them. No pooling, reconnection or health checks.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Row};
use tokio::sync::Mutex;

use super::errors::{StoreError, StoreResult};
use super::record::{QueryResult, Record};
use super::statement::{Param, Statement};
use super::StoreSession;

/// Store session over a single PostgreSQL connection
pub struct PgSession {
    conn: Mutex<Option<PgConnection>>,
}

impl PgSession {
    /// Open the connection described by `database_url`
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let conn = PgConnection::connect(database_url)
            .await
            .map_err(StoreError::Connect)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &'q Param,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        Param::BigInt(v) => query.bind(*v),
        Param::Int(v) => query.bind(*v),
        Param::Text(v) => query.bind(v.as_str()),
    }
}

fn decode_row(row: &PgRow) -> Result<Record, sqlx::Error> {
    Ok(Record {
        id: row.try_get("id")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
    })
}

#[async_trait]
impl StoreSession for PgSession {
    async fn query(&self, statement: Statement, params: &[Param]) -> StoreResult<QueryResult> {
        statement.check_params(params)?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;

        let query = params
            .iter()
            .fold(sqlx::query(statement.sql()), bind_param);

        let rows = query.fetch_all(&mut *conn).await?;
        let records = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult::from_rows(records))
    }

    async fn close(&self) -> StoreResult<()> {
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            conn.close().await?;
        }
        Ok(())
    }
}
