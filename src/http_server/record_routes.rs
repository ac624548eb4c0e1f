//! Record HTTP Routes
//!
//! CRUD endpoints over the `users` table. Every request logs exactly one
//! line: info on success, warn on rejected input or a missing delete
//! target, error on store failure.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};

use super::errors::ApiError;
use super::payload::{
    insert_params, parse_id, update_params, CreateRecordRequest, UpdateRecordRequest,
};
use super::state::AppState;
use crate::observability::error_chain;
use crate::store::{Param, Record, Statement};

/// Create record routes
pub fn record_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_records_handler).post(create_record_handler))
        .route("/users/:id/edit", get(get_record_handler))
        .route("/users/update/:id", put(update_record_handler))
        .route("/users/delete/:id", delete(delete_record_handler))
        .with_state(state)
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Operation {
    fn failure_context(&self) -> &'static str {
        match self {
            Operation::Create => "inserting user",
            Operation::List => "retrieving users",
            Operation::Get => "retrieving user",
            Operation::Update => "updating user",
            Operation::Delete => "deleting user",
        }
    }
}

impl AppState {
    /// Log `err` at its level and render it
    fn reject(&self, operation: Operation, err: ApiError) -> Response {
        match &err {
            ApiError::Validation(invalid) if invalid.is_missing_fields() => {
                self.logger.warn("Missing required fields")
            }
            ApiError::Validation(invalid) => {
                self.logger.warn(format_args!("Invalid request: {}", invalid))
            }
            ApiError::NotFound => self.logger.warn("User not found"),
            ApiError::Store(cause) => self.logger.error(format_args!(
                "Error {}: {}",
                operation.failure_context(),
                error_chain(cause)
            )),
        }
        err.into_response()
    }
}

fn describe<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_string())
}

/// JSON body for `Some`, empty body for `None`
fn optional_record(status: StatusCode, record: Option<Record>) -> Response {
    match record {
        Some(record) => (status, Json(record)).into_response(),
        None => status.into_response(),
    }
}

// ==================
// Create
// ==================

async fn create_record(
    state: &AppState,
    payload: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<Option<Record>, ApiError> {
    let Json(request) = payload?;
    let record = request.into_record()?;
    let result = state
        .store
        .query(Statement::InsertRecord, &insert_params(&record))
        .await?;
    Ok(result.into_first())
}

async fn create_record_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Response {
    match create_record(&state, payload).await {
        Ok(created) => {
            state
                .logger
                .info(format_args!("User created: {}", describe(&created)));
            optional_record(StatusCode::CREATED, created)
        }
        Err(err) => state.reject(Operation::Create, err),
    }
}

// ==================
// List
// ==================

async fn list_records_handler(State(state): State<AppState>) -> Response {
    match state.store.query(Statement::SelectAllRecords, &[]).await {
        Ok(result) => {
            state.logger.info("Users retrieved successfully");
            (StatusCode::OK, Json(result.rows)).into_response()
        }
        Err(err) => state.reject(Operation::List, err.into()),
    }
}

// ==================
// Get
// ==================

async fn get_record(state: &AppState, raw_id: &str) -> Result<Option<Record>, ApiError> {
    let id = parse_id(raw_id)?;
    let result = state
        .store
        .query(Statement::SelectRecordById, &[Param::BigInt(id)])
        .await?;
    Ok(result.into_first())
}

/// Answers 200 with an empty body when nothing matches.
async fn get_record_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    match get_record(&state, &raw_id).await {
        Ok(found) => {
            state
                .logger
                .info(format_args!("User retrieved: {}", describe(&found)));
            optional_record(StatusCode::OK, found)
        }
        Err(err) => state.reject(Operation::Get, err),
    }
}

// ==================
// Update
// ==================

async fn update_record(
    state: &AppState,
    raw_id: &str,
    payload: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Result<Option<Record>, ApiError> {
    let Json(request) = payload?;
    let changes = request.into_changes()?;
    let id = parse_id(raw_id)?;
    let result = state
        .store
        .query(Statement::UpdateRecordById, &update_params(id, &changes))
        .await?;
    Ok(result.into_first())
}

/// Answers 200 with an empty body when nothing matches.
async fn update_record_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Response {
    match update_record(&state, &raw_id, payload).await {
        Ok(updated) => {
            state
                .logger
                .info(format_args!("User updated: {}", describe(&updated)));
            optional_record(StatusCode::OK, updated)
        }
        Err(err) => state.reject(Operation::Update, err),
    }
}

// ==================
// Delete
// ==================

async fn delete_record(state: &AppState, raw_id: &str) -> Result<Record, ApiError> {
    let id = parse_id(raw_id)?;
    let result = state
        .store
        .query(Statement::DeleteRecordById, &[Param::BigInt(id)])
        .await?;
    if result.row_count == 0 {
        return Err(ApiError::NotFound);
    }
    result.into_first().ok_or(ApiError::NotFound)
}

async fn delete_record_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    match delete_record(&state, &raw_id).await {
        Ok(deleted) => {
            state
                .logger
                .info(format_args!("User deleted: {}", describe(&deleted)));
            (StatusCode::OK, Json(deleted)).into_response()
        }
        Err(err) => state.reject(Operation::Delete, err),
    }
}
