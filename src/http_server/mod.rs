//! # smms HTTP Server Module
//!
//! Maps HTTP requests onto statements against the record store.
//!
//! # Endpoints
//!
//! - `POST /users` - create a record
//! - `GET /users` - list every record
//! - `GET /users/:id/edit` - fetch one record
//! - `PUT /users/update/:id` - replace brand, model and year
//! - `DELETE /users/delete/:id` - remove a record
//! - `GET /` - fixed greeting

pub mod config;
pub mod errors;
pub mod payload;
pub mod record_routes;
pub mod root_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse, ValidationError};
pub use server::HttpServer;
pub use state::AppState;
