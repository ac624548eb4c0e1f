//! smms - HTTP service for vehicle records
//!
//! CRUD over a single PostgreSQL table, with leveled file and console logging.

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod store;
