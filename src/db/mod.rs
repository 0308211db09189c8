pub mod connection;
pub mod executor;
pub mod models;
pub mod queries;
