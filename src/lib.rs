pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;

pub use db::Database;
pub use error::{Result, TodoError};
pub use models::*;
pub use repository::TodoRepository;
