pub mod commands;
pub mod config;
pub mod error;
pub mod service;

pub use error::{ServiceError, StoreResultExt};
pub use service::Service;
