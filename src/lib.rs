pub mod app;
pub mod error;
pub mod manager;
pub mod models;
pub mod worker;

pub use error::{Result, SchedulerError};
