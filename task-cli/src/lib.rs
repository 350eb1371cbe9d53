pub mod commands;
pub mod config;
pub mod error;
pub mod store;
pub mod task;

pub use error::StoreError;
pub use store::{TaskStore, TaskUpdate};
pub use task::{Status, Task};
