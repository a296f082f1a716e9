pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use crate::core::{SyncError, Todo};

/// Where the host keeps the authoritative todo list.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Todo>, SyncError>;
    /// Last write wins: the stored list becomes exactly `todos`.
    async fn replace(&self, todos: Vec<Todo>) -> Result<(), SyncError>;
}
