use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{SyncError, Todo};

use super::TodoStore;

/// Keeps the list in memory for the lifetime of the host.
#[derive(Default)]
pub struct MemoryStore {
    todos: RwLock<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self { todos: RwLock::new(todos) }
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Todo>, SyncError> {
        Ok(self.todos.read().await.clone())
    }

    async fn replace(&self, todos: Vec<Todo>) -> Result<(), SyncError> {
        *self.todos.write().await = todos;
        Ok(())
    }
}
