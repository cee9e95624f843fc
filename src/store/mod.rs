//! Persistence collaborator boundary
//!
//! The capture core never performs I/O; a `CaptureStore` implementation
//! accepts the Task and MicroStep records a capture produces. The bundled
//! in-memory store backs tests and embedding callers that bring no
//! database of their own.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{MicroStep, Task};

/// Errors from the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Persistence contract for captured tasks and their steps
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Persist a task record
    async fn save_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Persist the micro-steps belonging to a task, replacing any previous set
    async fn save_steps(&self, task_id: &str, steps: &[MicroStep]) -> Result<(), StoreError>;

    /// Load a task by id
    async fn load_task(&self, task_id: &str) -> Result<Task, StoreError>;

    /// Load the micro-steps belonging to a task, in sequence order
    async fn load_steps(&self, task_id: &str) -> Result<Vec<MicroStep>, StoreError>;
}

/// In-memory store for tests and one-shot runs
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tasks: HashMap<String, Task>,
    steps: HashMap<String, Vec<MicroStep>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks
    pub async fn task_count(&self) -> usize {
        self.inner.lock().await.tasks.len()
    }
}

#[async_trait]
impl CaptureStore for MemoryStore {
    async fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn save_steps(&self, task_id: &str, steps: &[MicroStep]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.tasks.contains_key(task_id) {
            return Err(StoreError::NotFound(task_id.to_string()));
        }
        inner.steps.insert(task_id.to_string(), steps.to_vec());
        Ok(())
    }

    async fn load_task(&self, task_id: &str) -> Result<Task, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))
    }

    async fn load_steps(&self, task_id: &str) -> Result<Vec<MicroStep>, StoreError> {
        let inner = self.inner.lock().await;
        let mut steps = inner.steps.get(task_id).cloned().unwrap_or_default();
        steps.sort_by_key(|s| s.seq);
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load_task() {
        let store = MemoryStore::new();
        let task = Task::new("Send email", "Send the weekly update");

        store.save_task(&task).await.unwrap();
        let loaded = store.load_task(&task.id).await.unwrap();
        assert_eq!(loaded.title, "Send email");
        assert_eq!(store.task_count().await, 1);
    }

    #[tokio::test]
    async fn test_save_steps_requires_task() {
        let store = MemoryStore::new();
        let steps = vec![MicroStep::new("Draft", "Draft the email", 5)];

        let err = store.save_steps("missing-id", &steps).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_steps_sorted_by_seq() {
        let store = MemoryStore::new();
        let task = Task::new("T", "d");
        store.save_task(&task).await.unwrap();

        let mut a = MicroStep::new("Second", "b", 5);
        a.seq = 2;
        let mut b = MicroStep::new("First", "a", 5);
        b.seq = 1;

        store.save_steps(&task.id, &[a, b]).await.unwrap();
        let loaded = store.load_steps(&task.id).await.unwrap();
        assert_eq!(loaded[0].label, "First");
        assert_eq!(loaded[1].label, "Second");
    }
}
