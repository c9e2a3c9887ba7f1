//! Shared board: one manager behind a lock plus the backend that persists it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskboard_core::{ManagerConfig, TaskManager};

use crate::persist::{Backend, PersistError};

/// Cheap to clone; every clone sees the same manager.
#[derive(Debug, Clone)]
pub struct Board {
    manager: Arc<Mutex<TaskManager>>,
    backend: Arc<Backend>,
    /// Serializes mutate-then-save so snapshots reach the backend in order.
    save_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Board {
    pub fn new(manager: TaskManager, backend: Backend) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            backend: Arc::new(backend),
            save_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Loads the backend's snapshot into a fresh manager.
    pub async fn open(config: ManagerConfig, backend: Backend) -> Result<Self, PersistError> {
        let snapshot = backend.load().await?;
        let items = snapshot.tasks.len() + snapshot.epics.len() + snapshot.subtasks.len();
        let manager = TaskManager::from_snapshot(config, snapshot)?;
        tracing::info!(backend = %backend.describe(), items, "board loaded");
        Ok(Self::new(manager, backend))
    }

    /// A board that persists nothing.
    pub fn in_memory(config: ManagerConfig) -> taskboard_core::Result<Self> {
        Ok(Self::new(TaskManager::new(config)?, Backend::Memory))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Runs `f` against the manager without persisting anything.
    pub fn read<T>(&self, f: impl FnOnce(&TaskManager) -> T) -> T {
        f(&self.lock())
    }

    /// Runs `f` against the manager, then saves a snapshot.
    ///
    /// The snapshot is taken under the manager lock and written after it is
    /// released. If saving fails the in-memory change stays applied.
    pub async fn write<T>(&self, f: impl FnOnce(&mut TaskManager) -> T) -> Result<T, PersistError> {
        let _ordered = self.save_lock.lock().await;
        let (out, snapshot) = {
            let mut manager = self.lock();
            let out = f(&mut manager);
            let snapshot = match *self.backend {
                Backend::Memory => None,
                _ => Some(manager.snapshot()),
            };
            (out, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.backend.save(&snapshot).await?;
        }
        Ok(out)
    }

    fn lock(&self) -> MutexGuard<'_, TaskManager> {
        self.manager.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::models::CreateEpicInput;

    #[tokio::test]
    async fn write_is_visible_to_read() {
        let board = Board::in_memory(ManagerConfig::for_year(2026)).unwrap();
        let id = board
            .write(|m| {
                m.create_epic(CreateEpicInput {
                    name: "Move".into(),
                    ..Default::default()
                })
            })
            .await
            .unwrap();

        let clone = board.clone();
        assert_eq!(clone.read(|m| m.find_epic(id).map(|e| e.name)), Some("Move".into()));
    }
}
