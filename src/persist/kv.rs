use taskboard_core::models::{Epic, Snapshot, Subtask, Task, TaskId};

use super::PersistError;
use crate::kv::KvClient;

const KEY_TASKS: &str = "tasks";
const KEY_EPICS: &str = "epics";
const KEY_SUBTASKS: &str = "subtasks";
const KEY_HISTORY: &str = "history";

/// Stores a snapshot as four JSON documents in a remote key-value server.
#[derive(Debug, Clone)]
pub struct KvStore {
    client: KvClient,
}

impl KvStore {
    pub fn new(client: KvClient) -> Self {
        Self { client }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        self.client
            .put(KEY_TASKS, serde_json::to_string(&snapshot.tasks)?)
            .await?;
        self.client
            .put(KEY_EPICS, serde_json::to_string(&snapshot.epics)?)
            .await?;
        self.client
            .put(KEY_SUBTASKS, serde_json::to_string(&snapshot.subtasks)?)
            .await?;
        self.client
            .put(KEY_HISTORY, serde_json::to_string(&snapshot.history)?)
            .await?;
        Ok(())
    }

    /// Missing keys load as empty lists.
    pub async fn load(&self) -> Result<Snapshot, PersistError> {
        let tasks: Vec<Task> = self.load_key(KEY_TASKS).await?;
        let epics: Vec<Epic> = self.load_key(KEY_EPICS).await?;
        let subtasks: Vec<Subtask> = self.load_key(KEY_SUBTASKS).await?;
        let history: Vec<TaskId> = self.load_key(KEY_HISTORY).await?;
        Ok(Snapshot {
            tasks,
            epics,
            subtasks,
            history,
        })
    }

    async fn load_key<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<T>, PersistError> {
        match self.client.get(key).await? {
            Some(body) if !body.trim().is_empty() => Ok(serde_json::from_str(&body)?),
            _ => Ok(Vec::new()),
        }
    }
}
