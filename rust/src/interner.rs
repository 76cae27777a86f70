//! Task-name interning.
//!
//! Maps unique task names to dense [`TaskId`]s in insertion order, so graph
//! code can work on indices while errors and reports use names.

use rustc_hash::FxHashMap;

use crate::models::TaskId;

#[derive(Debug, Clone, Default)]
pub struct TaskNames {
    to_id: FxHashMap<String, TaskId>,
}

impl TaskNames {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Register a new name and return its id, or `None` if it is already taken.
    pub fn insert(&mut self, name: &str) -> Option<TaskId> {
        if self.to_id.contains_key(name) {
            return None;
        }
        let id = self.to_id.len();
        self.to_id.insert(name.to_string(), id);
        Some(id)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<TaskId> {
        self.to_id.get(name).copied()
    }
}
