//! View history with O(1) append, move-to-back and removal.
//!
//! Records live in a slab of doubly linked nodes; a map from id to slab index
//! lets any record be unlinked without a scan.

use std::collections::HashMap;

use crate::models::TaskId;

#[derive(Debug, Clone)]
struct Node {
    id: TaskId,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Order in which items were viewed, oldest first, without duplicates.
#[derive(Debug, Clone, Default)]
pub struct History {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<TaskId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    limit: Option<usize>,
}

impl History {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that drops its oldest record once it holds more than `limit`.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Records a view of `id` as the most recent one.
    pub fn add(&mut self, id: TaskId) {
        if let Some(idx) = self.index.remove(&id) {
            self.unlink(idx);
        }

        let node = Node {
            id,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.index.insert(id, idx);

        if let Some(limit) = self.limit {
            while self.index.len() > limit {
                let Some(head) = self.head else { break };
                let oldest = self.nodes[head].id;
                self.remove(oldest);
            }
        }
    }

    /// Drops the record for `id`, if any.
    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.index.remove(&id) {
            Some(idx) => {
                self.unlink(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        let limit = self.limit;
        *self = Self::with_limit(limit);
    }

    /// Snapshot of the history, oldest first.
    pub fn ids(&self) -> Vec<TaskId> {
        let mut out = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            out.push(node.id);
            cursor = node.next;
        }
        out
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.free.push(idx);
    }
}
