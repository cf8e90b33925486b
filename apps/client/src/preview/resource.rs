#![allow(dead_code)]

use bytes::Bytes;
use std::collections::HashMap;

/// Identifier of a displayable payload held by a [`ResourcePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

/// An exclusively owned reference to displayable binary content.
///
/// The handle is deliberately not `Clone`: every `acquire` has exactly
/// one matching `release`, and the type system enforces that the
/// release obligation cannot be discharged twice.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    id: ResourceId,
    len: usize,
}

impl ResourceHandle {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// Registry of displayable payloads with acquire/release accounting.
///
/// Stands in for the browser's revocable object URLs: a renderer looks
/// the bytes up by id while the handle is live; release withdraws them.
pub struct ResourcePool {
    next_id: u64,
    entries: HashMap<ResourceId, Bytes>,
    acquired: u64,
    released: u64,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self { next_id: 0, entries: HashMap::new(), acquired: 0, released: 0 }
    }

    pub fn acquire(&mut self, payload: Bytes) -> ResourceHandle {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        let len = payload.len();
        self.entries.insert(id, payload);
        self.acquired += 1;
        ResourceHandle { id, len }
    }

    pub fn release(&mut self, handle: ResourceHandle) {
        if self.entries.remove(&handle.id).is_some() {
            self.released += 1;
        }
    }

    pub fn bytes(&self, id: ResourceId) -> Option<&Bytes> {
        self.entries.get(&id)
    }

    pub fn live(&self) -> usize {
        self.entries.len()
    }

    pub fn acquired(&self) -> u64 {
        self.acquired
    }

    pub fn released(&self) -> u64 {
        self.released
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}
