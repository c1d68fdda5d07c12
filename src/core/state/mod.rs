// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Host key-value storage seam, with sled and in-memory backends.

/// Deterministic Merkle commitment over registry state.
pub mod merkle;
/// Durable sled backend.
pub mod persistent_state;

use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

pub use persistent_state::PersistentState;

/// State errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Backend could not be opened.
    #[error("db open")]
    DbOpen,
    /// Read, write or commit failed.
    #[error("db io")]
    DbIo,
}

/// State operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvOp {
    /// Put key/value.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete key.
    Del { key: Vec<u8> },
}

/// Atomic, durable key/value storage provided by the host.
///
/// Reads observe every commit made earlier through the same handle.
pub trait LedgerStore {
    /// Get value.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Apply all ops or none.
    fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError>;

    /// All pairs whose key starts with `prefix`, sorted by key.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for &T {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        (**self).get(key)
    }

    fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError> {
        (**self).commit_atomic(ops)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        (**self).scan_prefix(prefix)
    }
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryState {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryState {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize, StateError> {
        let map = self.map.read().map_err(|_| StateError::DbIo)?;
        Ok(map.len())
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.len()? == 0)
    }
}

impl LedgerStore for MemoryState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        let map = self.map.read().map_err(|_| StateError::DbIo)?;
        Ok(map.get(key).cloned())
    }

    fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError> {
        // Ops are applied under one write guard, so readers never see a partial batch.
        let mut map = self.map.write().map_err(|_| StateError::DbIo)?;
        for op in ops {
            match op {
                KvOp::Put { key, value } => {
                    map.insert(key, value);
                }
                KvOp::Del { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        let map = self.map.read().map_err(|_| StateError::DbIo)?;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
