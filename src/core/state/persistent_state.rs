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

//! Persistent key-value state using sled transactions.

use super::{KvOp, LedgerStore, StateError};
use sled::transaction::{ConflictableTransactionError, TransactionError};

/// Persistent state wrapper.
#[derive(Clone)]
pub struct PersistentState {
    db: sled::Db,
}

impl PersistentState {
    /// Open sled DB at path (directory).
    pub fn open(path: &str) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(|_| StateError::DbOpen)?;
        Ok(Self { db })
    }

    /// Temporary DB removed on drop. Test and tooling helper.
    pub fn temporary() -> Result<Self, StateError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|_| StateError::DbOpen)?;
        Ok(Self { db })
    }

    /// Flush dirty pages to disk; returns bytes flushed.
    pub fn flush(&self) -> Result<usize, StateError> {
        self.db.flush().map_err(|_| StateError::DbIo)
    }
}

impl LedgerStore for PersistentState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        let v = self.db.get(key).map_err(|_| StateError::DbIo)?;
        Ok(v.map(|iv| iv.to_vec()))
    }

    fn commit_atomic(&self, ops: Vec<KvOp>) -> Result<(), StateError> {
        let res: Result<(), TransactionError<StateError>> = self.db.transaction(|t| {
            for op in ops.iter() {
                match op {
                    KvOp::Put { key, value } => {
                        t.insert(key.as_slice(), value.as_slice())?;
                    }
                    KvOp::Del { key } => {
                        t.remove(key.as_slice())?;
                    }
                }
            }
            Ok::<(), ConflictableTransactionError<StateError>>(())
        });

        match res {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(_)) => Err(StateError::DbIo),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StateError> {
        // sled iterates in key order already.
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let kv = item.map_err(|_| StateError::DbIo)?;
            pairs.push((kv.0.to_vec(), kv.1.to_vec()));
        }
        Ok(pairs)
    }
}
