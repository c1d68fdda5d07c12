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

//! Alert store: sequential ids and immutable alert records.
//!
//! The counter lives next to the records (`alerts/meta/last-id`) and is written in the
//! same atomic batch as each new record, so an id is never allocated without a record.

use super::{LimitField, RegistryError};
use crate::core::state::{KvOp, LedgerStore};
use crate::core::types::{
    decode_canonical_limited, encode_canonical, AlertDraft, AlertId, AlertRecord, ExecContext,
    MAX_RECORD_BYTES,
};

pub(crate) const ALERT_PREFIX: &[u8] = b"alerts/";
const LAST_ID_KEY: &[u8] = b"alerts/meta/last-id";
const RECORD_PREFIX: &[u8] = b"alerts/rec/";

fn record_key(id: AlertId) -> Vec<u8> {
    let mut key = RECORD_PREFIX.to_vec();
    key.extend_from_slice(&id.to_key_bytes());
    key
}

/// View over the alert table and its counter.
pub struct AlertStore<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> AlertStore<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Last allocated id; `AlertId(0)` before the first alert.
    pub fn last_id(&self) -> Result<AlertId, RegistryError> {
        match self.store.get(LAST_ID_KEY)? {
            None => Ok(AlertId::default()),
            Some(raw) => Ok(decode_canonical_limited(&raw, 8)?),
        }
    }

    /// Allocate the next id and persist the record sealed with `ctx`.
    pub fn create(&self, draft: AlertDraft, ctx: &ExecContext) -> Result<AlertId, RegistryError> {
        let id = self
            .last_id()?
            .next()
            .ok_or(RegistryError::CounterExhausted)?;
        let value = encode_canonical(&AlertRecord::from_draft(draft, ctx))?;
        // Anything `get` could not decode is refused before the id is spent.
        if value.len() > MAX_RECORD_BYTES {
            return Err(RegistryError::LimitExceeded(LimitField::Record));
        }

        self.store.commit_atomic(vec![
            KvOp::Put {
                key: record_key(id),
                value,
            },
            KvOp::Put {
                key: LAST_ID_KEY.to_vec(),
                value: encode_canonical(&id)?,
            },
        ])?;
        Ok(id)
    }

    /// Pure lookup; `None` if `id` was never allocated.
    pub fn get(&self, id: AlertId) -> Result<Option<AlertRecord>, RegistryError> {
        let Some(raw) = self.store.get(&record_key(id))? else {
            return Ok(None);
        };
        Ok(Some(decode_canonical_limited(&raw, MAX_RECORD_BYTES)?))
    }

    /// Existence check without decoding the record.
    pub fn exists(&self, id: AlertId) -> Result<bool, RegistryError> {
        Ok(self.store.get(&record_key(id))?.is_some())
    }
}
