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

//! Device registry: which device identifiers are known.

use super::RegistryError;
use crate::core::state::{KvOp, LedgerStore};
use crate::core::types::{decode_canonical_limited, encode_canonical, DeviceEntry, DeviceId};

pub(crate) const DEVICE_PREFIX: &[u8] = b"devices/";

/// Entries are a single bool; anything bigger is corrupt.
const MAX_DEVICE_ENTRY_BYTES: usize = 16;

pub(crate) fn device_key(device: &DeviceId) -> Result<Vec<u8>, RegistryError> {
    let mut key = DEVICE_PREFIX.to_vec();
    key.extend_from_slice(&encode_canonical(device)?);
    Ok(key)
}

/// View over the device table.
pub struct DeviceRegistry<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> DeviceRegistry<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Mark `device` as existing. Re-registering is a successful no-op overwrite.
    ///
    /// Returns whether the device was already known.
    pub fn register(&self, device: &DeviceId) -> Result<bool, RegistryError> {
        let known = self.exists(device)?;
        let value = encode_canonical(&DeviceEntry { exists: true })?;
        self.store.commit_atomic(vec![KvOp::Put {
            key: device_key(device)?,
            value,
        }])?;
        Ok(known)
    }

    /// Pure lookup.
    pub fn exists(&self, device: &DeviceId) -> Result<bool, RegistryError> {
        let Some(raw) = self.store.get(&device_key(device)?)? else {
            return Ok(false);
        };
        let entry: DeviceEntry = decode_canonical_limited(&raw, MAX_DEVICE_ENTRY_BYTES)?;
        Ok(entry.exists)
    }
}
