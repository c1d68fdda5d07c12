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

//! Association index: per-device, append-only list of alert ids.
//!
//! Every link is its own entry, so appends are O(1) and no stored value grows:
//!
//! ```text
//! assoc/len/<device>          -> u64 link count
//! assoc/link/<device><seq BE> -> AlertId
//! ```
//!
//! The canonical device encoding is self-delimiting, so one device's link prefix is
//! never a prefix of another device's keys.

use super::alerts::AlertStore;
use super::devices::DeviceRegistry;
use super::{Entity, RegistryError};
use crate::core::state::{KvOp, LedgerStore};
use crate::core::types::{
    decode_canonical_limited, encode_canonical, AlertId, DeviceAlerts, DeviceId,
};

pub(crate) const ASSOC_PREFIX: &[u8] = b"assoc/";
const LEN_PREFIX: &[u8] = b"assoc/len/";
const LINK_PREFIX: &[u8] = b"assoc/link/";

/// Both the count and each link are a single fixint u64.
const MAX_ENTRY_BYTES: usize = 8;

pub(crate) fn len_key(device: &DeviceId) -> Result<Vec<u8>, RegistryError> {
    let mut key = LEN_PREFIX.to_vec();
    key.extend_from_slice(&encode_canonical(device)?);
    Ok(key)
}

pub(crate) fn link_prefix(device: &DeviceId) -> Result<Vec<u8>, RegistryError> {
    let mut key = LINK_PREFIX.to_vec();
    key.extend_from_slice(&encode_canonical(device)?);
    Ok(key)
}

pub(crate) fn link_key(device: &DeviceId, seq: u64) -> Result<Vec<u8>, RegistryError> {
    let mut key = link_prefix(device)?;
    key.extend_from_slice(&seq.to_be_bytes());
    Ok(key)
}

pub(crate) fn decode_entry(raw: &[u8]) -> Result<u64, RegistryError> {
    Ok(decode_canonical_limited(raw, MAX_ENTRY_BYTES)?)
}

/// View over the device -> alerts table.
pub struct AssociationIndex<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> AssociationIndex<'a, S> {
    /// Bind to a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Number of links recorded for `device`.
    pub fn link_count(&self, device: &DeviceId) -> Result<u64, RegistryError> {
        match self.store.get(&len_key(device)?)? {
            None => Ok(0),
            Some(raw) => decode_entry(&raw),
        }
    }

    /// Link `alert` to `device`.
    ///
    /// The alert is checked before the device: when both are missing the error is
    /// `NotFound(Alert)`. Linking the same pair twice appends a second entry.
    pub fn associate(&self, alert: AlertId, device: &DeviceId) -> Result<(), RegistryError> {
        if !AlertStore::new(self.store).exists(alert)? {
            return Err(RegistryError::NotFound(Entity::Alert));
        }
        if !DeviceRegistry::new(self.store).exists(device)? {
            return Err(RegistryError::NotFound(Entity::Device));
        }

        let seq = self.link_count(device)?;
        self.store.commit_atomic(vec![
            KvOp::Put {
                key: link_key(device, seq)?,
                value: encode_canonical(&alert)?,
            },
            KvOp::Put {
                key: len_key(device)?,
                value: encode_canonical(&seq.saturating_add(1))?,
            },
        ])?;
        Ok(())
    }

    /// Alerts linked to `device`, in link order; empty for unknown or unlinked devices.
    pub fn get(&self, device: &DeviceId) -> Result<DeviceAlerts, RegistryError> {
        let links = self.store.scan_prefix(&link_prefix(device)?)?;
        let alert_ids = links
            .iter()
            .map(|(_, v)| decode_entry(v).map(AlertId))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DeviceAlerts { alert_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::MemoryState;
    use crate::core::types::{AlertDraft, BlockHeight, ExecContext, Principal};

    fn seeded() -> (MemoryState, AlertId, DeviceId) {
        let st = MemoryState::new();
        let ctx = ExecContext::new(BlockHeight(5), Principal("ST1".to_string()));
        let id = AlertStore::new(&st)
            .create(AlertDraft::new("t", "d", "medium"), &ctx)
            .unwrap();
        let dev = DeviceId::from(1);
        DeviceRegistry::new(&st).register(&dev).unwrap();
        (st, id, dev)
    }

    #[test]
    fn missing_alert_wins_over_missing_device() {
        let (st, _, _) = seeded();
        let idx = AssociationIndex::new(&st);
        let err = idx.associate(AlertId(999), &DeviceId::from(999)).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(Entity::Alert)));
    }

    #[test]
    fn missing_device_rejected_without_writes() {
        let (st, id, _) = seeded();
        let before = st.len().unwrap();
        let idx = AssociationIndex::new(&st);
        let err = idx.associate(id, &DeviceId::from(999)).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(Entity::Device)));
        assert_eq!(st.len().unwrap(), before);
        assert!(idx.get(&DeviceId::from(999)).unwrap().alert_ids.is_empty());
    }

    #[test]
    fn duplicate_links_are_kept_in_order() {
        let (st, id, dev) = seeded();
        let idx = AssociationIndex::new(&st);
        idx.associate(id, &dev).unwrap();
        idx.associate(id, &dev).unwrap();
        assert_eq!(idx.get(&dev).unwrap().alert_ids, vec![id, id]);
        assert_eq!(idx.link_count(&dev).unwrap(), 2);
    }

    #[test]
    fn unlinked_device_reads_empty() {
        let (st, _, dev) = seeded();
        let idx = AssociationIndex::new(&st);
        assert_eq!(idx.get(&dev).unwrap(), DeviceAlerts::default());
    }

    #[test]
    fn stored_values_stay_bounded_as_links_grow() {
        let (st, id, dev) = seeded();
        let idx = AssociationIndex::new(&st);
        for _ in 0..2_000 {
            idx.associate(id, &dev).unwrap();
        }

        let entries = st.scan_prefix(ASSOC_PREFIX).unwrap();
        assert_eq!(entries.len(), 2_001);
        assert!(entries.iter().all(|(_, v)| v.len() <= MAX_ENTRY_BYTES));

        let got = idx.get(&dev).unwrap();
        assert_eq!(got.alert_ids.len(), 2_000);
        assert!(got.alert_ids.iter().all(|a| *a == id));
    }

    #[test]
    fn links_of_similar_devices_do_not_mix() {
        let (st, id, _) = seeded();
        let devices = DeviceRegistry::new(&st);
        let short = DeviceId::from("SN-1");
        let long = DeviceId::from("SN-10");
        devices.register(&short).unwrap();
        devices.register(&long).unwrap();

        let idx = AssociationIndex::new(&st);
        idx.associate(id, &long).unwrap();
        assert!(idx.get(&short).unwrap().alert_ids.is_empty());
        assert_eq!(idx.get(&long).unwrap().alert_ids, vec![id]);
    }
}
