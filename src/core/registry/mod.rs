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

//! Safety-alert registry.
//!
//! Devices are registered on their own. Alerts get sequential ids starting at 1 and are
//! immutable. An alert is linked to a device only when both exist; links are
//! append-only. Every mutating call commits in one atomic batch or not at all.
//!
//! Mutating calls take `&mut self`, so one handle serializes its own writers. Hosts that
//! share a store across handles must serialize invocations themselves.

/// Alert store.
pub mod alerts;
/// Association index.
pub mod associations;
/// Device registry.
pub mod devices;

use crate::core::state::merkle::{hash_leaf, verify_proof, Hash32, MerkleProof, MerkleTree};
use crate::core::state::{LedgerStore, MemoryState, PersistentState, StateError};
use crate::core::types::{
    AlertDraft, AlertId, AlertRecord, CodecError, DeviceAlerts, DeviceId, ExecContext,
    LimitsConfig,
};
use crate::monitoring::metrics::Metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use alerts::AlertStore;
pub use associations::AssociationIndex;
pub use devices::DeviceRegistry;

/// Entity kind named by a not-found error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Alert id was never allocated.
    Alert,
    /// Device id was never registered.
    Device,
}

/// Alert field checked by [`RegistryLimits`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitField {
    /// `title`.
    Title,
    /// `description`.
    Description,
    /// `severity`.
    Severity,
    /// `affected_batches` (length or an entry).
    AffectedBatches,
    /// `affected_types` (length or an entry).
    AffectedTypes,
    /// Whole encoded record is larger than the store can read back.
    Record,
}

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Referenced alert or device does not exist.
    #[error("{0:?} not found")]
    NotFound(Entity),
    /// Input exceeds a configured limit.
    #[error("{0:?} exceeds configured limit")]
    LimitExceeded(LimitField),
    /// All u64 alert ids have been allocated.
    #[error("alert id counter exhausted")]
    CounterExhausted,
    /// Host storage failure.
    #[error("state: {0}")]
    State(#[from] StateError),
    /// Stored bytes failed canonical decoding, or a value failed to encode.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

impl RegistryError {
    /// Numeric result code surfaced to callers (404 for not-found).
    pub fn code(&self) -> u32 {
        match self {
            RegistryError::NotFound(_) => 404,
            RegistryError::LimitExceeded(_) => 400,
            RegistryError::CounterExhausted
            | RegistryError::State(_)
            | RegistryError::Codec(_) => 500,
        }
    }
}

/// Optional `create_alert` input limits. Zero disables a limit; the default checks nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Max bytes of a text field or list entry.
    pub max_text_bytes: usize,
    /// Max entries per list.
    pub max_list_len: usize,
}

impl From<LimitsConfig> for RegistryLimits {
    fn from(c: LimitsConfig) -> Self {
        Self {
            max_text_bytes: c.max_text_bytes,
            max_list_len: c.max_list_len,
        }
    }
}

impl RegistryLimits {
    fn check(&self, draft: &AlertDraft) -> Result<(), RegistryError> {
        let text_ok = |s: &str| self.max_text_bytes == 0 || s.len() <= self.max_text_bytes;
        let list_ok = |l: &[String]| {
            (self.max_list_len == 0 || l.len() <= self.max_list_len)
                && l.iter().all(|s| text_ok(s.as_str()))
        };

        let checks = [
            (text_ok(draft.title.as_str()), LimitField::Title),
            (text_ok(draft.description.as_str()), LimitField::Description),
            (text_ok(draft.severity.0.as_str()), LimitField::Severity),
            (list_ok(draft.affected_batches.as_slice()), LimitField::AffectedBatches),
            (list_ok(draft.affected_types.as_slice()), LimitField::AffectedTypes),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, field)) => Err(RegistryError::LimitExceeded(*field)),
            None => Ok(()),
        }
    }
}

/// One key/value pair proven against a state root.
#[derive(Clone, Debug)]
pub struct ProvenEntry {
    /// Storage key.
    pub key: Vec<u8>,
    /// Stored value.
    pub value: Vec<u8>,
    /// Merkle path.
    pub proof: MerkleProof,
}

impl ProvenEntry {
    fn verify(&self, root: Hash32) -> bool {
        hash_leaf(&self.key, &self.value) == self.proof.leaf && verify_proof(root, &self.proof)
    }
}

/// Inclusion proof of one device's complete association list.
#[derive(Clone, Debug)]
pub struct DeviceAlertsProof {
    /// Device the links belong to.
    pub device: DeviceId,
    /// State root the proof was produced against.
    pub root: Hash32,
    /// Link count entry.
    pub count: ProvenEntry,
    /// One entry per link, in link order.
    pub links: Vec<ProvenEntry>,
}

impl DeviceAlertsProof {
    /// True if every entry folds to `root`, keys belong to `device`, and no link is missing.
    pub fn verify(&self, root: Hash32) -> bool {
        let Ok(count_key) = associations::len_key(&self.device) else {
            return false;
        };
        let Ok(count) = associations::decode_entry(&self.count.value) else {
            return false;
        };
        if self.count.key != count_key || !self.count.verify(root) {
            return false;
        }
        if u64::try_from(self.links.len()).map_or(true, |n| n != count) {
            return false;
        }
        self.links.iter().zip(0u64..).all(|(link, seq)| {
            associations::link_key(&self.device, seq).is_ok_and(|k| k == link.key)
                && link.verify(root)
        })
    }

    /// Decode the proven association list.
    pub fn alerts(&self) -> Result<DeviceAlerts, RegistryError> {
        let alert_ids = self
            .links
            .iter()
            .map(|l| associations::decode_entry(&l.value).map(AlertId))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DeviceAlerts { alert_ids })
    }
}

/// Registry handle owning its storage.
pub struct AlertRegistry<S: LedgerStore> {
    store: S,
    limits: RegistryLimits,
    metrics: Option<Arc<Metrics>>,
}

impl AlertRegistry<PersistentState> {
    /// Open a sled-backed registry at `path`.
    pub fn open(path: &str) -> Result<Self, RegistryError> {
        Ok(Self::new(PersistentState::open(path)?))
    }
}

impl AlertRegistry<MemoryState> {
    /// Registry over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryState::new())
    }
}

impl<S: LedgerStore> AlertRegistry<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            limits: RegistryLimits::default(),
            metrics: None,
        }
    }

    /// Enforce input limits on `create_alert`.
    pub fn with_limits(mut self, limits: RegistryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Report operations to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        match AlertStore::new(&self.store).last_id() {
            Ok(last) => metrics
                .last_alert_id
                .set(i64::try_from(last.0).unwrap_or(i64::MAX)),
            Err(e) => warn!(%e, "last alert id unreadable; gauge left unset"),
        }
        self.metrics = Some(metrics);
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a device. Always `Ok(true)` on success, also for known devices.
    pub fn register_device(&mut self, device: &DeviceId) -> Result<bool, RegistryError> {
        let known = DeviceRegistry::new(&self.store).register(device)?;
        if known {
            debug!(%device, "device re-registered");
        } else {
            info!(%device, "device registered");
            if let Some(m) = &self.metrics {
                m.devices_registered_total.inc();
            }
        }
        Ok(true)
    }

    /// Create an alert sealed with the host context; returns its new id.
    pub fn create_alert(
        &mut self,
        ctx: &ExecContext,
        draft: AlertDraft,
    ) -> Result<AlertId, RegistryError> {
        self.limits.check(&draft)?;
        let severity = draft.severity.0.clone();
        let id = AlertStore::new(&self.store).create(draft, ctx)?;
        info!(
            alert_id = id.0,
            height = ctx.height.0,
            caller = %ctx.caller,
            severity = %severity,
            "alert created"
        );
        if let Some(m) = &self.metrics {
            m.alerts_created_total.inc();
            m.last_alert_id.set(i64::try_from(id.0).unwrap_or(i64::MAX));
            m.ledger_height
                .set(i64::try_from(ctx.height.0).unwrap_or(i64::MAX));
        }
        Ok(id)
    }

    /// Link an existing alert to an existing device. Always `Ok(true)` on success.
    pub fn associate_alert_with_device(
        &mut self,
        alert: AlertId,
        device: &DeviceId,
    ) -> Result<bool, RegistryError> {
        match AssociationIndex::new(&self.store).associate(alert, device) {
            Ok(()) => {
                info!(alert_id = alert.0, %device, "alert linked to device");
                if let Some(m) = &self.metrics {
                    m.associations_total.inc();
                }
                Ok(true)
            }
            Err(e) => {
                if let RegistryError::NotFound(entity) = &e {
                    warn!(alert_id = alert.0, %device, ?entity, "association rejected");
                    if let Some(m) = &self.metrics {
                        m.association_rejected_total.inc();
                    }
                }
                Err(e)
            }
        }
    }

    /// Alert by id, `None` if never allocated.
    pub fn get_alert(&self, alert: AlertId) -> Result<Option<AlertRecord>, RegistryError> {
        AlertStore::new(&self.store).get(alert)
    }

    /// Alerts linked to `device`, empty for unknown devices.
    pub fn get_device_alerts(&self, device: &DeviceId) -> Result<DeviceAlerts, RegistryError> {
        AssociationIndex::new(&self.store).get(device)
    }

    /// True if `device` has been registered.
    pub fn device_exists(&self, device: &DeviceId) -> Result<bool, RegistryError> {
        DeviceRegistry::new(&self.store).exists(device)
    }

    /// Last allocated alert id (`AlertId(0)` when none). Equals the number of alerts.
    pub fn last_alert_id(&self) -> Result<AlertId, RegistryError> {
        AlertStore::new(&self.store).last_id()
    }

    /// Number of alerts ever created.
    pub fn alert_count(&self) -> Result<u64, RegistryError> {
        Ok(self.last_alert_id()?.0)
    }

    fn registry_pairs(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, RegistryError> {
        let mut pairs = Vec::new();
        for prefix in [
            alerts::ALERT_PREFIX,
            associations::ASSOC_PREFIX,
            devices::DEVICE_PREFIX,
        ] {
            pairs.extend(self.store.scan_prefix(prefix)?);
        }
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }

    /// Deterministic Merkle root over all registry state.
    pub fn state_root(&self) -> Result<Hash32, RegistryError> {
        Ok(MerkleTree::from_sorted_pairs(&self.registry_pairs()?).root())
    }

    /// Inclusion proof for `device`'s association list; `None` if it has no links.
    pub fn prove_device_alerts(
        &self,
        device: &DeviceId,
    ) -> Result<Option<DeviceAlertsProof>, RegistryError> {
        let pairs = self.registry_pairs()?;
        let tree = MerkleTree::from_sorted_pairs(&pairs);
        let prove = |key: Vec<u8>| -> Option<ProvenEntry> {
            let i = pairs.binary_search_by(|p| p.0.as_slice().cmp(&key)).ok()?;
            let proof = tree.proof(i)?;
            Some(ProvenEntry {
                key,
                value: pairs[i].1.clone(),
                proof,
            })
        };

        let Some(count) = prove(associations::len_key(device)?) else {
            return Ok(None);
        };
        let n = associations::decode_entry(&count.value)?;
        let mut links = Vec::new();
        for seq in 0..n {
            match prove(associations::link_key(device, seq)?) {
                Some(link) => links.push(link),
                None => return Err(RegistryError::Codec(CodecError::Deserialize)),
            }
        }
        Ok(Some(DeviceAlertsProof {
            device: device.clone(),
            root: tree.root(),
            count,
            links,
        }))
    }
}
