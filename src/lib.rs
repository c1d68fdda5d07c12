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

//! Amunchain alert registry - on-ledger safety alerts bound to registered devices.
//!
//! This crate provides:
//! - A device registry, a sequential alert store and a device -> alerts association index
//! - Referential-integrity checks on every link (alert first, then device)
//! - Atomic commits over a pluggable host store (sled or in-memory)
//! - Deterministic Merkle state roots and per-device inclusion proofs
//! - Prometheus metrics and structured logging

/// Registry state machine, storage and types.
pub mod core;
/// Observability (metrics).
pub mod monitoring;

pub use crate::core::registry::{AlertRegistry, Entity, RegistryError};
pub use crate::core::types::{
    AlertDraft, AlertId, AlertRecord, BlockHeight, DeviceAlerts, DeviceId, ExecContext,
    Principal, Severity,
};
