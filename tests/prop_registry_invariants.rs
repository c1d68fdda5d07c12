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

use amunchain_alerts::{
    AlertDraft, AlertId, AlertRegistry, BlockHeight, DeviceId, Entity, ExecContext, Principal,
    RegistryError,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Register(u8),
    Create,
    Associate(u64, u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8).prop_map(Op::Register),
        Just(Op::Create),
        ((0u64..12), (0u8..8)).prop_map(|(a, d)| Op::Associate(a, d)),
    ]
}

fn ctx(h: u64) -> ExecContext {
    ExecContext::new(BlockHeight(h), Principal("ST1".to_string()))
}

proptest! {
    #[test]
    fn prop_ids_are_sequential_and_links_follow_model(ops in prop::collection::vec(arb_op(), 1..80)) {
        let mut reg = AlertRegistry::in_memory();

        // Reference model.
        let mut created: u64 = 0;
        let mut devices = std::collections::BTreeSet::new();
        let mut links: std::collections::BTreeMap<u8, Vec<AlertId>> = Default::default();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Register(d) => {
                    prop_assert!(reg.register_device(&DeviceId::from(u64::from(d))).unwrap());
                    devices.insert(d);
                }
                Op::Create => {
                    let id = reg.create_alert(&ctx(step as u64), AlertDraft::new("t", "d", "low")).unwrap();
                    created += 1;
                    prop_assert_eq!(id, AlertId(created));
                }
                Op::Associate(a, d) => {
                    let res = reg.associate_alert_with_device(AlertId(a), &DeviceId::from(u64::from(d)));
                    let alert_ok = a >= 1 && a <= created;
                    let device_ok = devices.contains(&d);
                    match res {
                        Ok(v) => {
                            prop_assert!(v && alert_ok && device_ok);
                            links.entry(d).or_default().push(AlertId(a));
                        }
                        Err(RegistryError::NotFound(Entity::Alert)) => prop_assert!(!alert_ok),
                        Err(RegistryError::NotFound(Entity::Device)) => prop_assert!(alert_ok && !device_ok),
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                }
            }
        }

        prop_assert_eq!(reg.last_alert_id().unwrap(), AlertId(created));
        for d in 0u8..8 {
            let got = reg.get_device_alerts(&DeviceId::from(u64::from(d))).unwrap().alert_ids;
            let want = links.get(&d).cloned().unwrap_or_default();
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn prop_record_round_trips_caller_fields(
        title in ".{0,40}",
        description in ".{0,80}",
        severity in prop::sample::select(vec!["low", "medium", "high", "critical"]),
        batches in prop::collection::vec("[A-Z]{2}[0-9]{4}-[0-9]{3}", 0..5),
        types in prop::collection::vec("[A-Za-z ]{1,20}", 0..5),
        height in any::<u64>(),
    ) {
        let mut reg = AlertRegistry::in_memory();
        let draft = AlertDraft::new(&title, &description, severity)
            .batches(batches.clone())
            .types(types.clone());
        let id = reg.create_alert(&ctx(height), draft).unwrap();
        let rec = reg.get_alert(id).unwrap().unwrap();
        prop_assert_eq!(rec.title, title);
        prop_assert_eq!(rec.description, description);
        prop_assert_eq!(rec.severity.0, severity);
        prop_assert_eq!(rec.affected_batches, batches);
        prop_assert_eq!(rec.affected_types, types);
        prop_assert_eq!(rec.created_at, BlockHeight(height));
    }
}
