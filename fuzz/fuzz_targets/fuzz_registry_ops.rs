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

#![no_main]
#![forbid(unsafe_code)]

use amunchain_alerts::{
    AlertDraft, AlertId, AlertRegistry, BlockHeight, DeviceId, ExecContext, Principal,
};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Register(u8),
    Create { title: String, batches: Vec<String> },
    Associate { alert: u8, device: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut reg = AlertRegistry::in_memory();
    let mut created = 0u64;
    for (h, op) in ops.into_iter().enumerate() {
        let ctx = ExecContext::new(BlockHeight(h as u64), Principal("fuzz".to_string()));
        match op {
            Op::Register(d) => {
                let _ = reg.register_device(&DeviceId::from(u64::from(d)));
            }
            Op::Create { title, batches } => {
                let id = reg
                    .create_alert(&ctx, AlertDraft::new(&title, "", "low").batches(batches))
                    .expect("create never fails on an in-memory store");
                created += 1;
                assert_eq!(id, AlertId(created));
            }
            Op::Associate { alert, device } => {
                let _ = reg.associate_alert_with_device(
                    AlertId(u64::from(alert)),
                    &DeviceId::from(u64::from(device)),
                );
            }
        }
    }
});
