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

use amunchain_alerts::core::state::merkle::verify_proof;
use amunchain_alerts::{AlertDraft, AlertRegistry, BlockHeight, DeviceId, ExecContext, Principal};

#[test]
fn test_state_root_and_device_proof() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = AlertRegistry::open(dir.path().to_str().unwrap()).unwrap();
    let ctx = ExecContext::new(BlockHeight(12), Principal("ST1".to_string()));

    for d in 1..=3u64 {
        reg.register_device(&DeviceId::from(d)).unwrap();
    }
    let a = reg
        .create_alert(&ctx, AlertDraft::new("Recall", "Firmware fault", "high"))
        .unwrap();
    let b = reg
        .create_alert(&ctx, AlertDraft::new("Advisory", "Label misprint", "low"))
        .unwrap();
    reg.associate_alert_with_device(a, &DeviceId::from(2)).unwrap();
    reg.associate_alert_with_device(b, &DeviceId::from(2)).unwrap();

    let root = reg.state_root().unwrap();
    let got = reg.prove_device_alerts(&DeviceId::from(2)).unwrap().unwrap();
    assert_eq!(root, got.root);
    assert!(verify_proof(root, &got.count.proof));
    assert_eq!(got.links.len(), 2);
    assert!(got.links.iter().all(|l| verify_proof(root, &l.proof)));
    assert!(got.verify(root));
    assert_eq!(got.alerts().unwrap().alert_ids, vec![a, b]);

    // A later link moves the root; the old proof no longer verifies against it.
    reg.associate_alert_with_device(a, &DeviceId::from(3)).unwrap();
    let root2 = reg.state_root().unwrap();
    assert_ne!(root, root2);
    assert!(!got.verify(root2));
}
