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

//! Deterministic Merkle commitment over registry key/value pairs.
//!
//! leaf = H( "Amunchain-Alerts-Leaf-v1" || H(key) || H(value) )
//! node = H( "Amunchain-Alerts-Node-v1" || left || right )
//!
//! An odd node at the end of a level is paired with itself.

use ring::digest;

/// Hash32 type.
pub type Hash32 = [u8; 32];

/// Root of an empty state.
pub const EMPTY_ROOT: Hash32 = [0u8; 32];

const LEAF_DOMAIN: &[u8] = b"Amunchain-Alerts-Leaf-v1";
const NODE_DOMAIN: &[u8] = b"Amunchain-Alerts-Node-v1";

/// Side of sibling in proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Sibling is left.
    Left,
    /// Sibling is right.
    Right,
}

/// One proof step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofItem {
    /// Where the sibling sits relative to the running hash.
    pub side: Side,
    /// Sibling hash.
    pub sibling: Hash32,
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    /// Leaf hash.
    pub leaf: Hash32,
    /// Path items from leaf to root.
    pub path: Vec<ProofItem>,
}

fn sha256(parts: &[&[u8]]) -> Hash32 {
    let mut ctx = digest::Context::new(&digest::SHA256);
    for p in parts {
        ctx.update(p);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(ctx.finish().as_ref());
    out
}

/// Leaf hash for one key/value pair.
pub fn hash_leaf(key: &[u8], value: &[u8]) -> Hash32 {
    sha256(&[LEAF_DOMAIN, &sha256(&[key]), &sha256(&[value])])
}

fn hash_node(left: &Hash32, right: &Hash32) -> Hash32 {
    sha256(&[NODE_DOMAIN, left, right])
}

/// Fully materialized tree: `levels[0]` are leaves, the last level holds the root.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Build from (key, value) pairs already sorted by key.
    pub fn from_sorted_pairs(pairs: &[(Vec<u8>, Vec<u8>)]) -> Self {
        let leaves: Vec<Hash32> = pairs.iter().map(|(k, v)| hash_leaf(k, v)).collect();
        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let prev = &levels[levels.len() - 1];
            let next: Vec<Hash32> = prev
                .chunks(2)
                .map(|pair| hash_node(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// True if built from no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root hash, [`EMPTY_ROOT`] for an empty tree.
    pub fn root(&self) -> Hash32 {
        self.levels
            .last()
            .and_then(|lvl| lvl.first().copied())
            .unwrap_or(EMPTY_ROOT)
    }

    /// Inclusion proof for leaf `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = *self.levels.first()?.get(index)?;
        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut idx = index;
        for lvl in &self.levels[..self.levels.len() - 1] {
            let (side, sib_idx) = if idx % 2 == 1 {
                (Side::Left, idx - 1)
            } else {
                (Side::Right, idx + 1)
            };
            let sibling = lvl.get(sib_idx).copied().unwrap_or(lvl[idx]);
            path.push(ProofItem { side, sibling });
            idx /= 2;
        }
        Some(MerkleProof { leaf, path })
    }
}

/// Root over sorted pairs.
pub fn merkle_root_sorted(pairs: &[(Vec<u8>, Vec<u8>)]) -> Hash32 {
    MerkleTree::from_sorted_pairs(pairs).root()
}

/// Verify proof against root.
pub fn verify_proof(root: Hash32, proof: &MerkleProof) -> bool {
    let folded = proof.path.iter().fold(proof.leaf, |cur, item| match item.side {
        Side::Left => hash_node(&item.sibling, &cur),
        Side::Right => hash_node(&cur, &item.sibling),
    });
    folded == root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(n: u8) -> Vec<(Vec<u8>, Vec<u8>)> {
        (0..n).map(|i| (vec![i], vec![i, i])).collect()
    }

    #[test]
    fn empty_tree_has_zero_root_and_no_proofs() {
        let t = MerkleTree::from_sorted_pairs(&[]);
        assert_eq!(t.root(), EMPTY_ROOT);
        assert!(t.proof(0).is_none());
    }

    #[test]
    fn single_leaf_is_root() {
        let p = pairs(1);
        let t = MerkleTree::from_sorted_pairs(&p);
        assert_eq!(t.root(), hash_leaf(&p[0].0, &p[0].1));
        let proof = t.proof(0).unwrap();
        assert!(proof.path.is_empty());
        assert!(verify_proof(t.root(), &proof));
    }

    #[test]
    fn every_leaf_of_odd_tree_verifies() {
        let p = pairs(7);
        let t = MerkleTree::from_sorted_pairs(&p);
        for i in 0..p.len() {
            assert!(verify_proof(t.root(), &t.proof(i).unwrap()), "leaf {i}");
        }
        assert!(t.proof(7).is_none());
    }

    #[test]
    fn tampered_leaf_fails() {
        let t = MerkleTree::from_sorted_pairs(&pairs(4));
        let mut proof = t.proof(2).unwrap();
        proof.leaf = hash_leaf(b"other", b"value");
        assert!(!verify_proof(t.root(), &proof));
    }
}
