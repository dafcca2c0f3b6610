//! This module contains a sorted-pair Merkle tree implementation which follows
//! the convention of OpenZeppelin's `MerkleProof.sol` and `merkletreejs` with `sortPairs`.
//!
//! Every internal node is `keccak256(min(a, b) ‖ max(a, b))`, so a proof is just the ordered
//! list of sibling hashes and carries no left/right path information.
use alloy_primitives::{keccak256, B256};

/// A sorted-pair Merkle tree built once over a fixed set of leaves.
///
/// Leaves are sorted ascending and deduplicated on construction, which makes the root
/// independent of the order in which the leaves were supplied. A node left without a
/// sibling on some level is promoted unchanged to the next level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedMerkleTree {
    /// Stores the nodes of the tree. Each inner `Vec` represents a level in the tree.
    /// The first `Vec` (index 0) contains the leaves, and the last `Vec` contains the root.
    nodes: Vec<Vec<B256>>,
}

impl Default for SortedMerkleTree {
    /// Creates a new, empty `SortedMerkleTree`.
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Represents a Merkle proof for the `SortedMerkleTree`
///
/// This struct contains all the necessary information to verify the inclusion
/// of a specific `leaf` in the Merkle tree defined by the `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortedMerkleProof {
    /// The root hash of the Merkle tree.
    pub root: B256,
    /// The leaf hash for which the proof is generated.
    pub leaf: B256,
    /// The sibling hashes needed to reconstruct the path to the root, from the leaf upwards.
    pub siblings: Vec<B256>,
}

impl SortedMerkleProof {
    /// Verifies the proof against the root it carries.
    pub fn verify(&self) -> bool {
        verify_proof(&self.root, &self.leaf, &self.siblings)
    }
}

/// Hashes two nodes together after ordering them, smaller hash first.
pub fn hash_pair(a: &B256, b: &B256) -> B256 {
    if a <= b {
        keccak256([a.as_slice(), b.as_slice()].concat())
    } else {
        keccak256([b.as_slice(), a.as_slice()].concat())
    }
}

/// Verifies that `leaf` belongs to the tree committed to by `root`.
///
/// This mirrors the on-chain verifier: starting from the leaf, every sibling is folded in
/// with [`hash_pair`] and the result is compared with `root`. It needs no access to the tree.
pub fn verify_proof(root: &B256, leaf: &B256, siblings: &[B256]) -> bool {
    let computed: B256 = siblings
        .iter()
        .fold(*leaf, |node: B256, sibling: &B256| hash_pair(&node, sibling));

    computed == *root
}

impl SortedMerkleTree {
    /// Create a new sorted-pair Merkle tree containing the provided `leaves`
    ///
    /// # Arguments
    ///
    /// * `leaves` - The leaf hashes, in any order. Duplicates collapse into a single leaf.
    ///
    /// # Returns
    ///
    /// A new `SortedMerkleTree` instance.
    pub fn new(leaves: &[B256]) -> Self {
        let mut sorted_leaves: Vec<B256> = leaves.to_vec();
        sorted_leaves.sort_unstable();
        sorted_leaves.dedup();

        let mut tree: SortedMerkleTree = Self {
            nodes: vec![sorted_leaves],
        };
        tree.build_levels();
        tree
    }

    /// Returns the root hash of the Merkle tree.
    ///
    /// If the tree is empty, returns a zero `B256` value.
    pub fn root(&self) -> B256 {
        *self.nodes[self.depth()].first().unwrap_or(&B256::ZERO)
    }

    /// Returns the depth of the Merkle tree.
    ///
    /// The depth is the number of levels in the tree minus one (this definition excludes the leaf level).
    pub fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns the sorted, deduplicated leaves of the Merkle tree.
    pub fn leaves(&self) -> &[B256] {
        &self.nodes[0]
    }

    /// Returns the size (number of distinct leaves) of the Merkle tree.
    pub fn size(&self) -> usize {
        self.nodes[0].len()
    }

    /// Returns `true` if the tree holds no leaves.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty()
    }

    /// Finds the index of a given `leaf` in the sorted leaf level.
    pub fn index_of(&self, leaf: &B256) -> Option<usize> {
        self.nodes[0].binary_search(leaf).ok()
    }

    /// Checks if the Merkle tree contains a specific `leaf`.
    pub fn has(&self, leaf: &B256) -> bool {
        self.index_of(leaf).is_some()
    }

    /// Hashes the leaf level upwards until a single node remains.
    fn build_levels(&mut self) {
        while self.nodes[self.depth()].len() > 1 {
            let parents: Vec<B256> = self.nodes[self.depth()]
                .chunks(2)
                .map(|pair: &[B256]| match pair {
                    [left, right] => hash_pair(left, right),
                    [lone] => *lone,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            self.nodes.push(parents);
        }
    }

    /// Generates a `SortedMerkleProof` for the leaf at the given `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the leaf in the sorted leaf level.
    ///
    /// # Returns
    ///
    /// A `Result` containing either the corresponding `SortedMerkleProof` or an error message
    /// if the index is out of bounds.
    pub fn generate_proof(&self, index: usize) -> Result<SortedMerkleProof, String> {
        if index >= self.size() {
            return Err(format!(
                "The leaf at index '{}' does not exist in this tree",
                index
            ));
        }

        let leaf: B256 = self.nodes[0][index];
        let mut siblings: Vec<B256> = Vec::with_capacity(self.depth());
        let mut current_index: usize = index;

        for level in 0..self.depth() {
            // A promoted node has no sibling on this level
            if let Some(sibling) = self.nodes[level].get(current_index ^ 1) {
                siblings.push(*sibling);
            }
            current_index >>= 1;
        }

        Ok(SortedMerkleProof {
            root: self.root(),
            leaf,
            siblings,
        })
    }

    /// Generates a proof for `leaf`, or `None` if the leaf is not part of the tree.
    pub fn proof_for(&self, leaf: &B256) -> Option<SortedMerkleProof> {
        self.index_of(leaf)
            .and_then(|index: usize| self.generate_proof(index).ok())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::{keccak256, B256};

    #[test]
    fn test_initializes_empty_tree() {
        let tree: SortedMerkleTree = SortedMerkleTree::new(&[]);
        assert_eq!(tree.root(), B256::ZERO);
        assert!(tree.is_empty());
        assert!(tree.generate_proof(0).is_err());
    }

    #[test]
    fn test_single_leaf_is_root() {
        let leaf: B256 = B256::random();
        let tree: SortedMerkleTree = SortedMerkleTree::new(&[leaf]);

        assert_eq!(tree.root(), leaf);
        let proof: SortedMerkleProof = tree.generate_proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(proof.verify());
    }

    #[test]
    fn test_hash_pair_is_commutative() {
        let a: B256 = B256::random();
        let b: B256 = B256::random();
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_initializes_tree_with_leaves() {
        let mut leaves: Vec<B256> = (0..5).map(|_| B256::random()).collect();
        let tree: SortedMerkleTree = SortedMerkleTree::new(&leaves);
        leaves.sort();

        let sorted = |a: &B256, b: &B256| -> B256 {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            keccak256([lo.as_slice(), hi.as_slice()].concat())
        };
        let manual_root: B256 = {
            let left_node = sorted(
                &sorted(&leaves[0], &leaves[1]),
                &sorted(&leaves[2], &leaves[3]),
            );
            // The fifth leaf is promoted twice before meeting the left subtree
            sorted(&left_node, &leaves[4])
        };

        assert_eq!(tree.root(), manual_root);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_root_is_order_independent() {
        let leaves: Vec<B256> = (0..37).map(|_| B256::random()).collect();
        let mut reversed: Vec<B256> = leaves.clone();
        reversed.reverse();
        let mut rotated: Vec<B256> = leaves.clone();
        rotated.rotate_left(11);

        let root: B256 = SortedMerkleTree::new(&leaves).root();
        assert_eq!(SortedMerkleTree::new(&reversed).root(), root);
        assert_eq!(SortedMerkleTree::new(&rotated).root(), root);
    }

    #[test]
    fn test_duplicates_collapse() {
        let leaves: Vec<B256> = (0..6).map(|_| B256::random()).collect();
        let mut with_duplicates: Vec<B256> = leaves.clone();
        with_duplicates.extend_from_slice(&leaves[..3]);

        let tree: SortedMerkleTree = SortedMerkleTree::new(&with_duplicates);
        assert_eq!(tree.size(), leaves.len());
        assert_eq!(tree.root(), SortedMerkleTree::new(&leaves).root());
    }

    #[test]
    fn test_has_and_index_of() {
        let element: B256 = B256::random();
        let mut leaves: Vec<B256> = (0..1 + rand::random::<u8>() as usize)
            .map(|_| B256::random())
            .collect();
        leaves.push(element);
        let tree: SortedMerkleTree = SortedMerkleTree::new(&leaves);

        assert!(tree.has(&element));
        assert_eq!(tree.leaves()[tree.index_of(&element).unwrap()], element);
        assert!(!tree.has(&B256::random()));
        assert!(tree.proof_for(&B256::random()).is_none());
    }

    #[test]
    fn test_generate_verify_every_proof() {
        for size in 1..=33 {
            let leaves: Vec<B256> = (0..size).map(|_| B256::random()).collect();
            let tree: SortedMerkleTree = SortedMerkleTree::new(&leaves);

            for leaf in leaves.iter() {
                let proof: SortedMerkleProof = tree.proof_for(leaf).unwrap();
                assert!(proof.verify());
                assert!(verify_proof(&tree.root(), leaf, &proof.siblings));
            }
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let leaves: Vec<B256> = (0..rand::random::<u16>() as usize % 500 + 2)
            .map(|_| B256::random())
            .collect();
        let tree: SortedMerkleTree = SortedMerkleTree::new(&leaves);
        let mut proof: SortedMerkleProof = tree
            .generate_proof(rand::random::<usize>() % tree.size())
            .unwrap();

        assert!(!verify_proof(&tree.root(), &B256::random(), &proof.siblings));

        proof.siblings[0] = B256::random();
        assert!(!proof.verify());
    }
}
