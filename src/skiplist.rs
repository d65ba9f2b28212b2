//! Skip-pointer-augmented sorted lists of document ids.
//!
//! # INVARIANTS (DO NOT VIOLATE)
//!
//! 1. **ASCENDING**: values strictly increase along the primary chain.
//! 2. **SKIP_FORWARD**: if node N has a skip to node M, M is reachable from N via
//!    `.next` and `M.value > N.value`.
//! 3. **SKIP_OPTIONAL**: every operation must stay correct with all skips absent.
//! 4. **SKIP_PLACEMENT**: a list of length L > 3 has skips every `round(sqrt(L))`
//!    nodes; L <= 3 has none.
//!
//! Nodes live in a flat arena (`Vec<Node>`) in list order, so arena index doubles
//! as list position. This sidesteps reference-counted cycles between `.next` and
//! `.skip` links and makes serialization a straight index walk.

use crate::error::IndexError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    value: u64,
    next: Option<usize>,
    skip: Option<usize>,
}

/// A sorted, deduplicated list of document ids with optional skip pointers.
#[derive(Debug, Clone, Default)]
pub struct SkipList {
    nodes: Vec<Node>,
    head: Option<usize>,
}

impl SkipList {
    /// An empty list.
    pub fn new() -> Self {
        SkipList::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Builds a plain chain (no skip pointers) from already-sorted, distinct values.
    fn chain_from_values(values: Vec<u64>) -> Self {
        let len = values.len();
        let nodes = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Node {
                value,
                next: if i + 1 < len { Some(i + 1) } else { None },
                skip: None,
            })
            .collect::<Vec<_>>();
        let head = if nodes.is_empty() { None } else { Some(0) };
        SkipList { nodes, head }
    }

    /// Builds from an already-sorted sequence of distinct ids, then installs skips.
    pub fn from_ids(ids: &[u64]) -> Self {
        let mut list = Self::chain_from_values(ids.to_vec());
        list.rebuild_skips();
        list
    }

    /// Parses the serialized form (`<id>` or `<id>^<target-id>` tokens, whitespace
    /// separated). Insertion order is trusted to already be ascending. A skip whose
    /// target value has no matching node is silently dropped.
    pub fn from_string(s: &str) -> Result<Self, IndexError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::new());
        }

        let mut values = Vec::new();
        let mut skip_targets: Vec<Option<u64>> = Vec::new();
        for token in s.split_whitespace() {
            if let Some((id_part, target_part)) = token.split_once('^') {
                let id = id_part
                    .parse::<u64>()
                    .map_err(|_| IndexError::CorruptDictionary(format!("bad id token: {token}")))?;
                let target = target_part
                    .parse::<u64>()
                    .map_err(|_| IndexError::CorruptDictionary(format!("bad skip token: {token}")))?;
                values.push(id);
                skip_targets.push(Some(target));
            } else {
                let id = token
                    .parse::<u64>()
                    .map_err(|_| IndexError::CorruptDictionary(format!("bad id token: {token}")))?;
                values.push(id);
                skip_targets.push(None);
            }
        }

        let mut list = Self::chain_from_values(values);
        for idx in 0..list.nodes.len() {
            if let Some(target) = skip_targets[idx] {
                list.nodes[idx].skip = list.find_index_of_value(target);
            }
        }
        Ok(list)
    }

    /// Scans forward from the head for the node holding `value`; stops early once
    /// values exceed the target, since the chain is strictly ascending.
    fn find_index_of_value(&self, value: u64) -> Option<usize> {
        let mut cur = self.head;
        while let Some(idx) = cur {
            let node_value = self.nodes[idx].value;
            if node_value == value {
                return Some(idx);
            } else if node_value > value {
                return None;
            }
            cur = self.nodes[idx].next;
        }
        None
    }

    /// Reinstalls skip pointers: none for length <= 3, otherwise every
    /// `d = round(sqrt(len))` nodes. Never leaves a skip starting on the final node.
    pub fn rebuild_skips(&mut self) {
        for node in &mut self.nodes {
            node.skip = None;
        }
        let len = self.nodes.len();
        if len <= 3 {
            return;
        }
        let d = (len as f64).sqrt().round() as usize;
        if d == 0 {
            return;
        }
        let mut i = 0usize;
        loop {
            let from_idx = i * d;
            let to_idx = (i + 1) * d;
            if from_idx >= len || to_idx >= len {
                break;
            }
            self.nodes[from_idx].skip = Some(to_idx);
            i += 1;
        }
    }

    /// Chooses the skip target if it does not overshoot `other_value`, else `.next`.
    fn forward(&self, idx: usize, other_value: u64) -> Option<usize> {
        let node = &self.nodes[idx];
        if let Some(skip_idx) = node.skip {
            if self.nodes[skip_idx].value <= other_value {
                return Some(skip_idx);
            }
        }
        node.next
    }

    fn values_iter(&self) -> impl Iterator<Item = u64> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let idx = cur?;
            cur = self.nodes[idx].next;
            Some(self.nodes[idx].value)
        })
    }

    fn union_values(&self, other: &SkipList) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.len() + other.len());
        let mut a = self.values_iter().peekable();
        let mut b = other.values_iter().peekable();
        loop {
            match (a.peek(), b.peek()) {
                (Some(&av), Some(&bv)) => {
                    if av < bv {
                        out.push(av);
                        a.next();
                    } else if av > bv {
                        out.push(bv);
                        b.next();
                    } else {
                        out.push(av);
                        a.next();
                        b.next();
                    }
                }
                (Some(&av), None) => {
                    out.push(av);
                    a.next();
                }
                (None, Some(&bv)) => {
                    out.push(bv);
                    b.next();
                }
                (None, None) => break,
            }
        }
        out
    }

    /// Sorted union, with skip pointers rebuilt on the result.
    pub fn merge(&self, other: &SkipList) -> SkipList {
        let mut list = Self::chain_from_values(self.union_values(other));
        list.rebuild_skips();
        list
    }

    /// Sorted union without rebuilding skips; query intermediates don't need them.
    pub fn or(&self, other: &SkipList) -> SkipList {
        Self::chain_from_values(self.union_values(other))
    }

    /// Skip-accelerated sorted intersection.
    pub fn and(&self, other: &SkipList) -> SkipList {
        let mut out = Vec::new();
        let mut a = self.head;
        let mut b = other.head;
        while let (Some(ai), Some(bi)) = (a, b) {
            let av = self.nodes[ai].value;
            let bv = other.nodes[bi].value;
            if av == bv {
                out.push(av);
                a = self.forward(ai, bv);
                b = other.forward(bi, av);
            } else if av < bv {
                a = self.forward(ai, bv);
            } else {
                b = other.forward(bi, av);
            }
        }
        Self::chain_from_values(out)
    }

    /// Set difference `self \ other`. `self` is assumed to be a superset of `other`.
    pub fn not(&self, other: &SkipList) -> SkipList {
        let mut out = Vec::new();
        let mut a = self.head;
        let mut b = other.head;
        while let Some(ai) = a {
            let av = self.nodes[ai].value;
            match b {
                None => {
                    out.push(av);
                    a = self.nodes[ai].next;
                }
                Some(bi) => {
                    let bv = other.nodes[bi].value;
                    if av < bv {
                        out.push(av);
                        a = self.nodes[ai].next;
                    } else if av == bv {
                        a = self.forward(ai, bv);
                        b = other.forward(bi, av);
                    } else {
                        b = other.forward(bi, av);
                    }
                }
            }
        }
        Self::chain_from_values(out)
    }

    /// Whitespace-joined ids, no skip annotations.
    pub fn get_value_string(&self) -> String {
        self.values_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whitespace-joined tokens, `id^target` where a skip is present.
    pub fn serialize(&self) -> String {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut cur = self.head;
        while let Some(idx) = cur {
            let node = &self.nodes[idx];
            match node.skip {
                Some(skip_idx) => out.push(format!("{}^{}", node.value, self.nodes[skip_idx].value)),
                None => out.push(node.value.to_string()),
            }
            cur = node.next;
        }
        out.join(" ")
    }
}

/// Equality is set equality (value membership), independent of skip placement;
/// `AND`/`OR` results are only ever compared this way.
impl PartialEq for SkipList {
    fn eq(&self, other: &Self) -> bool {
        self.get_value_string() == other.get_value_string()
    }
}
impl Eq for SkipList {}

impl fmt::Display for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ids_rebuilds_skips_above_three() {
        let list = SkipList::from_ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        // d = round(sqrt(9)) = 3: skips at index 0->3 and 3->6
        assert_eq!(list.serialize(), "1^4 2 3 4^7 5 6 7 8 9");
    }

    #[test]
    fn short_lists_have_no_skips() {
        let list = SkipList::from_ids(&[1, 2, 3]);
        assert_eq!(list.serialize(), "1 2 3");
    }

    #[test]
    fn round_trip_drops_dangling_skip() {
        let list = SkipList::from_string("1^99 2 3 4 5").unwrap();
        assert_eq!(list.serialize(), "1 2 3 4 5");
    }

    #[test]
    fn round_trip_preserves_valid_skip() {
        let list = SkipList::from_string("1^4 2 3 4^7 5 6 7 8 9").unwrap();
        assert_eq!(list.get_value_string(), "1 2 3 4 5 6 7 8 9");
        assert_eq!(list.serialize(), "1^4 2 3 4^7 5 6 7 8 9");
    }

    #[test]
    fn and_uses_skip_pointers_to_jump() {
        // A = 1..9 with skips at 1->4->7, B = 3 9
        let a = SkipList::from_ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let b = SkipList::from_ids(&[3, 9]);
        assert_eq!(a.and(&b).get_value_string(), "3 9");
    }

    #[test]
    fn and_is_commutative_as_a_set() {
        let a = SkipList::from_ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let b = SkipList::from_ids(&[3, 9]);
        assert_eq!(a.and(&b), b.and(&a));
    }

    #[test]
    fn or_matches_value_set_with_and_without_skips() {
        let a = SkipList::from_ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let b = SkipList::from_string("3 9").unwrap(); // no skips on b
        assert_eq!(a.or(&b).get_value_string(), "1 2 3 4 5 6 7 8 9");
    }

    #[test]
    fn not_of_empty_is_self() {
        let universe = SkipList::from_ids(&[1, 2, 3]);
        let empty = SkipList::new();
        assert_eq!(universe.not(&empty), universe);
    }

    #[test]
    fn not_removes_operand_from_superset() {
        let universe = SkipList::from_ids(&[1, 2, 3, 4, 5]);
        let operand = SkipList::from_ids(&[2, 4]);
        assert_eq!(universe.not(&operand).get_value_string(), "1 3 5");
    }

    #[test]
    fn double_not_is_identity_for_subset() {
        let universe = SkipList::from_ids(&[1, 2, 3, 4, 5, 6, 7]);
        let a = SkipList::from_ids(&[2, 4, 6]);
        let not_a = universe.not(&a);
        let not_not_a = universe.not(&not_a);
        assert_eq!(not_not_a, a);
    }

    #[test]
    fn merge_dedups_and_rebuilds_skips() {
        let a = SkipList::from_ids(&[1, 3, 5]);
        let b = SkipList::from_ids(&[3, 5, 7]);
        let merged = a.merge(&b);
        assert_eq!(merged.get_value_string(), "1 3 5 7");
    }

    #[test]
    fn malformed_token_is_corrupt_dictionary_error() {
        assert!(SkipList::from_string("abc").is_err());
    }
}
