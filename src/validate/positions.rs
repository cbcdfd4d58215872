//! Position maps: where each distinct pair occurs in a sequence

use std::collections::HashMap;
use std::hash::Hash;

use super::pair::Pair;

/// Distinct pair -> ascending zero-based indices, iterated in first-occurrence order
///
/// Borrows the pairs from the sequence it was built from. The index lists
/// partition `0..len` of that sequence.
#[derive(Debug)]
pub struct PositionMap<'a, K, V> {
    positions: HashMap<&'a Pair<K, V>, Vec<usize>>,
    order: Vec<&'a Pair<K, V>>,
}

impl<'a, K: Eq + Hash, V: Eq + Hash> PositionMap<'a, K, V> {
    pub fn build(values: &'a [Pair<K, V>]) -> Self {
        let mut positions: HashMap<&'a Pair<K, V>, Vec<usize>> = HashMap::new();
        let mut order = Vec::new();
        for (i, pair) in values.iter().enumerate() {
            positions
                .entry(pair)
                .or_insert_with(|| {
                    order.push(pair);
                    Vec::new()
                })
                .push(i);
        }
        Self { positions, order }
    }

    pub fn get(&self, pair: &Pair<K, V>) -> Option<&[usize]> {
        self.positions.get(pair).map(Vec::as_slice)
    }

    /// Mark a pair as consumed, returning its positions
    pub fn remove(&mut self, pair: &Pair<K, V>) -> Option<Vec<usize>> {
        self.positions.remove(pair)
    }

    pub fn contains(&self, pair: &Pair<K, V>) -> bool {
        self.positions.contains_key(pair)
    }

    /// Remaining entries in first-occurrence order
    pub fn iter(&self) -> impl Iterator<Item = (&'a Pair<K, V>, &[usize])> + '_ {
        self.order.iter().filter_map(move |pair| {
            self.positions
                .get(*pair)
                .map(|positions| (*pair, positions.as_slice()))
        })
    }

    /// Number of distinct pairs not yet removed
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
