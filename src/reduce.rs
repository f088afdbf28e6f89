//! Combining per-partition tables.
//!
//! Entry merging is commutative and associative, so any grouping gives the same
//! keys, extremes and counts. Sums are floating point, so both functions here
//! combine in a fixed order to keep repeated runs byte-identical.

use crate::stats::StatsTable;

/// Left fold in iteration order.
pub fn reduce<I>(tables: I) -> StatsTable
where
    I: IntoIterator<Item = StatsTable>,
{
    tables
        .into_iter()
        .reduce(|mut l, r| {
            l.merge(r);
            l
        })
        .unwrap_or_default()
}

/// Pairwise reduction, splitting at the midpoint and merging both halves in
/// parallel on the current rayon pool. The tree shape depends only on the
/// number of tables.
pub fn reduce_tree(mut tables: Vec<StatsTable>) -> StatsTable {
    match tables.len() {
        0 => StatsTable::new(),
        1 => tables.pop().unwrap_or_default(),
        n => {
            let right = tables.split_off(n / 2);
            let (mut l, r) = rayon::join(|| reduce_tree(tables), || reduce_tree(right));
            l.merge(r);
            l
        }
    }
}
