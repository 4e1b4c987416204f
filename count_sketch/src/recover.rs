use std::{cmp::Ordering, collections::BinaryHeap};

use crate::table::SketchTable;

/// A recovered coordinate and its estimated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recovered {
    pub index: usize,
    pub value: f32,
}

/// Recovers the `k` coordinates with the largest estimated magnitude.
///
/// Runs a bounded min-heap over the candidate estimates, so only `k`
/// candidates are ever held instead of a dense length-`dim` scratch vector.
/// Zero estimates are never returned: when fewer than `k` coordinates carry
/// mass the result is simply shorter, never padded.
///
/// # Args
/// * `table` - The (aggregate) sketch to query.
/// * `dim` - Size of the coordinate universe.
/// * `k` - Sparsity budget.
///
/// # Returns
/// Up to `k` pairs ordered by descending magnitude, ties toward the lower
/// index.
pub fn recover_top_k(table: &SketchTable, dim: usize, k: usize) -> Vec<Recovered> {
    select_top_k((0..dim).map(|index| (index, table.estimate(index))), k)
}

/// Top-k over an exact dense vector; ground-truth twin of `recover_top_k`.
pub fn top_k_dense(values: &[f32], k: usize) -> Vec<Recovered> {
    select_top_k(values.iter().copied().enumerate(), k)
}

fn select_top_k(estimates: impl Iterator<Item = (usize, f32)>, k: usize) -> Vec<Recovered> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (index, value) in estimates {
        if value == 0.0 {
            continue;
        }

        heap.push(Candidate { index, value });
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut recovered: Vec<Recovered> = heap
        .into_iter()
        .map(|c| Recovered {
            index: c.index,
            value: c.value,
        })
        .collect();

    recovered.sort_by(|a, b| {
        b.value
            .abs()
            .total_cmp(&a.value.abs())
            .then(a.index.cmp(&b.index))
    });

    recovered
}

/// Heap entry ordered so the heap's maximum is the weakest candidate.
struct Candidate {
    index: usize,
    value: f32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .abs()
            .total_cmp(&self.value.abs())
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    const SEED: u64 = 42;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn recovers_heaviest_coordinates() {
        const DIM: usize = 200;

        let mut table = SketchTable::new(nz(7), nz(256), SEED);
        table.accumulate_entry(10, -9.0);
        table.accumulate_entry(55, 4.0);
        table.accumulate_entry(120, 1.0);

        let recovered = recover_top_k(&table, DIM, 2);

        assert_eq!(recovered.len(), 2);
        assert_eq!(recovered[0], Recovered { index: 10, value: -9.0 });
        assert_eq!(recovered[1], Recovered { index: 55, value: 4.0 });
    }

    #[test]
    fn empty_table_recovers_nothing() {
        let table = SketchTable::new(nz(3), nz(16), SEED);

        assert!(recover_top_k(&table, 100, 5).is_empty());
    }

    #[test]
    fn returns_fewer_than_k_when_mass_is_sparse() {
        let mut table = SketchTable::new(nz(7), nz(256), SEED);
        table.accumulate_entry(3, 2.5);

        let recovered = recover_top_k(&table, 100, 10);

        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0], Recovered { index: 3, value: 2.5 });
    }

    #[test]
    fn dense_top_k_orders_by_magnitude() {
        let values = [0.0, -3.0, 1.0, 0.0, 8.0, -8.0];

        let top = top_k_dense(&values, 3);

        assert_eq!(top.len(), 3);
        // tie between |8.0| entries breaks toward the lower index
        assert_eq!(top[0], Recovered { index: 4, value: 8.0 });
        assert_eq!(top[1], Recovered { index: 5, value: -8.0 });
        assert_eq!(top[2], Recovered { index: 1, value: -3.0 });
    }

    #[test]
    fn dense_top_k_skips_zeros() {
        let values = [0.0, 0.0, 0.5];

        let top = top_k_dense(&values, 2);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0], Recovered { index: 2, value: 0.5 });
    }
}
