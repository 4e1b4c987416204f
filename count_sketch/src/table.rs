use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2};

use crate::{
    SketchErr,
    error::Result,
    family::HashFamily,
};

/// A count sketch: an r×c grid of signed accumulators plus the hash family
/// that scatters coordinates into it.
///
/// The sketch is linear: accumulating `a + b` produces the same cells as
/// accumulating `a` and `b` into two tables with the same seed and summing
/// them. That property is what lets workers sketch locally and combine
/// tables instead of shipping dense vectors.
#[derive(Debug, Clone)]
pub struct SketchTable {
    cells: Array2<f32>,
    hashes: HashFamily,
}

impl SketchTable {
    /// Creates a zeroed `SketchTable`.
    ///
    /// # Args
    /// * `rows` - Number of independent hash rows.
    /// * `cols` - Number of buckets per row.
    /// * `seed` - Hash family seed; identical seeds make tables addable.
    ///
    /// # Returns
    /// A new `SketchTable` instance.
    pub fn new(rows: NonZeroUsize, cols: NonZeroUsize, seed: u64) -> Self {
        Self {
            cells: Array2::zeros((rows.get(), cols.get())),
            hashes: HashFamily::new(rows.get(), cols.get(), seed),
        }
    }

    /// Returns the number of hash rows.
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Returns the number of buckets per row.
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Returns the hash family seed.
    pub fn seed(&self) -> u64 {
        self.hashes.seed()
    }

    /// Returns a read-only view of the accumulator grid.
    pub fn cells(&self) -> ArrayView2<'_, f32> {
        self.cells.view()
    }

    /// Folds a single coordinate into every row of the table.
    pub fn accumulate_entry(&mut self, index: usize, value: f32) {
        for row in 0..self.rows() {
            let col = self.hashes.bucket(row, index);
            self.cells[[row, col]] += self.hashes.sign(row, index) * value;
        }
    }

    /// Folds a dense vector into the table, skipping zero entries.
    pub fn accumulate(&mut self, vector: &[f32]) {
        for (index, &value) in vector.iter().enumerate() {
            if value != 0.0 {
                self.accumulate_entry(index, value);
            }
        }
    }

    /// Adds another table into this one, cell by cell.
    ///
    /// # Errors
    /// Returns `SketchErr` when the tables disagree on shape or hash family,
    /// in which case their cells are not comparable.
    pub fn add(&mut self, other: &SketchTable) -> Result<()> {
        if self.rows() != other.rows() {
            return Err(SketchErr::ShapeMismatch {
                what: "sketch rows",
                got: other.rows(),
                expected: self.rows(),
            });
        }

        if self.cols() != other.cols() {
            return Err(SketchErr::ShapeMismatch {
                what: "sketch cols",
                got: other.cols(),
                expected: self.cols(),
            });
        }

        if self.seed() != other.seed() {
            return Err(SketchErr::FamilyMismatch {
                got: other.seed(),
                expected: self.seed(),
            });
        }

        self.cells += &other.cells;
        Ok(())
    }

    /// Estimates the accumulated value of one coordinate.
    ///
    /// Each row votes with its signed bucket content; the median across rows
    /// keeps a single colliding row from corrupting the estimate. With one
    /// row the estimate is the raw bucket value, collisions included.
    pub fn estimate(&self, index: usize) -> f32 {
        let mut votes: Vec<f32> = (0..self.rows())
            .map(|row| {
                let col = self.hashes.bucket(row, index);
                self.hashes.sign(row, index) * self.cells[[row, col]]
            })
            .collect();

        votes.sort_by(f32::total_cmp);

        let mid = votes.len() / 2;
        if votes.len() % 2 == 1 {
            votes[mid]
        } else {
            (votes[mid - 1] + votes[mid]) / 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const SEED: u64 = 42;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// Integer-valued vector so every f32 addition in the test is exact.
    fn integer_vector(dim: usize, rng: &mut StdRng) -> Vec<f32> {
        (0..dim).map(|_| rng.random_range(-8..=8) as f32).collect()
    }

    #[test]
    fn sketch_is_linear() {
        const DIM: usize = 64;

        let mut rng = StdRng::seed_from_u64(7);
        let a = integer_vector(DIM, &mut rng);
        let b = integer_vector(DIM, &mut rng);
        let sum: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();

        let mut table_a = SketchTable::new(nz(4), nz(32), SEED);
        let mut table_b = SketchTable::new(nz(4), nz(32), SEED);
        let mut table_sum = SketchTable::new(nz(4), nz(32), SEED);

        table_a.accumulate(&a);
        table_b.accumulate(&b);
        table_sum.accumulate(&sum);

        table_a.add(&table_b).unwrap();
        assert_eq!(table_a.cells(), table_sum.cells());
    }

    #[test]
    fn estimates_are_exact_at_low_load() {
        const DIM: usize = 1000;
        const SIGNIFICANT: [(usize, f32); 5] =
            [(3, 10.0), (117, -4.0), (256, 7.5), (600, -2.25), (999, 1.0)];

        let mut table = SketchTable::new(nz(7), nz(512), SEED);
        for (index, value) in SIGNIFICANT {
            table.accumulate_entry(index, value);
        }

        for (index, value) in SIGNIFICANT {
            assert_eq!(table.estimate(index), value);
        }
        assert_eq!(table.estimate(DIM / 2), 0.0);
    }

    #[test]
    fn colliding_coordinates_superpose() {
        let mut table = SketchTable::new(nz(1), nz(1), SEED);
        table.accumulate(&[2.0, 3.0]);

        let est = (table.estimate(0), table.estimate(1));

        // one cell holds s0*2 + s1*3; the per-coordinate estimates either
        // both read the combined mass or split it with opposite signs
        assert!(est == (5.0, 5.0) || est == (-1.0, 1.0), "got {est:?}");
    }

    #[test]
    fn add_rejects_mismatched_shape() {
        let mut a = SketchTable::new(nz(2), nz(8), SEED);
        let b = SketchTable::new(nz(3), nz(8), SEED);

        assert!(matches!(
            a.add(&b),
            Err(SketchErr::ShapeMismatch { what: "sketch rows", .. })
        ));
    }

    #[test]
    fn add_rejects_mismatched_family() {
        let mut a = SketchTable::new(nz(2), nz(8), SEED);
        let b = SketchTable::new(nz(2), nz(8), SEED + 1);

        assert!(matches!(a.add(&b), Err(SketchErr::FamilyMismatch { .. })));
    }

    #[test]
    fn accumulate_skips_zeros() {
        let mut sparse = SketchTable::new(nz(3), nz(16), SEED);
        let mut manual = SketchTable::new(nz(3), nz(16), SEED);

        sparse.accumulate(&[0.0, 1.5, 0.0, -2.0, 0.0]);
        manual.accumulate_entry(1, 1.5);
        manual.accumulate_entry(3, -2.0);

        assert_eq!(sparse.cells(), manual.cells());
    }
}
