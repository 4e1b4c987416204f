use rand::{Rng, SeedableRng, rngs::StdRng};

/// One (bucket, sign) hash pair per table row, derived deterministically from a
/// seed.
///
/// Two families built with the same row count, column count and seed are
/// identical, so sketches built on different workers can be summed cell by
/// cell. There is no shared state: every table derives its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashFamily {
    rows: Vec<RowHashes>,
    cols: usize,
    seed: u64,
}

/// Multiply-add mixing constants for a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowHashes {
    bucket_mul: u64,
    bucket_add: u64,
    sign_mul: u64,
    sign_add: u64,
}

impl HashFamily {
    /// Creates a new `HashFamily`.
    ///
    /// # Args
    /// * `rows` - Number of independent hash rows.
    /// * `cols` - Bucket range of every row hash.
    /// * `seed` - Seed the mixing constants are derived from.
    ///
    /// # Returns
    /// A new `HashFamily` instance.
    pub fn new(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..rows)
            .map(|_| RowHashes {
                // odd multipliers keep the mixing bijective
                bucket_mul: rng.random::<u64>() | 1,
                bucket_add: rng.random(),
                sign_mul: rng.random::<u64>() | 1,
                sign_add: rng.random(),
            })
            .collect();

        Self { rows, cols, seed }
    }

    /// Returns the seed this family was derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the column of `row` that coordinate `index` maps to.
    pub fn bucket(&self, row: usize, index: usize) -> usize {
        let RowHashes {
            bucket_mul,
            bucket_add,
            ..
        } = self.rows[row];

        let mixed = bucket_mul
            .wrapping_mul(index as u64)
            .wrapping_add(bucket_add);

        ((mixed >> 32) % self.cols as u64) as usize
    }

    /// Returns the sign (`1.0` or `-1.0`) coordinate `index` carries in `row`.
    pub fn sign(&self, row: usize, index: usize) -> f32 {
        let RowHashes {
            sign_mul, sign_add, ..
        } = self.rows[row];

        let mixed = sign_mul.wrapping_mul(index as u64).wrapping_add(sign_add);

        if mixed >> 63 == 0 { 1.0 } else { -1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: usize = 5;
    const COLS: usize = 64;

    #[test]
    fn same_seed_gives_identical_family() {
        let a = HashFamily::new(ROWS, COLS, 42);
        let b = HashFamily::new(ROWS, COLS, 42);

        assert_eq!(a, b);
        for row in 0..ROWS {
            for index in 0..1000 {
                assert_eq!(a.bucket(row, index), b.bucket(row, index));
                assert_eq!(a.sign(row, index), b.sign(row, index));
            }
        }
    }

    #[test]
    fn different_seeds_give_different_families() {
        let a = HashFamily::new(ROWS, COLS, 42);
        let b = HashFamily::new(ROWS, COLS, 43);

        assert_ne!(a, b);
    }

    #[test]
    fn buckets_stay_in_range() {
        let family = HashFamily::new(ROWS, COLS, 7);

        for row in 0..ROWS {
            for index in 0..10_000 {
                assert!(family.bucket(row, index) < COLS);
            }
        }
    }

    #[test]
    fn signs_are_unit() {
        let family = HashFamily::new(ROWS, COLS, 7);

        for row in 0..ROWS {
            for index in 0..1000 {
                let sign = family.sign(row, index);
                assert!(sign == 1.0 || sign == -1.0);
            }
        }
    }
}
