use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};

use crate::matrix::Matrix;

/// The generator used for weight initialisation and dataset shuffling.
pub type Rand = StdRng;

pub fn seeded(seed: u64) -> Rand {
    StdRng::seed_from_u64(seed)
}

/// Seeds from the operating system, for runs that do not need to be reproducible.
pub fn from_entropy() -> Rand {
    StdRng::from_entropy()
}

/// Standard deviation of the Xavier scheme for a layer of `rows` units fed by `cols` units.
pub fn xavier_stdev(rows: usize, cols: usize) -> f64 {
    (2.0 / (rows + cols) as f64).sqrt()
}

/// Fills a `rows x cols` matrix with samples from `N(0, 2 / (rows + cols))`.
pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Matrix, NormalError> {
    let dist = Normal::new(0.0, xavier_stdev(rows, cols))?;

    let mut weights = Matrix::zeroed(rows, cols);
    for w in weights.vals_mut() {
        *w = dist.sample(rng);
    }

    Ok(weights)
}

/// A uniformly random ordering of `0..n`.
pub fn permutation<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_permutation() {
        let mut rng = seeded(7);
        let mut perm = permutation(50, &mut rng);
        perm.sort_unstable();
        assert_eq!(perm, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_stream() {
        let a = xavier(4, 3, &mut seeded(11)).unwrap();
        let b = xavier(4, 3, &mut seeded(11)).unwrap();
        assert_eq!(a, b);
    }
}
