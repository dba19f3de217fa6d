use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

pub const INITIAL_VARIANCE: f64 = 0.01;

const JITTER_ATTEMPTS: usize = 10;
const JITTER_START: f64 = 1e-10;

/// Mean and covariance of the sampling distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

impl SearchState {
    /// Zero mean, `0.01 * I` covariance.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: DVector::zeros(dim),
            covariance: DMatrix::identity(dim, dim) * INITIAL_VARIANCE,
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Draws `count` i.i.d. vectors from `Normal(mean, covariance)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<DVector<f64>> {
        let factor = sampling_factor(&self.covariance);
        let dim = self.dim();
        (0..count)
            .map(|_| {
                let z: DVector<f64> = DVector::from_fn(dim, |_, _| StandardNormal.sample(rng));
                &self.mean + &factor * z
            })
            .collect()
    }

    /// Moves the distribution onto the elite vectors: componentwise mean and
    /// unbiased sample covariance. With fewer than two elites the covariance
    /// is left unchanged.
    pub fn refit(&mut self, elites: &[&DVector<f64>]) {
        let Some(first) = elites.first() else {
            return;
        };
        let k = elites.len();

        let mut mean = DVector::zeros(first.len());
        for e in elites {
            mean += *e;
        }
        mean /= k as f64;

        if k >= 2 {
            let dim = mean.len();
            let mut cov = DMatrix::zeros(dim, dim);
            for e in elites {
                let d = *e - &mean;
                cov += &d * d.transpose();
            }
            cov /= (k - 1) as f64;
            self.covariance = symmetrize(&cov);
        }
        self.mean = mean;
    }
}

fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    (m + m.transpose()) * 0.5
}

/// Lower-triangular `L` with `L * L^T ≈ cov`.
///
/// Falls back to escalating diagonal jitter when `cov` is not positive
/// definite, and to the diagonal standard deviations after that.
pub fn sampling_factor(cov: &DMatrix<f64>) -> DMatrix<f64> {
    if let Some(chol) = cov.clone().cholesky() {
        return chol.l();
    }

    let n = cov.nrows();
    let scale = if n > 0 {
        (cov.trace() / n as f64).abs()
    } else {
        1.0
    };
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };

    let mut jitter = scale * JITTER_START;
    for _ in 0..JITTER_ATTEMPTS {
        let regularized = cov + DMatrix::identity(n, n) * jitter;
        if let Some(chol) = regularized.cholesky() {
            debug!("Covariance regularized with jitter {:.3e}", jitter);
            return chol.l();
        }
        jitter *= 10.0;
    }

    debug!("Covariance factorization failed; sampling from the diagonal");
    DMatrix::from_diagonal(&cov.diagonal().map(|v| {
        if v.is_finite() && v > 0.0 {
            v.sqrt()
        } else {
            0.0
        }
    }))
}
