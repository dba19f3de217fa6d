use crate::error::{MapfError, MapfResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// A bounded worker pool for evaluating one generation at a time.
///
/// The pool lives as long as the runner; the optimizer creates one per run
/// and drops it when the run ends.
pub struct BatchRunner {
    pool: ThreadPool,
}

impl BatchRunner {
    pub fn new(num_threads: usize) -> MapfResult<Self> {
        if num_threads == 0 {
            return Err(MapfError::Config("worker pool needs at least 1 thread".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("mapf-eval-{}", i))
            .build()
            .map_err(|e| MapfError::Config(format!("cannot build worker pool: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Applies `eval` to every input on the pool and blocks until all are
    /// done. `result[i]` always belongs to `inputs[i]`.
    pub fn run<T, F>(&self, inputs: &[T], eval: F) -> Vec<f64>
    where
        T: Sync,
        F: Fn(&T) -> f64 + Sync + Send,
    {
        self.pool.install(|| inputs.par_iter().map(eval).collect())
    }
}
