use crate::error::{MapfError, MapfResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Samples drawn per generation.
    #[arg(long, default_value_t = 100)]
    pub num_samples: usize,
    /// Lowest-cost samples kept for the refit.
    #[arg(long, default_value_t = 10)]
    pub num_elite: usize,
    /// Generations to run.
    #[arg(long, default_value_t = 20)]
    pub maxiter: usize,

    /// Worker threads for cost evaluation (defaults to available parallelism).
    #[arg(long)]
    pub threads: Option<usize>,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    /// Forwarded verbatim to the pathfinding solver.
    #[arg(long, default_value_t = false)]
    pub disjoint: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            num_samples: 100,
            num_elite: 10,
            maxiter: 20,
            threads: None,
            seed: None,
            disjoint: false,
        }
    }
}

impl SearchParams {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> MapfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MapfError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let params: SearchParams = serde_json::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> MapfResult<()> {
        if self.num_samples == 0 {
            return Err(MapfError::Config("num_samples must be at least 1".into()));
        }
        if self.num_elite == 0 {
            return Err(MapfError::Config("num_elite must be at least 1".into()));
        }
        if self.threads == Some(0) {
            return Err(MapfError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(default_threads)
    }

    /// Overlays the flags the user typed on the command line; defaults never
    /// override values loaded from a file.
    pub fn merge_from_cli(&mut self, cli: &SearchParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(num_samples, "num_samples");
        update_if_present!(num_elite, "num_elite");
        update_if_present!(maxiter, "maxiter");
        update_if_present!(threads, "threads");
        update_if_present!(seed, "seed");
        update_if_present!(disjoint, "disjoint");
    }
}

pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
