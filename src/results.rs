//! Persisted outputs: one result row per instance and one convergence trace.

use crate::error::MapfResult;
use crate::grid::Coord;
use crate::optimizer::evaluate::format_permutation;
use crate::optimizer::{CemResult, ResultNote};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub instance: String,
    pub final_cost: f64,
    /// Goals in agent order, `r-c;r-c;...`.
    pub permutation: String,
    pub note: ResultNote,
}

impl ResultRecord {
    pub fn new(instance: &str, cost: f64, permutation: &[Coord], note: ResultNote) -> Self {
        Self {
            instance: instance.to_string(),
            final_cost: cost,
            permutation: format_permutation(permutation),
            note,
        }
    }

    pub fn from_result(instance: &str, result: &CemResult) -> Self {
        Self::new(instance, result.cost, &result.permutation, result.note)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TraceRow {
    generation: usize,
    best_cost: f64,
}

/// Appends one row, writing the header only when the file is new or empty.
pub fn append_record<P: AsRef<Path>>(path: P, record: &ResultRecord) -> MapfResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;

    debug!("Appended result for '{}' to {:?}", record.instance, path);
    Ok(())
}

pub fn read_records<P: AsRef<Path>>(path: P) -> MapfResult<Vec<ResultRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Writes the best-cost-per-generation curve as `generation,best_cost`.
pub fn write_trace<P: AsRef<Path>>(path: P, trace: &[f64]) -> MapfResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut wtr = csv::Writer::from_path(path)?;
    for (generation, &best_cost) in trace.iter().enumerate() {
        wtr.serialize(TraceRow {
            generation,
            best_cost,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_trace<P: AsRef<Path>>(path: P) -> MapfResult<Vec<f64>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut trace = Vec::new();
    for row in rdr.deserialize::<TraceRow>() {
        trace.push(row?.best_cost);
    }
    Ok(trace)
}

/// `<out>/traces/<stem>_cem_trace.csv` for an instance file name.
pub fn trace_path(out_dir: &Path, instance_name: &str) -> PathBuf {
    let stem = Path::new(instance_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| instance_name.to_string());
    out_dir
        .join("traces")
        .join(format!("{}_cem_trace.csv", stem))
}

fn ensure_parent(path: &Path) -> MapfResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
