//! Evaluation artifacts: the one-row metrics table and the molecule grids.

use crate::chem::{Molecule, MoleculeRenderer};
use crate::error::MlResult;
use crate::eval::metrics::MetricSnapshot;
use molgen_core::{GridLayout, persistence, render_value};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column holding the checkpoint the metrics were computed from.
pub const MODEL_PATH_COLUMN: &str = "model_path";

/// Everything one evaluation produced.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    /// Flattened, backend-prefixed run configuration (nothing ignored).
    pub config: Map<String, Value>,
    pub metrics: MetricSnapshot,
    pub model_path: PathBuf,
}

impl EvaluationRecord {
    /// Header and values of the table row: configuration columns, then
    /// metrics, then [`MODEL_PATH_COLUMN`]. A metric sharing a name with a
    /// configuration key replaces that column's value in place.
    pub fn row(&self) -> Vec<(String, String)> {
        let mut row: Vec<(String, String)> = self
            .config
            .iter()
            .map(|(k, v)| (k.clone(), render_value(v)))
            .collect();
        for (name, value) in self.metrics.iter() {
            upsert(&mut row, name, value.to_string());
        }
        upsert(
            &mut row,
            MODEL_PATH_COLUMN,
            self.model_path.display().to_string(),
        );
        row
    }

    /// Write the record as a headed single-row CSV at `path`.
    pub fn write_csv(&self, path: &Path) -> MlResult<()> {
        let (header, values): (Vec<String>, Vec<String>) = self.row().into_iter().unzip();

        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(Vec::new());
        writer.write_record(&header)?;
        writer.write_record(&values)?;
        writer.flush()?;
        let data = writer.into_inner().map_err(|e| e.into_error())?;

        persistence::atomic_write(path, &data)?;
        debug!(path = %path.display(), columns = header.len(), "metrics table written");
        Ok(())
    }
}

fn upsert(row: &mut Vec<(String, String)>, key: &str, value: String) {
    match row.iter_mut().find(|(k, _)| k == key) {
        Some(slot) => slot.1 = value,
        None => row.push((key.to_string(), value)),
    }
}

/// Render the leading `layout.max_molecules` molecules to `path`.
pub fn write_grid(
    renderer: &dyn MoleculeRenderer,
    molecules: &[Molecule],
    layout: &GridLayout,
    path: &Path,
) -> MlResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let shown = &molecules[..molecules.len().min(layout.max_molecules)];
    renderer.render_grid(shown, layout, path)?;
    debug!(path = %path.display(), molecules = shown.len(), "image grid written");
    Ok(())
}
