//! Chemistry collaborators: validity checking, canonicalization and rendering.
//!
//! These are implemented outside this crate (typically over a cheminformatics
//! toolkit); the training and evaluation flows only call through the traits.

use crate::error::MlResult;
use crate::graph::{DatasetInfo, GraphBatch, GraphSample};
use molgen_core::GridLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A decoded molecule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Molecule {
    /// SMILES string, `None` when the graph does not decode.
    pub smiles: Option<String>,
}

impl Molecule {
    pub fn is_valid(&self) -> bool {
        self.smiles.is_some()
    }
}

/// Reports which graphs of a batch are chemically valid.
pub trait MoleculeValidator {
    /// One entry per graph in `batch`: the graph to keep when valid (its
    /// canonical form when `canonical` is set), `None` otherwise.
    fn validate(
        &self,
        batch: &GraphBatch,
        dataset: &DatasetInfo,
        canonical: bool,
    ) -> MlResult<Vec<Option<GraphSample>>>;
}

/// Draws a grid image of molecules.
pub trait MoleculeRenderer {
    fn render_grid(&self, molecules: &[Molecule], layout: &GridLayout, path: &Path)
    -> MlResult<()>;
}
