//! Molecular graph batches and the loaders that stream them.
//!
//! A batch of `B` graphs padded to `N` atoms is a node tensor of shape `[B, N]`
//! holding atom-type indices and an edge tensor of shape `[B, N, N]` holding
//! bond-type indices. Which index means "no atom" / "no bond" is described by
//! [`DatasetInfo`].

use crate::error::{MlError, MlResult};
use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// Descriptor of a molecular dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub max_atoms: usize,
    pub atom_list: Vec<String>,
    /// Node value marking an absent atom.
    pub empty_atom: i64,
    /// Edge value marking an absent bond.
    pub no_bond: i64,
}

impl DatasetInfo {
    /// Padding atoms take the index one past the atom vocabulary; bond 0 is
    /// "no bond".
    pub fn new(name: &str, max_atoms: usize, atom_list: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            max_atoms,
            atom_list: atom_list.iter().map(|a| a.to_string()).collect(),
            empty_atom: atom_list.len() as i64,
            no_bond: 0,
        }
    }
}

/// A single graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSample {
    pub nodes: Array1<i64>,
    pub edges: Array2<i64>,
}

/// A batch of graphs sharing the same padding size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphBatch {
    nodes: Array2<i64>,
    edges: Array3<i64>,
}

impl GraphBatch {
    pub fn new(nodes: Array2<i64>, edges: Array3<i64>) -> MlResult<Self> {
        let (b, n) = nodes.dim();
        let (eb, en, em) = edges.dim();
        if b != eb || n != en || n != em {
            return Err(MlError::shape(format!(
                "nodes [{b}, {n}] incompatible with edges [{eb}, {en}, {em}]"
            )));
        }
        Ok(Self { nodes, edges })
    }

    /// A batch with no graphs.
    pub fn empty(max_atoms: usize) -> Self {
        Self {
            nodes: Array2::zeros((0, max_atoms)),
            edges: Array3::zeros((0, max_atoms, max_atoms)),
        }
    }

    /// Stack individual graphs into a batch.
    pub fn from_samples(samples: &[GraphSample], max_atoms: usize) -> MlResult<Self> {
        let mut nodes = Array2::zeros((samples.len(), max_atoms));
        let mut edges = Array3::zeros((samples.len(), max_atoms, max_atoms));
        for (i, sample) in samples.iter().enumerate() {
            if sample.nodes.len() != max_atoms || sample.edges.dim() != (max_atoms, max_atoms) {
                return Err(MlError::shape(format!(
                    "sample {i} is not padded to {max_atoms} atoms"
                )));
            }
            nodes.row_mut(i).assign(&sample.nodes);
            edges.index_axis_mut(Axis(0), i).assign(&sample.edges);
        }
        Ok(Self { nodes, edges })
    }

    pub fn nodes(&self) -> &Array2<i64> {
        &self.nodes
    }

    pub fn edges(&self) -> &Array3<i64> {
        &self.edges
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Array2<i64>, &mut Array3<i64>) {
        (&mut self.nodes, &mut self.edges)
    }

    pub fn len(&self) -> usize {
        self.nodes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_atoms(&self) -> usize {
        self.nodes.ncols()
    }

    /// Copy out the `i`-th graph.
    pub fn sample(&self, i: usize) -> Option<GraphSample> {
        if i >= self.len() {
            return None;
        }
        Some(GraphSample {
            nodes: self.nodes.row(i).to_owned(),
            edges: self.edges.index_axis(Axis(0), i).to_owned(),
        })
    }

    pub fn samples(&self) -> impl Iterator<Item = GraphSample> + '_ {
        (0..self.len()).filter_map(|i| self.sample(i))
    }
}

/// A finite stream of mini-batches.
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    batches: Vec<GraphBatch>,
}

impl GraphLoader {
    pub fn new(batches: Vec<GraphBatch>) -> Self {
        Self { batches }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphBatch> {
        self.batches.iter()
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl<'a> IntoIterator for &'a GraphLoader {
    type Item = &'a GraphBatch;
    type IntoIter = std::slice::Iter<'a, GraphBatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Train / validation / test streams of one dataset.
#[derive(Debug, Clone, Default)]
pub struct DataLoaders {
    pub train: GraphLoader,
    pub valid: GraphLoader,
    pub test: GraphLoader,
}

/// A dataset descriptor bundled with its loaders.
#[derive(Debug, Clone)]
pub struct MolecularData {
    pub info: DatasetInfo,
    pub loaders: DataLoaders,
}

impl MolecularData {
    pub fn new(info: DatasetInfo, loaders: DataLoaders) -> Self {
        Self { info, loaders }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_graphs() -> GraphBatch {
        GraphBatch::new(
            array![[0, 1], [2, 2]],
            array![[[0, 1], [1, 0]], [[0, 0], [0, 0]]],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_validation() {
        let err = GraphBatch::new(Array2::zeros((2, 3)), Array3::zeros((2, 3, 4)));
        assert!(matches!(err, Err(MlError::Shape(_))));
        let err = GraphBatch::new(Array2::zeros((1, 3)), Array3::zeros((2, 3, 3)));
        assert!(err.is_err());
    }

    #[test]
    fn test_sample_and_restack() {
        let batch = two_graphs();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.max_atoms(), 2);

        let samples: Vec<GraphSample> = batch.samples().collect();
        assert_eq!(samples[0].nodes, array![0, 1]);
        assert_eq!(samples[0].edges, array![[0, 1], [1, 0]]);

        let restacked = GraphBatch::from_samples(&samples, 2).unwrap();
        assert_eq!(restacked, batch);
        assert!(batch.sample(2).is_none());
    }

    #[test]
    fn test_from_samples_rejects_wrong_padding() {
        let sample = GraphSample {
            nodes: array![0, 1, 2],
            edges: Array2::zeros((3, 3)),
        };
        assert!(GraphBatch::from_samples(&[sample], 2).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let batch = GraphBatch::empty(9);
        assert!(batch.is_empty());
        assert_eq!(batch.max_atoms(), 9);
    }

    #[test]
    fn test_dataset_info_padding_index() {
        let info = DatasetInfo::new("qm9", 9, &["C", "N", "O", "F"]);
        assert_eq!(info.empty_atom, 4);
        assert_eq!(info.no_bond, 0);
    }

    #[test]
    fn test_loader_len() {
        let loader = GraphLoader::new(vec![two_graphs(), two_graphs()]);
        assert_eq!(loader.len(), 2);
        assert_eq!(loader.iter().count(), 2);
        assert!(GraphLoader::default().is_empty());
    }
}
