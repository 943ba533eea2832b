//! Structural repair of raw samples.
//!
//! After any non-`none` strategy every graph in the batch has a symmetric
//! adjacency, no self-bonds, and no bonds touching an empty atom slot.

use crate::graph::{DatasetInfo, GraphBatch};
use molgen_core::FixStrategy;
use ndarray::{Axis, s};
use rand::Rng;

/// Repair `batch` in place.
pub fn apply_fix<R: Rng + ?Sized>(
    strategy: FixStrategy,
    batch: &mut GraphBatch,
    dataset: &DatasetInfo,
    rng: &mut R,
) {
    if strategy == FixStrategy::None {
        return;
    }
    let n = batch.max_atoms();
    let (nodes, edges) = batch.parts_mut();

    for (atoms, mut adj) in nodes.outer_iter().zip(edges.outer_iter_mut()) {
        for i in 0..n {
            for j in (i + 1)..n {
                let (upper, lower) = (adj[[i, j]], adj[[j, i]]);
                if upper == lower {
                    continue;
                }
                let bond = match strategy {
                    FixStrategy::Random if rng.gen_bool(0.5) => lower,
                    _ => upper,
                };
                adj[[i, j]] = bond;
                adj[[j, i]] = bond;
            }
            adj[[i, i]] = dataset.no_bond;
        }

        for (i, &atom) in atoms.iter().enumerate() {
            if atom == dataset.empty_atom {
                adj.slice_mut(s![i, ..]).fill(dataset.no_bond);
                adj.index_axis_mut(Axis(1), i).fill(dataset.no_bond);
            }
        }
    }
}
