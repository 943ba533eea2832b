//! Deterministic artifact naming.
//!
//! Every artifact of a run (checkpoint, metrics table, image grids) lives under
//! `<base>/<root>/<dataset>/<model>/<stem>` where `<stem>` is derived from the
//! run configuration alone:
//!
//! ```text
//! <base>/ckpt/<dataset>/<model>/<stem>.json
//! <base>/eval/metrics/<dataset>/<model>/<stem>.csv
//! <base>/eval/images/<dataset>/<model>/<stem>_{san,res}.<ext>
//! ```
//!
//! Keys listed in the [`NamingPolicy`] are excluded from the stem, so two runs
//! differing only in those keys share their artifacts.

use crate::hyperparams::{NamingPolicy, RunConfig, render_value};
use std::path::{Path, PathBuf};

/// Extension of serialized model checkpoints.
pub const CHECKPOINT_EXTENSION: &str = "json";

/// Suffix of the image grid rendered from raw samples.
pub const SAMPLED_IMAGE_SUFFIX: &str = "san";

/// Suffix of the image grid rendered from resampled, valid molecules.
pub const RESAMPLED_IMAGE_SUFFIX: &str = "res";

/// Build the canonical `key=value` stem for a run configuration.
///
/// Keys are joined with `_` in flattening order.
pub fn config_stem(run: &RunConfig, policy: &NamingPolicy) -> String {
    run.flatten_filtered(|key| policy.is_ignored(key))
        .iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect::<Vec<_>>()
        .join("_")
}

/// Filesystem layout for run artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    base: PathBuf,
    policy: NamingPolicy,
}

impl ArtifactLayout {
    pub fn new(base: PathBuf, policy: NamingPolicy) -> Self {
        Self { base, policy }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    pub fn stem(&self, run: &RunConfig) -> String {
        config_stem(run, &self.policy)
    }

    pub fn checkpoint_dir(&self, run: &RunConfig) -> PathBuf {
        self.run_dir(&["ckpt"], run)
    }

    pub fn checkpoint_path(&self, run: &RunConfig) -> PathBuf {
        self.checkpoint_dir(run)
            .join(format!("{}.{CHECKPOINT_EXTENSION}", self.stem(run)))
    }

    pub fn metrics_dir(&self, run: &RunConfig) -> PathBuf {
        self.run_dir(&["eval", "metrics"], run)
    }

    pub fn metrics_path(&self, run: &RunConfig) -> PathBuf {
        self.metrics_dir(run).join(format!("{}.csv", self.stem(run)))
    }

    pub fn images_dir(&self, run: &RunConfig) -> PathBuf {
        self.run_dir(&["eval", "images"], run)
    }

    pub fn image_path(&self, run: &RunConfig, suffix: &str, extension: &str) -> PathBuf {
        self.images_dir(run)
            .join(format!("{}_{suffix}.{extension}", self.stem(run)))
    }

    fn run_dir(&self, roots: &[&str], run: &RunConfig) -> PathBuf {
        let mut dir = self.base.clone();
        for root in roots {
            dir.push(root);
        }
        dir.join(run.dataset()).join(run.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run() -> RunConfig {
        RunConfig::parse(
            json!({
                "dataset": "qm9",
                "model": "btree",
                "order": "canonical",
                "fix": "none",
                "num_epochs": 5,
                "model_hpars": { "nl": 2, "bvt_hpars": { "ns": 40 }, "bet_hpars": { "nr": 8 } },
                "atom_list": ["C", "N"],
                "optimizer_hpars": { "lr": 0.05 },
            }),
            &NamingPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_config_stem() {
        assert_eq!(
            config_stem(&run(), &NamingPolicy::default()),
            "dataset=qm9_model=btree_order=canonical_fix=none_num_epochs=5_nl=2_vtns=40_etnr=8_lr=0.05"
        );
    }

    #[test]
    fn test_ignored_group_dropped() {
        let mut policy = NamingPolicy::default();
        policy.ignored_keys.push("optimizer_hpars".to_string());
        assert!(!config_stem(&run(), &policy).contains("lr="));
    }

    #[test]
    fn test_layout_paths() {
        let layout = ArtifactLayout::new(PathBuf::from("/tmp/results"), NamingPolicy::default());
        let run = run();
        let stem = layout.stem(&run);

        assert_eq!(
            layout.checkpoint_path(&run),
            PathBuf::from(format!("/tmp/results/ckpt/qm9/btree/{stem}.json"))
        );
        assert_eq!(
            layout.metrics_path(&run),
            PathBuf::from(format!("/tmp/results/eval/metrics/qm9/btree/{stem}.csv"))
        );
        assert_eq!(
            layout.image_path(&run, SAMPLED_IMAGE_SUFFIX, "png"),
            PathBuf::from(format!("/tmp/results/eval/images/qm9/btree/{stem}_san.png"))
        );
    }
}
