//! Run configuration: the nested hyperparameter mapping for one training or
//! evaluation run.
//!
//! The raw mapping is parsed once into a typed tree. Hyperparameter groups that
//! belong to a model backend are tagged with a [`BackendKind`] at parse time, so
//! later consumers (artifact naming, metrics tables) never match on group names.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Key holding the optimizer hyperparameters.
pub const OPTIMIZER_GROUP: &str = "optimizer_hpars";

/// Order mode that requests canonical atom ordering.
pub const CANONICAL_ORDER: &str = "canonical";

/// Backend families whose hyperparameter keys receive a textual prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    VertexTensor,
    Edge,
    EdgeTensor,
}

impl BackendKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::VertexTensor => "vt",
            Self::Edge => "e",
            Self::EdgeTensor => "et",
        }
    }
}

/// A hyperparameter group name bound to a backend kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendGroup {
    pub group: String,
    pub kind: BackendKind,
}

impl BackendGroup {
    pub fn new(group: &str, kind: BackendKind) -> Self {
        Self {
            group: group.to_string(),
            kind,
        }
    }
}

/// Exclusion and prefixing rules used when a configuration is turned into an
/// artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPolicy {
    /// Keys (group names or leaf keys) left out of artifact names.
    #[serde(default = "default_ignored_keys")]
    pub ignored_keys: Vec<String>,
    /// Groups whose leaves are prefixed by their backend kind.
    #[serde(default = "default_backend_groups")]
    pub backend_groups: Vec<BackendGroup>,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            ignored_keys: default_ignored_keys(),
            backend_groups: default_backend_groups(),
        }
    }
}

fn default_ignored_keys() -> Vec<String> {
    vec!["atom_list".to_string(), "optimizer".to_string()]
}

fn default_backend_groups() -> Vec<BackendGroup> {
    vec![
        BackendGroup::new("bvt_hpars", BackendKind::VertexTensor),
        BackendGroup::new("be_hpars", BackendKind::Edge),
        BackendGroup::new("bet_hpars", BackendKind::EdgeTensor),
    ]
}

impl NamingPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, a) in self.backend_groups.iter().enumerate() {
            if self.backend_groups[..i].iter().any(|b| b.group == a.group) {
                return Err(ConfigError::DuplicateBackendGroup {
                    group: a.group.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn backend_kind(&self, group: &str) -> Option<BackendKind> {
        self.backend_groups
            .iter()
            .find(|g| g.group == group)
            .map(|g| g.kind)
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored_keys.iter().any(|k| k == key)
    }
}

/// Post-hoc repair applied to freshly sampled graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStrategy {
    /// Leave samples untouched.
    None,
    /// Copy the upper triangle of each adjacency onto the lower one.
    Mirror,
    /// Resolve each asymmetric bond pair with a fair coin.
    Random,
}

impl FixStrategy {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "none" => Ok(Self::None),
            "mirror" => Ok(Self::Mirror),
            "random" => Ok(Self::Random),
            other => Err(ConfigError::UnknownFixStrategy {
                name: other.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mirror => "mirror",
            Self::Random => "random",
        }
    }
}

/// Settings for the gradient-based optimizer, read from `optimizer_hpars`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default = "default_lr")]
    pub lr: f64,
    #[serde(default = "default_betas")]
    pub betas: [f64; 2],
    #[serde(default = "default_eps")]
    pub eps: f64,
    #[serde(default)]
    pub weight_decay: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            lr: default_lr(),
            betas: default_betas(),
            eps: default_eps(),
            weight_decay: 0.0,
        }
    }
}

fn default_lr() -> f64 {
    1e-3
}

fn default_betas() -> [f64; 2] {
    [0.9, 0.999]
}

fn default_eps() -> f64 {
    1e-8
}

impl OptimizerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(ConfigError::invalid("lr", "must be a finite value > 0"));
        }
        if self.betas.iter().any(|b| !(0.0..1.0).contains(b)) {
            return Err(ConfigError::invalid("betas", "must lie in [0, 1)"));
        }
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(ConfigError::invalid("eps", "must be a finite value > 0"));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(ConfigError::invalid("weight_decay", "must be >= 0"));
        }
        Ok(())
    }
}

/// How a group's leaves are keyed when the tree is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Plain,
    Backend(BackendKind),
}

/// A node of the parsed configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Leaf(Value),
    Group(ConfigGroup),
}

/// An ordered group of hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigGroup {
    pub kind: GroupKind,
    pub entries: Vec<(String, ConfigNode)>,
}

impl ConfigGroup {
    fn from_map(map: Map<String, Value>, kind: GroupKind, policy: &NamingPolicy) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let node = match value {
                    Value::Object(inner) => {
                        let kind = policy
                            .backend_kind(&key)
                            .map_or(GroupKind::Plain, GroupKind::Backend);
                        ConfigNode::Group(Self::from_map(inner, kind, policy))
                    }
                    leaf => ConfigNode::Leaf(leaf),
                };
                (key, node)
            })
            .collect();
        Self { kind, entries }
    }

    fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    fn flatten_into(
        &self,
        prefix: Option<&str>,
        skip: &dyn Fn(&str) -> bool,
        out: &mut Map<String, Value>,
    ) {
        let prefix = match self.kind {
            GroupKind::Backend(kind) => Some(kind.prefix()),
            GroupKind::Plain => prefix,
        };
        for (key, node) in &self.entries {
            if skip(key) {
                continue;
            }
            match node {
                ConfigNode::Group(group) => group.flatten_into(prefix, skip, out),
                ConfigNode::Leaf(value) => {
                    let flat_key = match prefix {
                        Some(p) => format!("{p}{key}"),
                        None => key.clone(),
                    };
                    if skip(&flat_key) {
                        continue;
                    }
                    // Later duplicates overwrite in place; the first position wins.
                    out.insert(flat_key, value.clone());
                }
            }
        }
    }
}

/// A parsed, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    tree: ConfigGroup,
    dataset: String,
    model: String,
    order: String,
    fix: FixStrategy,
    num_epochs: usize,
    optimizer: OptimizerSettings,
}

impl RunConfig {
    /// Parse a nested hyperparameter mapping.
    pub fn parse(value: Value, policy: &NamingPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAMapping);
        };
        let tree = ConfigGroup::from_map(map, GroupKind::Plain, policy);

        let dataset = required_str(&tree, "dataset")?;
        let model = required_str(&tree, "model")?;
        let order = required_str(&tree, "order")?;
        let fix = FixStrategy::from_name(&required_str(&tree, "fix")?)?;

        let num_epochs = match tree.get("num_epochs") {
            Some(ConfigNode::Leaf(v)) => v
                .as_u64()
                .filter(|n| *n >= 1)
                .ok_or_else(|| ConfigError::invalid("num_epochs", "must be an integer >= 1"))?,
            Some(ConfigNode::Group(_)) => {
                return Err(ConfigError::invalid("num_epochs", "must be an integer >= 1"));
            }
            None => return Err(ConfigError::missing("num_epochs")),
        };
        let num_epochs = usize::try_from(num_epochs)
            .map_err(|_| ConfigError::invalid("num_epochs", "out of range"))?;

        let optimizer = match tree.get(OPTIMIZER_GROUP) {
            None => OptimizerSettings::default(),
            Some(node) => serde_json::from_value(node_to_value(node))
                .map_err(|e| ConfigError::invalid(OPTIMIZER_GROUP, e.to_string()))?,
        };
        optimizer.validate()?;

        Ok(Self {
            tree,
            dataset,
            model,
            order,
            fix,
            num_epochs,
            optimizer,
        })
    }

    /// Read and parse a run configuration stored as JSON.
    pub fn from_json_file(path: &Path, policy: &NamingPolicy) -> Result<Self, crate::CoreError> {
        let value = crate::persistence::load_json::<Value>(path)?.ok_or_else(|| {
            ConfigError::Load {
                message: format!("run configuration not found: {}", path.display()),
            }
        })?;
        Ok(Self::parse(value, policy)?)
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn is_canonical(&self) -> bool {
        self.order == CANONICAL_ORDER
    }

    pub fn fix(&self) -> FixStrategy {
        self.fix
    }

    pub fn num_epochs(&self) -> usize {
        self.num_epochs
    }

    pub fn optimizer(&self) -> &OptimizerSettings {
        &self.optimizer
    }

    pub fn tree(&self) -> &ConfigGroup {
        &self.tree
    }

    /// Every leaf of the tree keyed by its (backend-prefixed) leaf name.
    pub fn flatten(&self) -> Map<String, Value> {
        self.flatten_filtered(|_| false)
    }

    /// Like [`flatten`](Self::flatten) but skipping groups and leaves for which
    /// `skip` returns true.
    pub fn flatten_filtered(&self, skip: impl Fn(&str) -> bool) -> Map<String, Value> {
        let mut out = Map::new();
        self.tree.flatten_into(None, &skip, &mut out);
        out
    }
}

/// Render a leaf value the way it appears in artifact names and tables.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(_) => value.to_string(),
    }
}

fn required_str(tree: &ConfigGroup, key: &str) -> Result<String, ConfigError> {
    match tree.get(key) {
        Some(ConfigNode::Leaf(Value::String(s))) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(ConfigError::invalid(key, "must be a non-empty string")),
        None => Err(ConfigError::missing(key)),
    }
}

fn node_to_value(node: &ConfigNode) -> Value {
    match node {
        ConfigNode::Leaf(v) => v.clone(),
        ConfigNode::Group(group) => Value::Object(
            group
                .entries
                .iter()
                .map(|(k, n)| (k.clone(), node_to_value(n)))
                .collect(),
        ),
    }
}
