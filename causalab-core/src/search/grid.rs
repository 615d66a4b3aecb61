//! Hyperparameter grids.

use crate::adapter::ParamSet;
use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate values per parameter; the search space is their Cartesian product.
///
/// Parameters are enumerated in name order and the last parameter varies
/// fastest, so enumeration order is stable across runs and platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterGrid {
    params: BTreeMap<String, Vec<serde_json::Value>>,
}

impl HyperparameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_param<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.insert(name, values);
        self
    }

    pub fn insert<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.params
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Every parameter must have at least one candidate.
    pub fn validate(&self) -> Result<(), SearchError> {
        match self.params.iter().find(|(_, values)| values.is_empty()) {
            Some((name, _)) => Err(SearchError::EmptyParameter { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Number of combinations.
    pub fn size(&self) -> usize {
        self.params.values().map(Vec::len).product()
    }

    /// All combinations in enumeration order.
    ///
    /// An empty grid yields a single empty combination (backend defaults).
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combos = vec![ParamSet::new()];
        for (name, values) in &self.params {
            let mut expanded = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut next = combo.clone();
                    next.insert(name.clone(), value.clone());
                    expanded.push(next);
                }
            }
            combos = expanded;
        }
        combos
    }
}

/// Render a combination as `name=value, ...` for logs.
pub fn describe(params: &ParamSet) -> String {
    if params.is_empty() {
        return "<defaults>".to_string();
    }
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
