//! Named trainable parameter sets.
//!
//! A [`ParameterSet`] is an ordered `name -> Var` mapping. It is what the
//! backbone hands out for its base and adapter weights, what
//! [`RewardScorer::finetune_parameters`](crate::scoring::RewardScorer::finetune_parameters)
//! returns to an optimizer, and what persistence reads and writes.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::collections::HashMap;

use candle_core::{Tensor, Var};

#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    params: BTreeMap<String, Var>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, var: Var) -> Option<Var> {
        self.params.insert(name.into(), var)
    }

    /// Merges `other` into `self`, prefixing every name with `"{prefix}."`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: ParameterSet) {
        for (name, var) in other.params {
            self.params.insert(format!("{prefix}.{name}"), var);
        }
    }

    /// Returns a new set with the parameters of both (names from `other` win on collision).
    pub fn union(mut self, other: ParameterSet) -> Self {
        self.params.extend(other.params);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Var> {
        self.params.get(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Var)> {
        self.params.iter().map(|(name, var)| (name.as_str(), var))
    }

    /// Variables in name order, ready for `candle_nn::Optimizer::new`.
    pub fn vars(&self) -> Vec<Var> {
        self.params.values().cloned().collect()
    }

    /// Total number of scalar elements across all parameters.
    pub fn num_elements(&self) -> usize {
        self.params.values().map(|v| v.elem_count()).sum()
    }

    /// Returns `true` if `tensor` is one of the variables in this set (identity, not value).
    pub fn contains_tensor(&self, tensor: &Tensor) -> bool {
        let id = tensor.id();
        self.params.values().any(|v| v.as_tensor().id() == id)
    }

    /// Snapshot of the current values, keyed by name.
    pub fn to_tensors(&self) -> HashMap<String, Tensor> {
        self.params
            .iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect()
    }
}

impl FromIterator<(String, Var)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Var)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, Var);
    type IntoIter = std::collections::btree_map::IntoIter<String, Var>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}
