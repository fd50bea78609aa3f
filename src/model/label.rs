//! Label options and cluster label assignments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ClusterId;
use crate::constants::MASTER_LABELS;

/// Known label strings, in insertion order and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelOptions {
    labels: Vec<String>,
}

impl LabelOptions {
    /// Create an option set seeded with the given labels.
    ///
    /// Blank and repeated entries in the seed are skipped.
    pub fn new<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self { labels: Vec::new() };
        for label in seed {
            options.insert(label.as_ref());
        }
        options
    }

    /// Append a label if it is non-empty and not yet known.
    ///
    /// Returns `true` if the set changed.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self::new(MASTER_LABELS)
    }
}

/// Mapping from cluster id to label.
///
/// Ordered by cluster id. Serializes as a JSON object with string keys,
/// the body `/save-labels` expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelAssignments {
    labels: BTreeMap<ClusterId, String>,
}

impl LabelAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of a cluster, returning the previous label.
    pub fn assign(&mut self, cluster_id: ClusterId, label: &str) -> Option<String> {
        self.labels.insert(cluster_id, label.to_string())
    }

    /// Remove the label of a cluster, returning it.
    pub fn clear(&mut self, cluster_id: ClusterId) -> Option<String> {
        self.labels.remove(&cluster_id)
    }

    pub fn get(&self, cluster_id: ClusterId) -> Option<&str> {
        self.labels.get(&cluster_id).map(String::as_str)
    }

    pub fn contains(&self, cluster_id: ClusterId) -> bool {
        self.labels.contains_key(&cluster_id)
    }

    /// Assignments in ascending cluster id.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &str)> {
        self.labels.iter().map(|(id, label)| (*id, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Drop assignments whose cluster id fails the predicate.
    pub fn retain_clusters(&mut self, mut keep: impl FnMut(ClusterId) -> bool) {
        self.labels.retain(|id, _| keep(*id));
    }

    /// Copy labels from `defaults` for the given cluster ids that are still unlabeled.
    ///
    /// Returns the number of labels filled in.
    pub fn fill_from(
        &mut self,
        defaults: &LabelAssignments,
        cluster_ids: impl IntoIterator<Item = ClusterId>,
    ) -> usize {
        let mut filled = 0;
        for id in cluster_ids {
            if self.contains(id) {
                continue;
            }
            if let Some(label) = defaults.get(id) {
                self.assign(id, label);
                filled += 1;
            }
        }
        filled
    }
}
