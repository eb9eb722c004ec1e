//! The batch result accumulator

use super::record::UrlRecord;
use crate::crawler::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// URL → record map accumulated across the passes of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultMap {
    records: BTreeMap<String, UrlRecord>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&UrlRecord> {
        self.records.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, record: UrlRecord) {
        self.records.insert(url.into(), record);
    }

    /// Returns the record for `url`, creating an empty one if needed
    pub fn record_mut(&mut self, url: &str) -> &mut UrlRecord {
        self.records.entry(url.to_string()).or_default()
    }

    /// Returns true if `url` has an extracted profile
    pub fn is_resolved(&self, url: &str) -> bool {
        self.records.get(url).is_some_and(UrlRecord::is_resolved)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UrlRecord)> {
        self.records.iter()
    }

    /// Overlays `newer` onto this map; entries in `newer` win
    pub fn merge(&mut self, newer: ResultMap) {
        self.records.extend(newer.records);
    }

    /// Stamps `outcome` onto every record that still has no profile
    ///
    /// # Returns
    ///
    /// The number of records marked
    pub fn fail_unresolved(&mut self, outcome: &Outcome) -> usize {
        let mut marked = 0;
        for record in self.records.values_mut().filter(|r| !r.is_resolved()) {
            record.set_outcome(Some(outcome));
            marked += 1;
        }
        marked
    }

    pub fn resolved_count(&self) -> usize {
        self.records.values().filter(|r| r.is_resolved()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.len() - self.resolved_count()
    }
}

impl IntoIterator for ResultMap {
    type Item = (String, UrlRecord);
    type IntoIter = std::collections::btree_map::IntoIter<String, UrlRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
