use std::collections::BTreeMap;

use nambola_protocol::{mark_key, Grid};
use serde::{Deserialize, Serialize};

/// Client-local marks of one ticket, keyed `"row-col"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(BTreeMap<String, bool>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.0.get(&mark_key(row, col)).copied().unwrap_or(false)
    }

    /// Flips the mark and returns the new value.
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        let entry = self.0.entry(mark_key(row, col)).or_insert(false);
        *entry = !*entry;
        *entry
    }

    /// Marked cells that hold a name on `grid`; stray keys for blocked or
    /// out-of-range squares are ignored.
    pub fn count_on(&self, grid: &Grid) -> usize {
        grid.iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, cell)| (r, c, cell)))
            .filter(|(r, c, cell)| cell.is_some() && self.is_marked(*r, *c))
            .count()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
