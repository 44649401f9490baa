//! Cluster-ordered emission plan.

use crate::Result;
use crate::progress::{ENUMERATE_REPORT_INTERVAL, Phase, ProgressReporter};
use crate::source::{SourceArchive, SourceEntry};

/// A source entry and the cluster currently holding its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Entry index in the source archive.
    pub index: u32,
    /// Source cluster number.
    pub cluster: u32,
}

/// Source entries in emission order: by cluster, then by original index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedIndexList {
    entries: Vec<PlannedEntry>,
}

impl OrderedIndexList {
    /// Orders `pairs` by cluster, keeping the given order among entries of
    /// the same cluster.
    pub fn from_pairs(mut pairs: Vec<PlannedEntry>) -> Self {
        pairs.sort_by_key(|p| p.cluster);
        Self { entries: pairs }
    }

    /// Returns the number of planned entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the plan in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, PlannedEntry> {
        self.entries.iter()
    }

    /// Returns the planned source indexes in emission order.
    pub fn indices(&self) -> Vec<u32> {
        self.entries.iter().map(|p| p.index).collect()
    }
}

impl<'a> IntoIterator for &'a OrderedIndexList {
    type Item = &'a PlannedEntry;
    type IntoIter = std::slice::Iter<'a, PlannedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Reads the cluster of every entry of `source` and orders the entries by it.
///
/// # Errors
///
/// Propagates any error reading an entry from the source.
pub fn plan_cluster_order<S, P>(source: &S, mut progress: P) -> Result<OrderedIndexList>
where
    S: SourceArchive,
    P: ProgressReporter,
{
    let total = source.entry_count();
    progress.on_phase(Phase::Enumerating);
    let mut pairs = Vec::with_capacity(total as usize);
    for index in 0..total {
        let cluster = source.entry(index)?.cluster_number();
        pairs.push(PlannedEntry { index, cluster });
        let done = index + 1;
        if done % ENUMERATE_REPORT_INTERVAL == 0 {
            log::debug!("Enumerated {}/{} entries", done, total);
            progress.on_enumerate(done, total);
        }
    }
    if total % ENUMERATE_REPORT_INTERVAL != 0 {
        progress.on_enumerate(total, total);
    }

    progress.on_phase(Phase::Sorting);
    let plan = OrderedIndexList::from_pairs(pairs);
    log::debug!("Planned {} entries in cluster order", plan.len());
    Ok(plan)
}
