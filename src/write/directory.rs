//! Directory assembly at finish time.
//!
//! Entries are recorded in submission order. Finishing drops redirects
//! whose target never arrived, sorts the survivors by (namespace, URL) to
//! fix their entry indexes, and derives the title order and title listing
//! from those indexes.

use std::collections::HashMap;

use crate::format::dirent::{Dirent, DirentKind};
use crate::{Error, Result};

use super::entry::EntryUrl;

/// Cluster number of a payload whose cluster is still open.
pub(super) const UNASSIGNED: u32 = u32::MAX;

/// An entry recorded by the creator.
#[derive(Debug, Clone)]
pub(super) struct PendingEntry {
    pub(super) url: EntryUrl,
    pub(super) title: String,
    pub(super) parameter: Vec<u8>,
    pub(super) indexed: bool,
    pub(super) target: Target,
}

impl PendingEntry {
    /// Title used for ordering: the URL when no title was given.
    fn sort_title(&self) -> &str {
        if self.title.is_empty() {
            self.url.url()
        } else {
            &self.title
        }
    }
}

/// Where a pending entry points.
#[derive(Debug, Clone)]
pub(super) enum Target {
    Content { mime_type: u16, cluster: u32, blob: u32 },
    Redirect(EntryUrl),
}

/// Returns which entries survive: content entries always, redirects only
/// when their target (transitively) survives.
///
/// Redirects to absent URLs seed a worklist; each dropped entry then drops
/// the redirects pointing at it, so every entry is visited once.
pub(super) fn live_entries(entries: &[PendingEntry], by_url: &HashMap<EntryUrl, usize>) -> Vec<bool> {
    let mut live = vec![true; entries.len()];
    let mut sources: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut dropped = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let Target::Redirect(target) = &entry.target else {
            continue;
        };
        match by_url.get(target) {
            Some(&j) => sources.entry(j).or_default().push(i),
            None => {
                log::warn!("Dropping redirect {} to missing entry {}", entry.url, target);
                live[i] = false;
                dropped.push(i);
            }
        }
    }

    while let Some(gone) = dropped.pop() {
        let Some(redirects) = sources.get(&gone) else {
            continue;
        };
        for &i in redirects {
            if live[i] {
                log::warn!(
                    "Dropping redirect {} to dropped entry {}",
                    entries[i].url,
                    entries[gone].url
                );
                live[i] = false;
                dropped.push(i);
            }
        }
    }
    live
}

/// Surviving entries in (namespace, URL) order.
#[derive(Debug)]
pub(super) struct Directory {
    order: Vec<usize>,
    position: Vec<Option<u32>>,
}

impl Directory {
    pub(super) fn new(entries: &[PendingEntry], live: &[bool]) -> Self {
        let mut order: Vec<usize> = (0..entries.len()).filter(|&i| live[i]).collect();
        order.sort_by(|&a, &b| entries[a].url.cmp(&entries[b].url));
        let mut position = vec![None; entries.len()];
        for (pos, &i) in order.iter().enumerate() {
            position[i] = Some(pos as u32);
        }
        Self { order, position }
    }

    /// Number of entries in the directory.
    pub(super) fn len(&self) -> u32 {
        self.order.len() as u32
    }

    /// Entry index of pending entry `entry`, if it survived.
    pub(super) fn position(&self, entry: usize) -> Option<u32> {
        self.position.get(entry).copied().flatten()
    }

    /// Pending entries in directory order.
    pub(super) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Entry indexes sorted by (namespace, title).
    pub(super) fn title_order(&self, entries: &[PendingEntry]) -> Vec<u32> {
        let mut by_title: Vec<u32> = (0..self.len()).collect();
        by_title.sort_by(|&a, &b| {
            let (a, b) = (&entries[self.order[a as usize]], &entries[self.order[b as usize]]);
            (a.url.namespace(), a.sort_title()).cmp(&(b.url.namespace(), b.sort_title()))
        });
        by_title
    }

    /// Content of the title listing: the entry index of every indexed
    /// entry, in title order, as little-endian `u32`s.
    pub(super) fn title_listing(&self, entries: &[PendingEntry]) -> Vec<u8> {
        self.title_order(entries)
            .into_iter()
            .filter(|&pos| entries[self.order[pos as usize]].indexed)
            .flat_map(u32::to_le_bytes)
            .collect()
    }

    /// Builds the dirents in directory order.
    ///
    /// # Errors
    ///
    /// Fails if a payload was never assigned to a cluster.
    pub(super) fn dirents(
        &self,
        entries: &[PendingEntry],
        by_url: &HashMap<EntryUrl, usize>,
    ) -> Result<Vec<Dirent>> {
        self.order
            .iter()
            .map(|&i| {
                let entry = &entries[i];
                let kind = match &entry.target {
                    Target::Content { cluster, .. } if *cluster == UNASSIGNED => {
                        return Err(Error::InvalidState("payload left in an open cluster"));
                    }
                    &Target::Content {
                        mime_type,
                        cluster,
                        blob,
                    } => DirentKind::Content {
                        mime_type,
                        cluster,
                        blob,
                    },
                    Target::Redirect(url) => DirentKind::Redirect {
                        target: by_url
                            .get(url)
                            .and_then(|&j| self.position(j))
                            .ok_or(Error::InvalidState("redirect target dropped"))?,
                    },
                };
                let title = if entry.title == entry.url.url() {
                    String::new()
                } else {
                    entry.title.clone()
                };
                Ok(Dirent {
                    namespace: entry.url.namespace(),
                    revision: 0,
                    url: entry.url.url().to_owned(),
                    title,
                    parameter: entry.parameter.clone(),
                    kind,
                })
            })
            .collect()
    }
}
