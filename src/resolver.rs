//! Resolution pass: pick one canonical record per content hash.
//!
//! The canonical of a group is the member with the smallest [`RecordId`].
//! That choice depends only on which records share the hash, never on the
//! order the store returns them in or on the order groups are visited, so a
//! second pass over an unchanged store rewrites every `mother_id` with the
//! value it already has.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{DeckError, Result};
use crate::logging::Logger;
use crate::record::{FileRecord, RecordId};
use crate::store::MetadataStore;

/// Counters reported at the end of a resolution pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Records visited.
    pub records: usize,
    /// Distinct content hashes.
    pub groups: usize,
    /// Hashes shared by more than one record.
    pub duplicate_groups: usize,
    /// Records that point at another record.
    pub duplicates: usize,
    /// Records whose `mother_id` differed from the value written.
    pub changed: usize,
}

/// Assigns canonical ids over the persisted record set.
pub struct DuplicateResolver<'a> {
    log: &'a Logger,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(log: &'a Logger) -> Self {
        Self { log }
    }

    /// Runs one resolution pass over `store`.
    ///
    /// Every group is read from the store exactly once, its canonical is
    /// decided from that read alone, and then every member is written. A
    /// singleton is written as its own canonical.
    ///
    /// # Errors
    ///
    /// Any store failure aborts the pass.
    pub fn resolve<S: MetadataStore>(&self, store: &mut S) -> Result<ResolveSummary> {
        let all = store.find_all()?;
        let hashes: BTreeSet<String> = all.into_iter().map(|r| r.content_hash).collect();

        let mut summary = ResolveSummary {
            groups: hashes.len(),
            ..Default::default()
        };

        let mut canonical_of: BTreeMap<String, RecordId> = BTreeMap::new();
        let mut groups: Vec<Vec<FileRecord>> = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let members = store.find_by_hash(&hash)?;
            let Some(canonical) = members.iter().map(|r| r.id).min() else {
                continue;
            };
            canonical_of.insert(hash, canonical);
            groups.push(members);
        }

        for members in groups {
            let canonical = canonical_of[&members[0].content_hash];
            if members.len() > 1 {
                summary.duplicate_groups += 1;
                self.log.verbose(
                    2,
                    format!(
                        "  {} copies of {}, canonical {}",
                        members.len(),
                        &members[0].content_hash[..12],
                        canonical
                    ),
                );
            }
            for member in members {
                if member.mother_id != canonical {
                    summary.changed += 1;
                }
                if member.id != canonical {
                    summary.duplicates += 1;
                }
                store.update_mother(member.id, canonical)?;
                summary.records += 1;
            }
        }

        self.log.verbose(
            1,
            format!(
                "Resolved {} record(s) into {} group(s); {} duplicate(s)",
                summary.records, summary.groups, summary.duplicates
            ),
        );

        Ok(summary)
    }
}

/// Checks the canonical invariants of the stored record set.
///
/// Within every hash group exactly one record must be its own canonical, and
/// every other member must point at it.
///
/// # Errors
///
/// Returns [`DeckError::Invariant`] for the first offending record, or the
/// store's error if it cannot be read.
pub fn verify<S: MetadataStore>(store: &S) -> Result<()> {
    let all = store.find_all()?;
    let by_id: HashMap<RecordId, &FileRecord> = all.iter().map(|r| (r.id, r)).collect();

    let mut canonicals: BTreeMap<&str, RecordId> = BTreeMap::new();
    for record in all.iter().filter(|r| r.is_canonical()) {
        if let Some(other) = canonicals.insert(&record.content_hash, record.id) {
            return Err(DeckError::Invariant {
                id: record.id,
                message: format!("shares its content with canonical record {other}"),
            });
        }
    }

    for record in &all {
        let Some(mother) = by_id.get(&record.mother_id) else {
            return Err(DeckError::Invariant {
                id: record.id,
                message: format!("mother {} does not exist", record.mother_id),
            });
        };
        if !mother.is_canonical() {
            return Err(DeckError::Invariant {
                id: record.id,
                message: format!("mother {} is not canonical", mother.id),
            });
        }
        if mother.content_hash != record.content_hash {
            return Err(DeckError::Invariant {
                id: record.id,
                message: format!("mother {} has different content", mother.id),
            });
        }
    }

    Ok(())
}
