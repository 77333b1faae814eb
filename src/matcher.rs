//! Correlating a requested identifier with one record of a job listing
//!
//! The upstream listing does not echo identifiers consistently: the id returned
//! at submission may be the record's task id or its native id, may carry a
//! `::model` suffix, or may be embedded in a longer task id. Four rules are
//! tried in priority order; for each rule the listing is scanned in its given
//! order and the first record satisfying it wins.
//!
//! Rules 3 and 4 are substring rules. They tolerate identifiers with extra
//! context but can correlate the wrong record when one identifier is a
//! substring of another (e.g. task ids `"12"` and `"123"`).

use crate::types::{JobRecord, RequestedIdentifier};

/// Which rule produced a match, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    /// Identifier equals the native task id or native id
    Exact,
    /// Core identifier equals the native task id or native id
    CoreExact,
    /// Core identifier is contained in the native task id
    CoreInTaskId,
    /// Native task id is contained in the core identifier
    TaskIdInCore,
}

impl MatchRule {
    /// All rules in priority order
    pub const PRIORITY: [MatchRule; 4] = [
        MatchRule::Exact,
        MatchRule::CoreExact,
        MatchRule::CoreInTaskId,
        MatchRule::TaskIdInCore,
    ];

    fn applies(self, requested: &RequestedIdentifier, record: &JobRecord) -> bool {
        let task_id = record.native_task_id();
        let native_id = record.native_id();
        let core = requested.core();

        let equals_either = |candidate: &str| {
            task_id == Some(candidate) || native_id.as_deref() == Some(candidate)
        };

        match self {
            MatchRule::Exact => equals_either(requested.as_str()),
            MatchRule::CoreExact => equals_either(core),
            MatchRule::CoreInTaskId => task_id.is_some_and(|t| t.contains(core)),
            MatchRule::TaskIdInCore => task_id.is_some_and(|t| core.contains(t)),
        }
    }
}

/// A record selected from a listing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordMatch<'a> {
    /// The matched record
    pub record: &'a JobRecord,
    /// Position of the record in the listing
    pub index: usize,
    /// Rule that selected it
    pub rule: MatchRule,
}

/// Find the authoritative record for `requested` in one listing snapshot.
///
/// Returns `None` when no rule matches. An empty core identifier (such as
/// `"::model"`) is contained in every task id, so it selects the first record
/// that has one.
pub fn find_match<'a>(
    requested: &RequestedIdentifier,
    records: &'a [JobRecord],
) -> Option<RecordMatch<'a>> {
    MatchRule::PRIORITY.into_iter().find_map(|rule| {
        records
            .iter()
            .enumerate()
            .find(|(_, record)| rule.applies(requested, record))
            .map(|(index, record)| RecordMatch {
                record,
                index,
                rule,
            })
    })
}
