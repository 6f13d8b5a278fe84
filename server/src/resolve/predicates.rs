//! Candidate predicates
//!
//! Each check-in is answered with these row-level tests. The SQLite store
//! expresses the same tests in SQL; [`MemorySource`](super::source::MemorySource)
//! applies them directly.

use crate::models::bundle::Bundle;
use crate::resolve::source::CandidateQuery;

/// Enabled, same platform and channel, at or after the client's bundle, above
/// the floor, and built for a version in the query's version set.
pub fn is_update_candidate(bundle: &Bundle, query: &CandidateQuery<'_>) -> bool {
    bundle.enabled
        && bundle.platform == query.platform
        && bundle.channel == query.channel
        && bundle.id >= *query.bundle_id
        && bundle.id > *query.min_bundle_id
        && query.versions.contains(&bundle.target_app_version)
}

/// Enabled, same platform and channel, strictly before the client's bundle
/// and above the floor.
pub fn is_rollback_candidate(bundle: &Bundle, query: &CandidateQuery<'_>) -> bool {
    bundle.enabled
        && bundle.platform == query.platform
        && bundle.channel == query.channel
        && bundle.id < *query.bundle_id
        && bundle.id > *query.min_bundle_id
}

/// A rollback is only allowed when no update candidate exists at all,
/// including one equal to the client's own bundle.
pub fn has_forward_path<'a, I>(bundles: I, query: &CandidateQuery<'_>) -> bool
where
    I: IntoIterator<Item = &'a Bundle>,
{
    bundles
        .into_iter()
        .any(|bundle| is_update_candidate(bundle, query))
}

/// Greatest id among the bundles accepted by `predicate`
pub fn latest_matching<'a, I, P>(bundles: I, predicate: P) -> Option<&'a Bundle>
where
    I: IntoIterator<Item = &'a Bundle>,
    P: Fn(&Bundle) -> bool,
{
    bundles
        .into_iter()
        .filter(|bundle| predicate(*bundle))
        .max_by(|a, b| a.id.cmp(&b.id))
}
