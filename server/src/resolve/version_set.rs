//! Version set resolution

use std::collections::HashSet;

use crate::errors::ServiceError;
use crate::models::bundle::{BundleId, Platform};
use crate::resolve::source::BundleSource;

/// Native app versions still relevant at a given floor
pub type VersionSet = HashSet<String>;

/// Distinct target app versions of every bundle (enabled or not, any channel)
/// for `platform` with an id at or above `min_bundle_id`.
pub fn resolve_versions<S>(
    source: &S,
    platform: Platform,
    min_bundle_id: &BundleId,
) -> Result<VersionSet, ServiceError>
where
    S: BundleSource + ?Sized,
{
    source.list_target_versions(platform, min_bundle_id)
}
