//! Bundle sources consulted by the update engine

use crate::errors::ServiceError;
use crate::models::bundle::{Bundle, BundleId, Platform};
use crate::resolve::predicates::{
    has_forward_path, is_rollback_candidate, is_update_candidate, latest_matching,
};
use crate::resolve::version_set::VersionSet;

/// Filter shared by the update and rollback candidate queries
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery<'a> {
    pub platform: Platform,
    pub channel: &'a str,
    pub bundle_id: &'a BundleId,
    pub min_bundle_id: &'a BundleId,
    pub versions: &'a VersionSet,
}

/// Read access to published bundles.
///
/// Every method is an independent read; callers must not assume the calls
/// observe one snapshot.
pub trait BundleSource: Send + Sync {
    /// Latest bundle matching [`is_update_candidate`]
    fn query_update_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError>;

    /// Latest bundle matching [`is_rollback_candidate`], or `None` when a
    /// forward path exists for the same query.
    fn query_rollback_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError>;

    /// Whether any bundle, enabled or not, exists at `bundle_id` for `platform`
    fn bundle_exists(&self, bundle_id: &BundleId, platform: Platform)
        -> Result<bool, ServiceError>;

    /// Distinct target app versions for `platform` at or above the floor
    fn list_target_versions(
        &self,
        platform: Platform,
        min_bundle_id: &BundleId,
    ) -> Result<VersionSet, ServiceError>;
}

impl<S: BundleSource + ?Sized> BundleSource for std::sync::Arc<S> {
    fn query_update_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        (**self).query_update_candidate(query)
    }

    fn query_rollback_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        (**self).query_rollback_candidate(query)
    }

    fn bundle_exists(
        &self,
        bundle_id: &BundleId,
        platform: Platform,
    ) -> Result<bool, ServiceError> {
        (**self).bundle_exists(bundle_id, platform)
    }

    fn list_target_versions(
        &self,
        platform: Platform,
        min_bundle_id: &BundleId,
    ) -> Result<VersionSet, ServiceError> {
        (**self).list_target_versions(platform, min_bundle_id)
    }
}

/// In-memory bundle source built directly on the candidate predicates
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bundles: Vec<Bundle>,
}

impl MemorySource {
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Self { bundles }
    }
}

impl BundleSource for MemorySource {
    fn query_update_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        Ok(latest_matching(&self.bundles, |b| is_update_candidate(b, query)).cloned())
    }

    fn query_rollback_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        if has_forward_path(&self.bundles, query) {
            return Ok(None);
        }
        Ok(latest_matching(&self.bundles, |b| is_rollback_candidate(b, query)).cloned())
    }

    fn bundle_exists(
        &self,
        bundle_id: &BundleId,
        platform: Platform,
    ) -> Result<bool, ServiceError> {
        Ok(self
            .bundles
            .iter()
            .any(|b| b.id == *bundle_id && b.platform == platform))
    }

    fn list_target_versions(
        &self,
        platform: Platform,
        min_bundle_id: &BundleId,
    ) -> Result<VersionSet, ServiceError> {
        Ok(self
            .bundles
            .iter()
            .filter(|b| b.platform == platform && b.id >= *min_bundle_id)
            .map(|b| b.target_app_version.clone())
            .collect())
    }
}
