//! Update resolution engine
//!
//! Decides what a checking-in client should do:
//!
//! 1. **Update** to the latest enabled bundle at or after its current one
//!    whose target app version is still relevant.
//! 2. **Rollback** to the latest enabled bundle before its current one, but
//!    only when no forward candidate exists. Rollbacks are always forced.
//! 3. **Reset to base** when the client holds an id that was never published
//!    for its platform and sits above its floor.
//! 4. Otherwise nothing.
//!
//! The greatest id always wins among qualifying bundles, and a candidate
//! equal to the client's current bundle is never actionable.

use openapi_server::models::UpdateStatus;
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::bundle::BundleId;
use crate::models::report::ClientReport;
use crate::resolve::source::{BundleSource, CandidateQuery};
use crate::resolve::version_set::{resolve_versions, VersionSet};

/// Outcome of a check-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NoAction,
    Update {
        id: BundleId,
        should_force_update: bool,
        message: Option<String>,
    },
    Rollback {
        id: BundleId,
        message: Option<String>,
    },
    /// Forced rollback to the embedded bundle (the nil id); there is no
    /// artifact to download.
    ResetToBase,
}

impl Decision {
    /// Bundle the client is pointed at, if any
    pub fn target_id(&self) -> Option<BundleId> {
        match self {
            Decision::NoAction => None,
            Decision::Update { id, .. } | Decision::Rollback { id, .. } => Some(id.clone()),
            Decision::ResetToBase => Some(BundleId::nil()),
        }
    }

    pub fn should_force_update(&self) -> bool {
        match self {
            Decision::NoAction => false,
            Decision::Update {
                should_force_update,
                ..
            } => *should_force_update,
            Decision::Rollback { .. } | Decision::ResetToBase => true,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Decision::Update { message, .. } | Decision::Rollback { message, .. } => {
                message.as_deref()
            }
            Decision::NoAction | Decision::ResetToBase => None,
        }
    }

    pub fn status(&self) -> Option<UpdateStatus> {
        match self {
            Decision::NoAction => None,
            Decision::Update { .. } => Some(UpdateStatus::Update),
            Decision::Rollback { .. } | Decision::ResetToBase => Some(UpdateStatus::Rollback),
        }
    }

    /// Whether the client has an artifact to fetch
    pub fn has_artifact(&self) -> bool {
        matches!(self, Decision::Update { .. } | Decision::Rollback { .. })
    }

    fn outcome(&self) -> &'static str {
        match self {
            Decision::NoAction => "no_action",
            Decision::Update { .. } => "update",
            Decision::Rollback { .. } => "rollback",
            Decision::ResetToBase => "reset_to_base",
        }
    }
}

/// Stateless decision procedure over a [`BundleSource`]
#[derive(Debug, Clone)]
pub struct UpdateEngine<S> {
    source: S,
}

impl<S: BundleSource> UpdateEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve the version set for the report, then decide
    pub fn check(&self, report: &ClientReport) -> Result<Decision, ServiceError> {
        let versions = resolve_versions(&self.source, report.platform, &report.min_bundle_id)?;
        self.decide(report, &versions)
    }

    /// Decide against an already-resolved version set
    pub fn decide(
        &self,
        report: &ClientReport,
        versions: &VersionSet,
    ) -> Result<Decision, ServiceError> {
        let query = CandidateQuery {
            platform: report.platform,
            channel: &report.channel,
            bundle_id: &report.bundle_id,
            min_bundle_id: &report.min_bundle_id,
            versions,
        };

        let decision = self.resolve(report, &query)?;
        debug!(
            platform = %report.platform,
            channel = %report.channel,
            bundle_id = %report.bundle_id,
            min_bundle_id = %report.min_bundle_id,
            app_version = report.app_version.as_deref().unwrap_or("unknown"),
            versions = versions.len(),
            outcome = decision.outcome(),
            target_id = ?decision.target_id().map(|id| id.to_string()),
            "resolved check-in"
        );
        Ok(decision)
    }

    fn resolve(
        &self,
        report: &ClientReport,
        query: &CandidateQuery<'_>,
    ) -> Result<Decision, ServiceError> {
        if let Some(candidate) = self.source.query_update_candidate(query)? {
            if candidate.id != report.bundle_id {
                return Ok(Decision::Update {
                    id: candidate.id,
                    should_force_update: candidate.should_force_update,
                    message: candidate.message,
                });
            }
        }

        if let Some(candidate) = self.source.query_rollback_candidate(query)? {
            if candidate.id != report.bundle_id {
                return Ok(Decision::Rollback {
                    id: candidate.id,
                    message: candidate.message,
                });
            }
        }

        if report.bundle_id.is_nil() || report.bundle_id <= report.min_bundle_id {
            return Ok(Decision::NoAction);
        }

        if !self
            .source
            .bundle_exists(&report.bundle_id, report.platform)?
        {
            return Ok(Decision::ResetToBase);
        }

        Ok(Decision::NoAction)
    }
}
