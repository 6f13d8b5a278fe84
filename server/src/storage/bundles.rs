//! Bundle queries

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::models::bundle::{Bundle, BundleId, Platform, DEFAULT_CHANNEL};
use crate::resolve::source::{BundleSource, CandidateQuery};
use crate::resolve::version_set::VersionSet;
use crate::storage::db::Store;

const BUNDLE_COLUMNS: &str = "id, platform, targetAppVersion, shouldForceUpdate, enabled, \
                              fileHash, gitCommitHash, message, channel";

fn row_to_bundle(row: &rusqlite::Row) -> rusqlite::Result<Bundle> {
    let platform: String = row.get("platform")?;
    let platform = platform.parse::<Platform>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Bundle {
        id: BundleId::new(row.get::<_, String>("id")?),
        platform,
        target_app_version: row.get::<_, Option<String>>("targetAppVersion")?.unwrap_or_default(),
        should_force_update: row.get::<_, Option<bool>>("shouldForceUpdate")?.unwrap_or(false),
        enabled: row.get::<_, Option<bool>>("enabled")?.unwrap_or(false),
        file_hash: row.get::<_, Option<String>>("fileHash")?.unwrap_or_default(),
        git_commit_hash: row.get("gitCommitHash")?,
        message: row.get("message")?,
        channel: row
            .get::<_, Option<String>>("channel")?
            .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
    })
}

/// WHERE clause and parameters shared by the update-candidate and
/// forward-path queries. `None` when the version set is empty, in which case
/// nothing can match.
fn update_filter(query: &CandidateQuery<'_>) -> Option<(String, Vec<String>)> {
    if query.versions.is_empty() {
        return None;
    }

    let mut params = vec![
        query.platform.as_str().to_string(),
        query.channel.to_string(),
        query.bundle_id.to_string(),
        query.min_bundle_id.to_string(),
    ];
    let placeholders = query
        .versions
        .iter()
        .map(|version| {
            params.push(version.clone());
            format!("?{}", params.len())
        })
        .collect::<Vec<_>>()
        .join(", ");

    let clause = format!(
        "enabled = 1
           AND platform = ?1
           AND channel = ?2
           AND id >= ?3
           AND id > ?4
           AND targetAppVersion IN ({placeholders})"
    );
    Some((clause, params))
}

pub fn get_bundle(conn: &Connection, id: &BundleId) -> Result<Option<Bundle>, ServiceError> {
    let sql = format!("SELECT {BUNDLE_COLUMNS} FROM bundles WHERE id = ?1");
    let bundle = conn
        .query_row(&sql, params![id.as_str()], row_to_bundle)
        .optional()?;
    Ok(bundle)
}

pub fn list_bundles(conn: &Connection) -> Result<Vec<Bundle>, ServiceError> {
    let sql = format!("SELECT {BUNDLE_COLUMNS} FROM bundles ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let bundles = stmt
        .query_map([], row_to_bundle)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bundles)
}

/// Insert or replace every bundle in one transaction.
///
/// An id that already exists must keep its platform and channel; otherwise
/// the whole batch is rejected and nothing is written.
pub fn upsert_bundles(conn: &mut Connection, bundles: &[Bundle]) -> Result<(), ServiceError> {
    let tx = conn.transaction()?;
    {
        let mut existing_stmt =
            tx.prepare("SELECT platform, channel FROM bundles WHERE id = ?1")?;
        let mut insert_stmt = tx.prepare(&format!(
            "INSERT OR REPLACE INTO bundles ({BUNDLE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))?;

        for bundle in bundles {
            let existing = existing_stmt
                .query_row(params![bundle.id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                })
                .optional()?;

            if let Some((platform, channel)) = existing {
                let channel = channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
                if platform != bundle.platform.as_str() || channel != bundle.channel {
                    return Err(ServiceError::IdentityConflict {
                        id: bundle.id.to_string(),
                        existing: format!("{platform}/{channel}"),
                        requested: format!("{}/{}", bundle.platform, bundle.channel),
                    });
                }
            }

            insert_stmt.execute(params![
                bundle.id.as_str(),
                bundle.platform.as_str(),
                bundle.target_app_version,
                bundle.should_force_update,
                bundle.enabled,
                bundle.file_hash,
                bundle.git_commit_hash,
                bundle.message,
                bundle.channel,
            ])?;
        }
    }
    tx.commit()?;

    info!("Upserted {} bundle(s)", bundles.len());
    Ok(())
}

pub fn list_target_versions(
    conn: &Connection,
    platform: Platform,
    min_bundle_id: &BundleId,
) -> Result<VersionSet, ServiceError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT targetAppVersion FROM bundles
         WHERE platform = ?1 AND id >= ?2 AND targetAppVersion IS NOT NULL",
    )?;
    let versions = stmt
        .query_map(params![platform.as_str(), min_bundle_id.as_str()], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<Result<VersionSet, _>>()?;
    Ok(versions)
}

pub fn query_update_candidate(
    conn: &Connection,
    query: &CandidateQuery<'_>,
) -> Result<Option<Bundle>, ServiceError> {
    let Some((clause, params)) = update_filter(query) else {
        return Ok(None);
    };
    let sql = format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundles WHERE {clause} ORDER BY id DESC LIMIT 1"
    );
    let bundle = conn
        .query_row(&sql, params_from_iter(params.iter()), row_to_bundle)
        .optional()?;
    Ok(bundle)
}

/// Whether any bundle satisfies the update-candidate filter
pub fn has_forward_path(conn: &Connection, query: &CandidateQuery<'_>) -> Result<bool, ServiceError> {
    let Some((clause, params)) = update_filter(query) else {
        return Ok(false);
    };
    let sql = format!("SELECT EXISTS (SELECT 1 FROM bundles WHERE {clause})");
    let exists = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(exists)
}

/// Latest enabled bundle strictly before the client's one and above its floor
pub fn query_rollback_target(
    conn: &Connection,
    query: &CandidateQuery<'_>,
) -> Result<Option<Bundle>, ServiceError> {
    let sql = format!(
        "SELECT {BUNDLE_COLUMNS} FROM bundles
         WHERE enabled = 1
           AND platform = ?1
           AND channel = ?2
           AND id < ?3
           AND id > ?4
         ORDER BY id DESC
         LIMIT 1"
    );
    let bundle = conn
        .query_row(
            &sql,
            params![
                query.platform.as_str(),
                query.channel,
                query.bundle_id.as_str(),
                query.min_bundle_id.as_str(),
            ],
            row_to_bundle,
        )
        .optional()?;
    Ok(bundle)
}

pub fn bundle_exists(
    conn: &Connection,
    id: &BundleId,
    platform: Platform,
) -> Result<bool, ServiceError> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM bundles WHERE id = ?1 AND platform = ?2)",
        params![id.as_str(), platform.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl Store {
    pub fn get_bundle(&self, id: &BundleId) -> Result<Option<Bundle>, ServiceError> {
        get_bundle(&self.conn(), id)
    }

    pub fn list_bundles(&self) -> Result<Vec<Bundle>, ServiceError> {
        list_bundles(&self.conn())
    }

    pub fn upsert_bundles(&self, bundles: &[Bundle]) -> Result<(), ServiceError> {
        upsert_bundles(&mut self.conn(), bundles)
    }
}

impl BundleSource for Store {
    fn query_update_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        query_update_candidate(&self.conn(), query)
    }

    fn query_rollback_candidate(
        &self,
        query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        let conn = self.conn();
        if has_forward_path(&conn, query)? {
            debug!(bundle_id = %query.bundle_id, "forward path exists, no rollback");
            return Ok(None);
        }
        query_rollback_target(&conn, query)
    }

    fn bundle_exists(
        &self,
        bundle_id: &BundleId,
        platform: Platform,
    ) -> Result<bool, ServiceError> {
        bundle_exists(&self.conn(), bundle_id, platform)
    }

    fn list_target_versions(
        &self,
        platform: Platform,
        min_bundle_id: &BundleId,
    ) -> Result<VersionSet, ServiceError> {
        list_target_versions(&self.conn(), platform, min_bundle_id)
    }
}
