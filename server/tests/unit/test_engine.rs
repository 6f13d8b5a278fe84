//! Update engine scenarios, run against every bundle source

use otahub::errors::ServiceError;
use otahub::models::bundle::{Bundle, BundleId, Platform};
use otahub::models::report::ClientReport;
use otahub::resolve::{BundleSource, CandidateQuery, Decision, UpdateEngine, VersionSet};

use crate::common::{all_sources, bid, bundle, disabled, on_channel, on_platform, versions};

fn check_all(bundles: &[Bundle], report: &ClientReport) -> Vec<(&'static str, Decision)> {
    all_sources(bundles)
        .into_iter()
        .map(|(name, source)| (name, UpdateEngine::new(source).check(report).unwrap()))
        .collect()
}

fn assert_all(bundles: &[Bundle], report: &ClientReport, expected: Decision) {
    for (name, decision) in check_all(bundles, report) {
        assert_eq!(decision, expected, "source: {name}");
    }
}

fn update_to(n: u16) -> Decision {
    Decision::Update {
        id: bid(n),
        should_force_update: false,
        message: Some(format!("release {n}")),
    }
}

fn rollback_to(n: u16) -> Decision {
    Decision::Rollback {
        id: bid(n),
        message: Some(format!("release {n}")),
    }
}

#[test]
fn test_newer_bundle_is_offered() {
    let bundles = vec![bundle(1, "1.0"), bundle(2, "1.0")];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &report, update_to(2));
}

#[test]
fn test_current_bundle_is_no_action() {
    let bundles = vec![bundle(1, "1.0"), bundle(2, "1.0")];
    let report = ClientReport::new(Platform::Android, bid(2));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_disabled_newer_bundle_is_no_action() {
    let bundles = vec![bundle(1, "1.0"), disabled(bundle(2, "1.0"))];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_rollback_when_version_set_excludes_forward_path() {
    let bundles = vec![bundle(1, "v1"), bundle(2, "v2")];
    let report = ClientReport::new(Platform::Android, bid(2));

    for (name, source) in all_sources(&bundles) {
        let decision = UpdateEngine::new(source)
            .decide(&report, &versions(&["v1"]))
            .unwrap();
        assert_eq!(decision, rollback_to(1), "source: {name}");
        assert!(decision.should_force_update());
    }
}

#[test]
fn test_unknown_bundle_resets_to_base() {
    // Only an iOS bundle carries this id
    let bundles = vec![on_platform(bundle(5, "1.0"), Platform::Ios)];
    let report = ClientReport::new(Platform::Android, bid(5));

    for (name, decision) in check_all(&bundles, &report) {
        assert_eq!(decision, Decision::ResetToBase, "source: {name}");
        assert_eq!(decision.target_id(), Some(BundleId::nil()));
        assert!(decision.should_force_update());
        assert!(!decision.has_artifact());
    }
}

#[test]
fn test_unknown_bundle_on_empty_store_resets_to_base() {
    let report = ClientReport::new(Platform::Ios, bid(3));
    assert_all(&[], &report, Decision::ResetToBase);
}

#[test]
fn test_nil_bundle_never_resets() {
    let report = ClientReport::new(Platform::Android, BundleId::nil());
    assert_all(&[], &report, Decision::NoAction);
}

#[test]
fn test_unknown_bundle_at_or_below_floor_is_left_alone() {
    let at_floor = ClientReport::new(Platform::Android, bid(4)).with_min_bundle_id(bid(4));
    assert_all(&[], &at_floor, Decision::NoAction);

    let below_floor = ClientReport::new(Platform::Android, bid(3)).with_min_bundle_id(bid(4));
    assert_all(&[], &below_floor, Decision::NoAction);
}

#[test]
fn test_disabled_current_bundle_still_exists() {
    // The client's bundle was disabled with nothing to fall back to: it exists,
    // so no reset is forced.
    let bundles = vec![disabled(bundle(2, "1.0"))];
    let report = ClientReport::new(Platform::Android, bid(2));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_disabled_current_bundle_rolls_back() {
    let bundles = vec![bundle(1, "1.0"), disabled(bundle(2, "1.0"))];
    let report = ClientReport::new(Platform::Android, bid(2));
    assert_all(&bundles, &report, rollback_to(1));
}

#[test]
fn test_rollback_is_forced_even_from_unforced_bundle() {
    let bundles = vec![bundle(1, "1.0"), disabled(bundle(2, "1.0"))];
    let report = ClientReport::new(Platform::Android, bid(2));
    for (name, decision) in check_all(&bundles, &report) {
        assert!(decision.should_force_update(), "source: {name}");
    }
}

#[test]
fn test_greatest_id_wins() {
    let bundles = vec![
        bundle(1, "1.0"),
        bundle(4, "1.0"),
        bundle(3, "1.0"),
        bundle(2, "1.0"),
    ];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &report, update_to(4));
}

#[test]
fn test_force_flag_is_carried_on_updates() {
    let forced = Bundle {
        should_force_update: true,
        ..bundle(2, "1.0")
    };
    let bundles = vec![bundle(1, "1.0"), forced];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(
        &bundles,
        &report,
        Decision::Update {
            id: bid(2),
            should_force_update: true,
            message: Some("release 2".to_string()),
        },
    );
}

#[test]
fn test_disabled_bundles_are_skipped_for_lower_candidate() {
    let bundles = vec![
        bundle(1, "1.0"),
        bundle(2, "1.0"),
        disabled(bundle(3, "1.0")),
    ];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &report, update_to(2));
}

#[test]
fn test_channel_isolation() {
    let bundles = vec![
        bundle(1, "1.0"),
        on_channel(bundle(2, "1.0"), "staging"),
    ];

    let production = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &production, Decision::NoAction);

    let staging = ClientReport::new(Platform::Android, BundleId::nil()).with_channel("staging");
    assert_all(&bundles, &staging, update_to(2));
}

#[test]
fn test_rollback_never_crosses_channels() {
    let bundles = vec![
        on_channel(bundle(1, "1.0"), "staging"),
        disabled(bundle(2, "1.0")),
    ];
    let report = ClientReport::new(Platform::Android, bid(2));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_platform_isolation() {
    let bundles = vec![
        bundle(1, "1.0"),
        on_platform(bundle(2, "1.0"), Platform::Ios),
    ];
    let report = ClientReport::new(Platform::Android, bid(1));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_floor_bounds_update_search() {
    let bundles = vec![bundle(1, "1.0"), bundle(2, "1.0"), bundle(3, "1.0")];

    let report = ClientReport::new(Platform::Android, BundleId::nil()).with_min_bundle_id(bid(2));
    assert_all(&bundles, &report, update_to(3));

    // Nothing sits strictly above the floor
    let report = ClientReport::new(Platform::Android, BundleId::nil()).with_min_bundle_id(bid(3));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_floor_bounds_rollback_search() {
    let bundles = vec![bundle(1, "1.0"), bundle(2, "1.0"), disabled(bundle(3, "1.0"))];

    let report = ClientReport::new(Platform::Android, bid(3)).with_min_bundle_id(bid(1));
    assert_all(&bundles, &report, rollback_to(2));

    let report = ClientReport::new(Platform::Android, bid(3)).with_min_bundle_id(bid(2));
    assert_all(&bundles, &report, Decision::NoAction);
}

#[test]
fn test_version_set_gates_updates() {
    let bundles = vec![bundle(1, "1.0"), bundle(2, "2.0")];
    let report = ClientReport::new(Platform::Android, bid(1));

    for (name, source) in all_sources(&bundles) {
        let engine = UpdateEngine::new(source);
        let only_old = engine.decide(&report, &versions(&["1.0"])).unwrap();
        assert_eq!(only_old, Decision::NoAction, "source: {name}");

        let empty = engine.decide(&report, &VersionSet::new()).unwrap();
        assert_eq!(empty, Decision::NoAction, "source: {name}");

        let both = engine.decide(&report, &versions(&["1.0", "2.0"])).unwrap();
        assert_eq!(both, update_to(2), "source: {name}");
    }
}

#[test]
fn test_version_set_ignores_enabled_and_channel() {
    let bundles = vec![
        bundle(1, "1.0"),
        disabled(bundle(2, "2.0")),
        on_channel(bundle(3, "3.0"), "staging"),
        on_platform(bundle(4, "4.0"), Platform::Ios),
    ];

    for (name, source) in all_sources(&bundles) {
        let all = source
            .list_target_versions(Platform::Android, &BundleId::nil())
            .unwrap();
        assert_eq!(all, versions(&["1.0", "2.0", "3.0"]), "source: {name}");

        let above = source
            .list_target_versions(Platform::Android, &bid(2))
            .unwrap();
        assert_eq!(above, versions(&["2.0", "3.0"]), "source: {name}");
    }
}

#[test]
fn test_resolved_ids_respect_floor() {
    let bundles: Vec<Bundle> = (1..=6)
        .map(|n| {
            let b = bundle(n, if n % 2 == 0 { "2.0" } else { "1.0" });
            if n == 5 {
                disabled(b)
            } else {
                b
            }
        })
        .collect();

    for (name, source) in all_sources(&bundles) {
        let engine = UpdateEngine::new(source);
        for current in 0..=7u16 {
            for floor in 0..=7u16 {
                let report = ClientReport::new(Platform::Android, bid(current))
                    .with_min_bundle_id(bid(floor));
                let decision = engine.check(&report).unwrap();
                match &decision {
                    Decision::Update { id, .. } | Decision::Rollback { id, .. } => {
                        assert!(*id > bid(floor), "source: {name}, {decision:?}");
                        assert_ne!(*id, bid(current), "source: {name}");
                        assert_ne!(*id, bid(5), "disabled bundle offered ({name})");
                    }
                    Decision::ResetToBase | Decision::NoAction => {}
                }
            }
        }
    }
}

struct FailingSource;

impl BundleSource for FailingSource {
    fn query_update_candidate(
        &self,
        _query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        Err(ServiceError::DatabaseError(rusqlite::Error::InvalidQuery))
    }

    fn query_rollback_candidate(
        &self,
        _query: &CandidateQuery<'_>,
    ) -> Result<Option<Bundle>, ServiceError> {
        Ok(None)
    }

    fn bundle_exists(&self, _bundle_id: &BundleId, _platform: Platform) -> Result<bool, ServiceError> {
        Ok(true)
    }

    fn list_target_versions(
        &self,
        _platform: Platform,
        _min_bundle_id: &BundleId,
    ) -> Result<VersionSet, ServiceError> {
        Ok(versions(&["1.0"]))
    }
}

#[test]
fn test_storage_failure_is_not_no_action() {
    let engine = UpdateEngine::new(FailingSource);
    let result = engine.check(&ClientReport::new(Platform::Android, bid(1)));
    assert!(matches!(result, Err(ServiceError::DatabaseError(_))));
}
