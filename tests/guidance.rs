mod common;

use common::synthetic_throws::{aimed_throw, throws_towards};
use stronghold_resolver::guidance::MISMEASURE_WARNING;
use stronghold_resolver::{EyeThrow, Prediction, ResolverParams, StrongholdResolver, ThrowKind};

#[test]
fn adjacent_leaders_report_combined_certainty() {
    common::init_logging();
    let resolver = StrongholdResolver::new(ResolverParams::default());
    let predictions = vec![
        Prediction::new(10, -20, 0.55),
        Prediction::new(11, -20, 0.30),
        Prediction::new(40, 3, 0.15),
    ];
    let throws = [EyeThrow::new(8.0, 8.0, 175.0, ThrowKind::Normal)];
    let guidance = resolver.guidance(&predictions, &throws);
    let combined = guidance.combined_certainty_percent.expect("combined certainty");
    assert!((combined - 85.0).abs() < 1e-9);
    // A single throw always gets direction advice.
    assert!(guidance.next_throw.is_some());
}

#[test]
fn empty_posterior_gives_no_guidance() {
    let resolver = StrongholdResolver::new(ResolverParams::default());
    let throws = [EyeThrow::new(8.0, 8.0, 175.0, ThrowKind::Normal)];
    let guidance = resolver.guidance(&[], &throws);
    assert!(guidance.combined_certainty_percent.is_none());
    assert!(guidance.next_throw.is_none());
    assert!(guidance.warning.is_none());
}

#[test]
fn consistent_throws_raise_no_warning() {
    common::init_logging();
    let resolver = StrongholdResolver::new(ResolverParams::default());
    let throws = throws_towards((100, 60), &[(0.0, 0.0), (1600.0, 0.0)]);
    let report = resolver.resolve(&throws);
    assert!(report.result.guidance.warning.is_none());
}

#[test]
fn conflicting_throws_raise_the_mismeasure_warning() {
    common::init_logging();
    let resolver = StrongholdResolver::new(ResolverParams::default());
    // Two throws agree on the chunk; the third misses it by a full degree,
    // so no chunk fits all three within a few sigma.
    let mut throws = throws_towards((100, 60), &[(0.0, 0.0), (1600.0, 0.0)]);
    throws.push(aimed_throw(3000.0, 1500.0, (100, 60), ThrowKind::Normal).rotated(1.0));
    let report = resolver.resolve(&throws);
    assert!(report.result.found);
    assert_eq!(
        report.result.guidance.warning.as_deref(),
        Some(MISMEASURE_WARNING)
    );
}
