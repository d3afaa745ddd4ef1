mod common;

use common::synthetic_throws::{aimed_throw, certainty_sum, throws_towards, uniform_prior};
use stronghold_resolver::angle::{bearing_to_chunk_deg, chunk_center_blocks, signed_residual_deg};
use stronghold_resolver::conditioner::closest_stronghold_factor;
use stronghold_resolver::density::DensityField;
use stronghold_resolver::posterior::posterior_from_prior;
use stronghold_resolver::rings::max_stronghold_distance_blocks;
use stronghold_resolver::{ResolverParams, SigmaSettings, StrongholdResolver, ThrowKind};

const RING_ZERO_TARGET: (i32, i32) = (100, 60);

fn resolver() -> StrongholdResolver {
    StrongholdResolver::new(ResolverParams::default())
}

#[test]
fn zero_throws_are_not_found() {
    common::init_logging();
    let report = resolver().resolve(&[]);
    let result = &report.result;
    assert!(!result.found);
    assert!(result.predictions.is_empty());
    assert!(result.top.is_none());
    assert!(result.target.is_none());
    assert!(result.native_chunk.is_none());
    assert!(result.guidance.next_throw.is_none());
    assert_eq!(report.trace.throw_count, 0);
    assert!(resolver().predictions(&[]).is_none());
}

#[test]
fn first_throw_candidates_stay_inside_its_cone() {
    common::init_logging();
    let throw = aimed_throw(0.0, 0.0, RING_ZERO_TARGET, ThrowKind::Normal);
    let report = resolver().resolve(&[throw]);
    let result = &report.result;
    assert!(result.found);
    assert!(report.trace.candidate_count > 0);
    assert!((certainty_sum(&result.predictions) - 1.0).abs() < 1e-6);

    // 30 sigma capped at one degree, plus the angular size of half a chunk
    // diagonal.
    let tolerance_deg = (30.0 * SigmaSettings::default().normal).min(1.0);
    for p in &result.predictions {
        let dx = chunk_center_blocks(p.chunk_x) - throw.x;
        let dz = chunk_center_blocks(p.chunk_z) - throw.z;
        let distance = (dx * dx + dz * dz).sqrt();
        let slack = (12.0 / distance).min(1.0).asin().to_degrees();
        let residual =
            signed_residual_deg(bearing_to_chunk_deg(p.chunk_x, p.chunk_z, throw.x, throw.z), throw.angle_deg);
        assert!(
            residual.abs() <= tolerance_deg + slack,
            "chunk ({}, {}) is {residual:.3}° off the bearing",
            p.chunk_x,
            p.chunk_z
        );
    }

    // One throw is never conclusive, so direction advice is forced.
    assert!(result.guidance.next_throw.is_some());
    assert!(result.native_chunk.is_none());
}

#[test]
fn two_throws_in_ring_zero_resolve_the_chunk() {
    common::init_logging();
    let throws = throws_towards(RING_ZERO_TARGET, &[(0.0, 0.0), (1600.0, 0.0)]);
    let report = resolver().resolve(&throws);
    let result = &report.result;

    assert!(result.found);
    assert!(!result.low_confidence);
    assert_eq!(result.top.map(|p| p.chunk()), Some(RING_ZERO_TARGET));
    assert_eq!(result.target, Some(RING_ZERO_TARGET));
    assert!(!result.target_from_triangulation);
    assert_eq!(result.native_chunk, Some(RING_ZERO_TARGET));

    assert!((certainty_sum(&result.predictions) - 1.0).abs() < 1e-6);
    assert!(result.predictions.len() <= 4096);
    assert!(result
        .predictions
        .windows(2)
        .all(|w| w[0].certainty >= w[1].certainty));

    let trace = &report.trace;
    assert!(trace.conditioner.is_some());
    assert!(!trace.incremental);
    for stage in ["candidates", "posterior", "conditioner", "ranking", "triangulation", "guidance"] {
        assert!(trace.timings.stage_ms(stage).is_some(), "missing stage {stage}");
    }
    assert!(report.summary_line().starts_with("found=true"));
}

#[test]
fn uniform_prior_and_triangulation_agree_off_ring() {
    common::init_logging();
    let target = (12, -40);
    let throws = throws_towards(target, &[(0.0, 0.0), (400.0, 0.0)]);
    let sigmas = SigmaSettings::default();

    let posterior = posterior_from_prior(uniform_prior(target, 6), &throws, &sigmas)
        .expect("throws cross inside the prior");
    let top = posterior
        .iter()
        .max_by(|a, b| a.certainty.total_cmp(&b.certainty))
        .copied()
        .expect("non-empty posterior");
    assert_eq!(top.chunk(), target);
    assert!((certainty_sum(&posterior) - 1.0).abs() < 1e-9);

    let tri = resolver().triangulate(&throws).expect("crossing throws");
    assert_eq!(tri.chunk(), target);

    // The ring prior has no mass this close to spawn, but the native
    // triangulation is still reported alongside the posterior.
    let report = resolver().resolve(&throws);
    assert_eq!(report.result.native_chunk, Some(target));
}

#[test]
fn triangulation_is_the_target_when_the_posterior_is_empty() {
    common::init_logging();
    // Far outside the outermost ring and looking away from spawn.
    let target = (2500, 10);
    let throws = throws_towards(target, &[(30000.0, 0.0), (30000.0, 800.0)]);
    let report = resolver().resolve(&throws);
    let result = &report.result;
    assert!(!result.found);
    assert!(result.predictions.is_empty());
    assert_eq!(result.native_chunk, Some(target));
    assert_eq!(result.target, Some(target));
    assert!(result.target_from_triangulation);
}

#[test]
fn closest_stronghold_factors_never_exceed_one() {
    common::init_logging();
    let throws = throws_towards(RING_ZERO_TARGET, &[(0.0, 0.0), (1600.0, 0.0)]);
    let predictions = resolver()
        .predictions(&throws[..1])
        .expect("single throw posterior");
    let reference = throws[0];
    let field = DensityField::shared();
    let max_distance = max_stronghold_distance_blocks(reference.x, reference.z) / 16.0;

    let mut evaluated = 0;
    for p in predictions.iter().take(200) {
        if let Some(factor) = closest_stronghold_factor(p.chunk(), &reference, field, max_distance, 7) {
            assert!((0.0..=1.0).contains(&factor), "factor {factor} for {:?}", p.chunk());
            evaluated += 1;
        }
    }
    assert!(evaluated > 0);
}
