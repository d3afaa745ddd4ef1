use stronghold_resolver::config::demo::{self, OutputFormat, ResolveDemoConfig};
use stronghold_resolver::config::io::write_json_file;
use stronghold_resolver::correction::{correct_throw, resolve_boat_init_angle};
use stronghold_resolver::diagnostics::{format_candidate_row, PlayerPose, ResolveReport};
use stronghold_resolver::{NudgeDirection, NudgeOutcome, StrongholdResolver, ThrowSession};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = demo::load_config(Path::new(&config_path))?;
    if config.throws.is_empty() {
        return Err("Config contains no throws".to_string());
    }

    let resolver = StrongholdResolver::new(config.params.clone());
    let mut session = build_session(&config)?;
    apply_nudges(&mut session, &config);
    let report = session.resolve(&resolver);

    if config.output.format.includes_text() {
        let pose = config.pose.unwrap_or_else(|| pose_from_last_throw(&session));
        print_text_summary(&report, &pose, config.output.max_rows);
    }

    if config.output.format.includes_json() {
        if let Some(path) = &config.output.json_out {
            write_json_file(path, &report)?;
            if config.output.format == OutputFormat::Both {
                println!("\nJSON report written to {}", path.display());
            } else {
                println!("JSON report written to {}", path.display());
            }
        } else {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
            if config.output.format == OutputFormat::Both {
                println!("\nJSON report:\n{json}");
            } else {
                println!("{json}");
            }
        }
    }

    Ok(())
}

fn build_session(config: &ResolveDemoConfig) -> Result<ThrowSession, String> {
    let mut session = ThrowSession::new();
    let boat_angle = match &config.correction {
        Some(c) => match c.boat_angle_deg {
            Some(raw) => Some(
                resolve_boat_init_angle(raw)
                    .ok_or_else(|| format!("Boat angle {raw} is not on the boat lattice"))?,
            ),
            None => None,
        },
        None => None,
    };
    for (i, raw) in config.throws.iter().enumerate() {
        let throw = match &config.correction {
            Some(c) => correct_throw(*raw, &c.boat, boat_angle),
            None => *raw,
        };
        if !session.push(throw) {
            eprintln!("Throw {} ignored (duplicate or looking down)", i + 1);
        }
    }
    Ok(session)
}

fn apply_nudges(session: &mut ThrowSession, config: &ResolveDemoConfig) {
    let direction = if config.nudge_steps >= 0 {
        NudgeDirection::Increase
    } else {
        NudgeDirection::Decrease
    };
    for _ in 0..config.nudge_steps.unsigned_abs() {
        match session.nudge_last(direction, &config.params.angle_adjustment) {
            NudgeOutcome::Applied(_) => {}
            NudgeOutcome::LimitReached => {
                eprintln!("Adjustment limit reached");
                break;
            }
            NudgeOutcome::Unavailable => break,
        }
    }
}

fn pose_from_last_throw(session: &ThrowSession) -> PlayerPose {
    session
        .adjusted_throws()
        .last()
        .map(|t| PlayerPose {
            x: t.x,
            z: t.z,
            yaw_deg: t.angle_deg,
        })
        .unwrap_or_default()
}

fn print_text_summary(report: &ResolveReport, pose: &PlayerPose, max_rows: usize) {
    let res = &report.result;
    let trace = &report.trace;
    println!("Resolve summary");
    println!("  found: {}", res.found);
    println!("  throws: {}", trace.throw_count);
    println!("  latency_ms: {:.3}", res.latency_ms);
    match res.target {
        Some((x, z)) => println!(
            "  target: chunk ({x}, {z}){}{}",
            if res.target_from_triangulation { " [triangulated]" } else { "" },
            if res.low_confidence { " [low confidence]" } else { "" }
        ),
        None => println!("  target: unavailable"),
    }
    if let Some(t) = &trace.triangulation {
        println!(
            "  triangulation: chunk ({}, {}) at ({:.1}, {:.1}) objective={:.4}",
            t.chunk_x, t.chunk_z, t.intersection_x, t.intersection_z, t.objective
        );
    }

    println!("\nCandidates");
    if res.predictions.is_empty() {
        println!("  none");
    }
    for (i, p) in res.predictions.iter().take(max_rows).enumerate() {
        println!("  {}", format_candidate_row(i + 1, p, pose, true));
    }

    let guidance = &res.guidance;
    println!("\nGuidance");
    println!("  combined: {}", format_opt(guidance.combined_certainty_percent));
    match guidance.next_throw {
        Some(next) => println!(
            "  next throw: {} blocks left or {} blocks right",
            next.left_blocks, next.right_blocks
        ),
        None => println!("  next throw: -"),
    }
    if let Some(warning) = &guidance.warning {
        println!("  warning: {warning}");
    }

    let stages = trace
        .timings
        .stages
        .iter()
        .map(|s| format!("{}={:.3}", s.label, s.elapsed_ms))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "\nTimings (ms): {stages} total={:.3}{}",
        trace.timings.total_ms,
        if trace.incremental { " (incremental)" } else { "" }
    );
    if let Some(c) = &trace.conditioner {
        println!(
            "Conditioner: evaluated={} mean_factor={:.4}",
            c.evaluated, c.mean_factor
        );
    }
}

fn format_opt(val: Option<f64>) -> String {
    val.map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn usage() -> String {
    "Usage: resolve_demo <config.json>".to_string()
}
