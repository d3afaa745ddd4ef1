use stronghold_resolver::angle::bearing_to_chunk_deg;
use stronghold_resolver::{EyeThrow, ResolverParams, StrongholdResolver, ThrowKind};

fn main() {
    env_logger::init();

    // Demo: two throws aimed at chunk (100, 60) from different positions.
    let target = (100, 60);
    let throws = [(0.0, 0.0), (1600.0, 0.0)].map(|(x, z)| {
        let angle = bearing_to_chunk_deg(target.0, target.1, x, z);
        EyeThrow::new(x, z, angle, ThrowKind::Normal)
    });

    let resolver = StrongholdResolver::new(ResolverParams::default());
    let report = resolver.resolve(&throws);
    println!("{}", report.summary_line());
}
