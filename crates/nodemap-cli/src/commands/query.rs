//! Query command: optional edits, then a path projection

use clap::Args;

use nodemap_core::QueryPath;

use crate::output::{format_projections, OutputFormat};
use crate::AppContext;

#[derive(Args)]
pub struct QueryArgs {
    /// Query path as JSON, e.g. '["Contact", ["PersonName"], ["Academy", "Director"]]'
    pub path: String,

    /// Remove an instance (and all its links) before querying
    #[arg(long = "remove", value_name = "ID")]
    pub remove: Vec<String>,

    /// Remove a link before querying
    #[arg(long = "unlink", value_name = "FROM:EDGE:TO")]
    pub unlink: Vec<String>,
}

/// Split `FROM:EDGE:TO`
fn parse_link(spec: &str) -> anyhow::Result<(&str, &str, &str)> {
    let mut parts = spec.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(from), Some(edge), Some(to))
            if !from.is_empty() && !edge.is_empty() && !to.is_empty() =>
        {
            Ok((from, edge, to))
        }
        _ => anyhow::bail!("Invalid link '{}', expected FROM:EDGE:TO", spec),
    }
}

pub fn run(args: &QueryArgs, ctx: &mut AppContext) -> anyhow::Result<()> {
    let path = QueryPath::from_json(&args.path)?;

    for id in &args.remove {
        ctx.store.remove_instance(id)?;
        tracing::info!("Removed instance {}", id);
    }
    for spec in &args.unlink {
        let (from, edge, to) = parse_link(spec)?;
        if !ctx.store.remove_link(from, edge, to) {
            tracing::warn!("No {} link between {} and {}", edge, from, to);
        }
    }

    let roots = ctx.store.query(&path)?;
    tracing::info!("Query returned {} projections", roots.len());

    print!("{}", format_projections(&roots, &ctx.store, ctx.format)?);
    if ctx.format != OutputFormat::Tree {
        println!();
    }
    Ok(())
}
