//! Load command: reports what a dataset produces

use crate::output::OutputFormat;
use crate::AppContext;

pub fn run(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ctx.report)?);
        return Ok(());
    }

    println!(
        "Loaded {} instances and {} links",
        ctx.report.instances, ctx.report.links
    );

    let mut labels: Vec<_> = ctx
        .store
        .labels()
        .map(|label| (label.as_str(), ctx.store.find_by_type(label.as_str()).len()))
        .collect();
    labels.sort();
    for (label, count) in labels {
        println!("  {}: {}", label, count);
    }

    if !ctx.report.broken_links.is_empty() {
        println!("Broken links ({}):", ctx.report.broken_links.len());
        for link in &ctx.report.broken_links {
            println!("  {} -[{}]-> {}", link.from, link.edge_type, link.to);
        }
    }
    Ok(())
}
