//! Show command: one instance with its labels, value and links

use clap::Args;

use crate::AppContext;

#[derive(Args)]
pub struct ShowArgs {
    /// Instance id
    pub id: String,
}

pub fn run(args: &ShowArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let Some(instance) = ctx.store.find_by_id(&args.id) else {
        anyhow::bail!("Instance '{}' not found", args.id);
    };
    tracing::info!("Found instance: {}", args.id);

    let labels: Vec<&str> = instance.labels().map(|l| l.as_str()).collect();
    println!("Instance: {}", instance.id());
    println!("  Types: {}", labels.join(", "));
    if let Some(value) = instance.value() {
        println!("  Value: {}", value);
    }

    if instance.degree() > 0 {
        println!("  Links:");
        for edge_type in instance.edge_types() {
            let targets: Vec<&str> = ctx
                .store
                .neighbors(instance.id().as_str(), edge_type.as_str())?
                .into_iter()
                .map(|n| n.id().as_str())
                .collect();
            println!("    {} -> {}", edge_type, targets.join(", "));
        }
    }
    Ok(())
}
