use clap::Parser;
use pastee_lib::bootstrap::{init_tracing_subscriber, load_config, wire_dependencies};
use pastee_lib::cli::{self, Cli};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let settings = load_config(args.config.as_deref())?;
    init_tracing_subscriber(&settings.logging)?;
    info!(page_size = settings.store.page_size, "pastee starting");

    let deps = wire_dependencies(&settings, args.seed.as_deref())?;
    let listener = deps.store.init_listener().await;

    let report = cli::run(&args, &deps.store).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(guard) = listener {
        guard.dispose();
    }
    Ok(())
}
