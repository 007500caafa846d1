mod cli;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use tfplan_report::{output, report, summarizers};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => {
            let config = args.report_config();
            let summarizer = args
                .summarizer
                .summarizer
                .as_deref()
                .map(|name| summarizers::get_summarizer(name, &args.summarizer.config()))
                .transpose()?;

            let outcome = report::generate_report(&config, summarizer.as_deref()).await?;
            tracing::info!(
                files = outcome.stats.files,
                resource_changes = outcome.stats.resource_changes,
                text_chunks = outcome.stats.text_chunks,
                skipped_text_files = outcome.stats.skipped_text_files,
                rows = outcome.rows.len(),
                "report complete"
            );
            println!(
                "Generated plan HTML written to {}",
                outcome.output_path.display()
            );
        }
        Command::Inspect(args) => {
            let rows = output::inspect_plans(&args.plans_dir)?;
            tracing::info!(count = rows.len(), "inspection complete");
            println!("{}", output::render_table(&rows));
        }
    }

    Ok(())
}
