use clap::{Parser, ValueEnum};
use financial_agent_pipelines::{
    config::AppConfig,
    registry::Registries,
    tools::create_default_registry,
    usecases::{self, UseCase},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    A,
    B,
    C,
    All,
}

impl Target {
    fn selection(self) -> Vec<UseCase> {
        match self {
            Target::A => vec![UseCase::Budget],
            Target::B => vec![UseCase::Prequal],
            Target::C => vec![UseCase::Refinance],
            Target::All => UseCase::ALL.to_vec(),
        }
    }
}

/// Run the financial agent pipelines
#[derive(Debug, Parser)]
#[command(name = "pipelines", version, about)]
struct Cli {
    /// Which use case to run
    #[arg(value_enum, default_value = "all")]
    target: Target,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout carries only the reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    info!(
        selection = ?cli.target,
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        "Financial agent pipelines starting"
    );

    let tools = Arc::new(create_default_registry());
    let registries = Registries::load(
        &config.agents_registry,
        &config.tools_registry,
        config.duplicate_policy,
    )?;

    registries.cross_check(&tools)?;
    info!(
        agents = registries.agents.len(),
        tools = registries.tools.len(),
        "Registries loaded"
    );

    usecases::run(&cli.target.selection(), &config, &registries, tools)?;

    info!("Done");
    Ok(())
}
