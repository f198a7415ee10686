use anyhow::Context;
use budget::{
    commands::{self, Output},
    config::{CliArgs, Config, LoggingConfig},
    Service,
};
use budget_redb::RedbStorage;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli)?;
    setup_logging(&config.logging);

    if let Some(parent) = config.store.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("couldn't create directory {}", parent.display()))?;
        }
    }

    let storage = RedbStorage::new(&config.store.path).context("couldn't open store")?;
    let service = Service::from_storage(&storage);

    let output = if cli.json { Output::Json } else { Output::Table };
    commands::run(cli.command, &service, output)
}

fn setup_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout is reserved for command output
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
