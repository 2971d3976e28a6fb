//! Guardrail command-line host
//!
//! Wires configuration loading, logging and the safety engine together for
//! the `guardrail` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Commands, InputArgs, RulesCommand};
pub use commands::{build_engine, execute, load_config, Outcome};
pub use error::{CliError, CliResult};

/// Run a parsed command line: load configuration, start logging, execute
pub async fn run(cli: Cli) -> CliResult<Outcome> {
    // `init` writes a configuration and must not require a readable one
    if let Commands::Init { path, force } = &cli.command {
        let notice = commands::init(path, *force)?;
        return Ok(Outcome {
            output: output::render(&notice, cli.json)?,
            success: true,
        });
    }

    let config = load_config(cli.config.as_deref()).await?;
    let settings = config
        .as_ref()
        .map(|c| c.settings.clone())
        .unwrap_or_default();
    logging::init_logging(logging::resolve_level(cli.log_level.as_deref(), &settings)?);

    let engine = build_engine(config)?;
    tracing::debug!("Engine ready with {} rule(s)", engine.list_rules().len());
    execute(cli.command, engine, cli.json)
}
