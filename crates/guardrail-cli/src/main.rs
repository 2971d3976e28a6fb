use std::process::ExitCode;

use clap::Parser;
use guardrail_cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let outcome = run(cli)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("{}", outcome.output);

    // Unsafe or invalid content is reported with a distinct exit status
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(3)
    })
}
