use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use task_cli::TaskStore;
use task_cli::commands::{self, Cli, USAGE};
use task_cli::config::Config;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let config = Config::new().context("cannot read task-cli configuration")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_level())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            err.print()?;
            return Ok(());
        }
        Err(err) => {
            debug!(error = %err, "unrecognized command line");
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let Some(command) = cli.command else {
        println!("{}", USAGE);
        return Ok(());
    };

    let store = TaskStore::new(config.tasks_file());
    commands::run(&store, command, &mut std::io::stdout().lock())
}
