use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use syncker_core::{CommandContext, GlobalOptions, SystemEffects};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::SynckerCli;
use output::OutputOptions;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = SynckerCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
        no_color: cli.no_color,
    };

    let info = dispatch::command_info(&cli.command);
    let outcome = match CommandContext::new(&global, Arc::new(SystemEffects::new())) {
        Ok(ctx) => dispatch::dispatch_command(&ctx, &cli.command),
        Err(err) => syncker_core::error_outcome(&err),
    };
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };
    let code = output::emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 if quiet => "warn",
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("syncker_cli={level},syncker_core={level},syncker_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
