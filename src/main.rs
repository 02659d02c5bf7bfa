use clap::Parser;
use collect_columns::cli::Cli;
use collect_columns::CollectError;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    let result = cli
        .into_options()
        .and_then(|opts| collect_columns::run(&opts).map(|report| (opts, report)));

    match result {
        Ok((opts, report)) => {
            report.log();
            info!(
                "merged {} table(s) into {:?}",
                opts.tables.len(),
                opts.output
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<CollectError>() {
                Some(ce) if ce.is_usage_error() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
