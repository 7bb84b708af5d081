use clap::Parser;
use color_eyre::Result;
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;

use chrono::Utc;
use pgpkeys::cli::{run_cli, Cli};
use pgpkeys::config::Config;

fn main() -> Result<()> {
    color_eyre::install()?;
    // load environment variables from .env file, if present
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| color_eyre::eyre::eyre!("{:#}", e))?;

    setup_logging(cli.verbose, config.log_file.clone())?;

    if let Err(e) = run_cli(cli, config) {
        eprintln!("pgpkeys error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn setup_logging(verbose: bool, log_file: Option<PathBuf>) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    use std::fs::OpenOptions;
    use std::io::Write;

    Builder::from_default_env()
        .format(move |buf, record| {
            let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let s = format!(
                "[{}] {} [{}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            );

            // Also write to file
            if let Some(path) = &log_file {
                if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                    let _ = writeln!(file, "{}", s);
                }
            }

            writeln!(buf, "{}", s)
        })
        .filter(None, level)
        .init();

    Ok(())
}
