use clap::Parser;
use carpe::config::{CliConfig, LogFormat, Manifest};
use carpe::core::NamespaceStore;
use carpe::utils::error::{ErrorCategory, Result};
use carpe::utils::logger;

fn run(config: &CliConfig) -> Result<String> {
    let manifest = Manifest::from_file(&config.manifest)?;
    let store = NamespaceStore::new();
    let resolver = manifest.load_into(&store)?;
    config.command.execute(&store, &resolver)
}

fn main() {
    let config = CliConfig::parse();

    match config.log_format {
        LogFormat::Compact => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }
    tracing::debug!("CLI config: {:?}", config);

    match run(&config) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!("command failed: {} (category: {:?})", e, e.category());
            eprintln!("error: {e}");

            let exit_code = match e.category() {
                ErrorCategory::Configuration | ErrorCategory::Io => 2,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}
