use clap::Parser;
use dealflow::cli::{commands, Cli};
use dealflow::config::ConfigLoader;
use tracing::{debug, error, trace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load().await;

    let log_level = match cli.verbose {
        0 => config
            .as_ref()
            .map(|c| c.get_log_level().to_string())
            .unwrap_or_else(|_| "info".to_string()),
        1 => "debug".to_string(),
        2 => "trace".to_string(),
        _ => "trace,hyper=debug,reqwest=debug".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("dealflow started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match config {
        Ok(config) => commands::execute(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
