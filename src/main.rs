use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_LOG_FILTER: &str = "washbuddy=info";

#[tokio::main]
async fn main() {
    init_logging();
    match cli::run() {
        cli::RunOutcome::Serve(config) => washbuddy::serve(config).await,
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
