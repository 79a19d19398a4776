// Entrypoint for the CLI application.
// - Keeps `main` small: init logging, create an API client and hand
//   stdin/stdout to the session loop.
// - Returns `anyhow::Result` to simplify error handling.

use foodlog_cli::{api::ApiClient, session::run_session};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr and stay quiet unless RUST_LOG says
    // otherwise, keeping stdout clean for the interactive session.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Base URL comes from the environment variable `FOOD_API_URL` or
    // defaults to http://localhost:3001. See `api::ApiClient::from_env`.
    let api = ApiClient::from_env()?;

    // Run the interactive session. This call blocks until stdin closes.
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_session(&api, stdin.lock(), stdout.lock())?;
    Ok(())
}
