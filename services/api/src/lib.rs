mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use fate_trials::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
