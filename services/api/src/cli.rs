use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fate_trials::error::AppError;
use fate_trials::trials::catalog::TrialCatalog;

#[derive(Parser, Debug)]
#[command(
    name = "Fate Trials Service",
    about = "Run and demonstrate the trial session and fate allocation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the built-in trial catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Run a scripted offline demo: one narrated trial plus a seeded cohort
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List every registered trial package
    List,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog {
            command: CatalogCommand::List,
        } => list_catalog(),
        Command::Demo(args) => run_demo(args).await,
    }
}

fn list_catalog() -> Result<(), AppError> {
    let catalog = TrialCatalog::standard()?;
    println!("Registered trial packages");
    for package in catalog.packages() {
        println!(
            "- {} [{}] chance {:.2} tags {:?}",
            package.key,
            package.kind.label(),
            package.trigger_chance,
            package.tags
        );
        println!("    {}: {}", package.name, package.description);
    }
    Ok(())
}
