use clap::{Parser, Subcommand};
use flapjack_core::FoodItem;

mod commands;

#[derive(Parser)]
#[command(name = "flapjack", version, about = "Flapjack 24-hour challenge tracker")]
struct Cli {
    /// Identity to act as (overrides `user.identity`)
    #[arg(long = "as", global = true, value_name = "IDENTITY")]
    identity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the countdown once
    Status {
        /// Print a JSON snapshot instead of the text view
        #[arg(long)]
        json: bool,
    },
    /// Start the challenge (admin)
    Start,
    /// Log one food item (admin)
    Add {
        /// pancake, bacon, sausage or helper
        item: FoodItem,
    },
    /// Zero all counters and stop the countdown (admin)
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Live public view, refreshed every tick and on every change
    Watch,
    /// Interactive admin console
    Admin,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env("FLAPJACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn with_context(
    identity: Option<String>,
    f: impl FnOnce(&commands::AppContext) -> commands::CliResult,
) -> commands::CliResult {
    let ctx = commands::AppContext::load(identity)?;
    f(&ctx)
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let identity = cli.identity;
    let result = match cli.command {
        Commands::Status { json } => with_context(identity, |ctx| commands::status::run(ctx, json)),
        Commands::Start => with_context(identity, commands::challenge::start),
        Commands::Add { item } => with_context(identity, |ctx| commands::challenge::add(ctx, item)),
        Commands::Reset { yes } => with_context(identity, |ctx| commands::challenge::reset(ctx, yes)),
        Commands::Watch => with_context(identity, commands::live::watch),
        Commands::Admin => with_context(identity, commands::live::admin),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
