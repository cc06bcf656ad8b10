use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tix_cli::cmd::{
    self, auth::AuthSubcommand, config::ConfigSubcommand, decompose::DecomposeArgs,
    epic::EpicArgs, estimate::EstimateArgs, qa::QaArgs,
};
use tix_cli::context::AppContext;

#[derive(Parser)]
#[command(
    name = "tix",
    about = "Jira assistant: AI-drafted descriptions, epics, decompositions and estimates",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config directory (default: ~/.config/tix)
    #[arg(long, global = true, env = "TIX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Answer yes to every confirmation
    #[arg(long, global = true, short = 'y')]
    yes: bool,

    /// Log progress to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the Jira connection
    Init,

    /// Inspect and edit the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Store API credentials
    Auth {
        #[command(subcommand)]
        subcommand: AuthSubcommand,
    },

    /// Show a ticket
    View {
        /// Ticket key (e.g. ENG-42)
        key: String,

        /// Also open the ticket in a browser
        #[arg(long)]
        open: bool,
    },

    /// Draft a ticket description through clarifying questions
    Qa(QaArgs),

    /// Plan a new epic with tasks
    Epic(EpicArgs),

    /// Break a ticket into estimated child tickets
    Decompose(DecomposeArgs),

    /// Estimate story points
    Estimate(EstimateArgs),

    /// List recently touched tickets
    Recent {
        /// How many to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => tix_core::paths::default_config_dir()?,
    };
    let app = || AppContext::load(&config_dir, cli.json, cli.yes);

    match cli.command {
        Commands::Init => cmd::init::run(&config_dir),
        Commands::Config { subcommand } => cmd::config::run(&config_dir, subcommand, cli.json),
        Commands::Auth { subcommand } => cmd::auth::run(&config_dir, subcommand, cli.json),
        Commands::Recent { limit } => cmd::recent::run(&config_dir, limit, cli.json),
        Commands::View { key, open } => cmd::view::run(&app()?, &key, open),
        Commands::Qa(args) => cmd::qa::run(&app()?, args),
        Commands::Epic(args) => cmd::epic::run(&app()?, args),
        Commands::Decompose(args) => cmd::decompose::run(&app()?, args),
        Commands::Estimate(args) => cmd::estimate::run(&app()?, args),
    }
}
