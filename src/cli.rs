use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{
    asc::Session,
    build_bundles, builds, game_center, iap, localizations, testflight,
};

#[derive(Parser, Debug)]
#[command(name = "asc", version, about = "App Store Connect CLI in Rust", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage builds
    Builds {
        #[command(subcommand)]
        command: builds::BuildsCommand,
    },
    /// TestFlight app metadata localizations
    BetaAppLocalizations {
        #[command(subcommand)]
        command: localizations::BetaAppLocalizationsCommand,
    },
    /// TestFlight what-to-test localizations
    BetaBuildLocalizations {
        #[command(subcommand)]
        command: localizations::BetaBuildLocalizationsCommand,
    },
    /// App Store version localizations reached through a build
    BuildLocalizations {
        #[command(subcommand)]
        command: localizations::BuildLocalizationsCommand,
    },
    /// Build bundle details
    BuildBundles {
        #[command(subcommand)]
        command: build_bundles::BuildBundlesCommand,
    },
    /// Game Center configuration
    GameCenter {
        #[command(subcommand)]
        command: game_center::GameCenterCommand,
    },
    /// In-app purchases
    Iap {
        #[command(subcommand)]
        command: iap::IapCommand,
    },
    /// TestFlight groups, testers, and metrics
    Testflight {
        #[command(subcommand)]
        command: testflight::TestflightCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    // Credentials load lazily so input validation runs without them.
    let session = Session::new(cli.verbose);

    match cli.command {
        Commands::Builds { command } => builds::run(&session, command).await,
        Commands::BetaAppLocalizations { command } => {
            localizations::run_beta_app(&session, command).await
        }
        Commands::BetaBuildLocalizations { command } => {
            localizations::run_beta_build(&session, command).await
        }
        Commands::BuildLocalizations { command } => {
            localizations::run_build_localizations(&session, command).await
        }
        Commands::BuildBundles { command } => build_bundles::run(&session, command).await,
        Commands::GameCenter { command } => game_center::run(&session, command).await,
        Commands::Iap { command } => iap::run(&session, command).await,
        Commands::Testflight { command } => testflight::run(&session, command).await,
    }
}
