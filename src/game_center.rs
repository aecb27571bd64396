use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::{
    asc::Session,
    pagination::{self, PageArgs},
};

const CMD_SETS_LIST: &str = "game-center leaderboard-sets list";
const CMD_SET_LOCALIZATIONS_LIST: &str = "game-center leaderboard-sets localizations list";
const CMD_SET_MEMBERS_LIST: &str = "game-center leaderboard-sets members list";
const CMD_SET_MEMBER_LOCALIZATIONS_LIST: &str =
    "game-center leaderboard-sets member-localizations list";
const CMD_SET_RELEASES_LIST: &str = "game-center leaderboard-sets releases list";
const CMD_SETS_V2_LIST: &str = "game-center leaderboard-sets v2 list";
const CMD_SET_LOCALIZATIONS_V2_LIST: &str =
    "game-center leaderboard-sets v2 localizations list";
const CMD_SET_MEMBERS_V2_LIST: &str = "game-center leaderboard-sets v2 members list";
const CMD_SET_VERSIONS_V2_LIST: &str = "game-center leaderboard-sets v2 versions list";

#[derive(Debug, Subcommand)]
pub enum GameCenterCommand {
    /// Leaderboard sets of a Game Center detail
    LeaderboardSets {
        #[command(subcommand)]
        command: LeaderboardSetsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum LeaderboardSetsCommand {
    /// List leaderboard sets
    List(DetailListArgs),
    /// Leaderboard set localizations
    Localizations {
        #[command(subcommand)]
        command: LocalizationsCommand,
    },
    /// Leaderboards grouped into a set
    Members {
        #[command(subcommand)]
        command: MembersCommand,
    },
    /// Localizations of leaderboards inside sets
    MemberLocalizations {
        #[command(subcommand)]
        command: MemberLocalizationsCommand,
    },
    /// Leaderboard set releases
    Releases {
        #[command(subcommand)]
        command: ReleasesCommand,
    },
    /// The v2 Game Center API surface
    V2 {
        #[command(subcommand)]
        command: V2Command,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocalizationsCommand {
    /// List localizations of a leaderboard set
    List(SetListArgs),
}

#[derive(Debug, Subcommand)]
pub enum MembersCommand {
    /// List the leaderboards of a set
    List(SetListArgs),
}

#[derive(Debug, Subcommand)]
pub enum MemberLocalizationsCommand {
    /// List leaderboard set member localizations
    List(UnanchoredListArgs),
}

#[derive(Debug, Subcommand)]
pub enum ReleasesCommand {
    /// List releases of a leaderboard set
    List(SetListArgs),
}

#[derive(Debug, Subcommand)]
pub enum V2Command {
    /// List leaderboard sets (v2)
    List(DetailListArgs),
    /// Localizations of a leaderboard set version (v2)
    Localizations {
        #[command(subcommand)]
        command: V2LocalizationsCommand,
    },
    /// Leaderboards of a set (v2)
    Members {
        #[command(subcommand)]
        command: V2MembersCommand,
    },
    /// Versions of a leaderboard set (v2)
    Versions {
        #[command(subcommand)]
        command: V2VersionsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum V2LocalizationsCommand {
    /// List localizations of a leaderboard set version
    List(VersionListArgs),
}

#[derive(Debug, Subcommand)]
pub enum V2MembersCommand {
    /// List the leaderboards of a set
    List(SetListArgs),
}

#[derive(Debug, Subcommand)]
pub enum V2VersionsCommand {
    /// List versions of a leaderboard set
    List(SetListArgs),
}

#[derive(Debug, Args)]
pub struct DetailListArgs {
    /// Game Center detail ID anchoring the listing
    #[arg(long)]
    pub detail: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct SetListArgs {
    /// Leaderboard set ID anchoring the listing
    #[arg(long)]
    pub set: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct VersionListArgs {
    /// Leaderboard set version ID anchoring the listing
    #[arg(long)]
    pub version: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct UnanchoredListArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

/// Computes the constructed listing path. A missing anchor is fine when the
/// caller resumes from `--next`, since the cursor URL already encodes the
/// scope; otherwise the anchor flag is required.
pub fn anchored_default(
    command_path: &str,
    flag: &str,
    anchor: Option<&str>,
    has_next: bool,
    make_path: impl FnOnce(&str) -> String,
) -> Result<Option<String>> {
    match anchor {
        Some(id) => Ok(Some(make_path(id))),
        None if has_next => Ok(None),
        None => bail!("{command_path}: {flag} is required unless --next is provided"),
    }
}

async fn anchored_list(
    session: &Session,
    command_path: &str,
    flag: &str,
    anchor: Option<&str>,
    page: &PageArgs,
    make_path: impl FnOnce(&str) -> String,
) -> Result<()> {
    // Validate the cursor first so a bad --next wins over a missing anchor.
    if let Some(next) = &page.next {
        pagination::validate_next_url(next, command_path)?;
    }
    let default = anchored_default(command_path, flag, anchor, page.next.is_some(), make_path)?;
    pagination::run_list(session, command_path, default, page).await
}

pub async fn run(session: &Session, command: GameCenterCommand) -> Result<()> {
    let GameCenterCommand::LeaderboardSets { command } = command;
    match command {
        LeaderboardSetsCommand::List(args) => {
            anchored_list(
                session,
                CMD_SETS_LIST,
                "--detail",
                args.detail.as_deref(),
                &args.page,
                |d| format!("v1/gameCenterDetails/{d}/gameCenterLeaderboardSets"),
            )
            .await
        }
        LeaderboardSetsCommand::Localizations {
            command: LocalizationsCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_LOCALIZATIONS_LIST,
                "--set",
                args.set.as_deref(),
                &args.page,
                |s| format!("v1/gameCenterLeaderboardSets/{s}/localizations"),
            )
            .await
        }
        LeaderboardSetsCommand::Members {
            command: MembersCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_MEMBERS_LIST,
                "--set",
                args.set.as_deref(),
                &args.page,
                |s| format!("v1/gameCenterLeaderboardSets/{s}/gameCenterLeaderboards"),
            )
            .await
        }
        LeaderboardSetsCommand::MemberLocalizations {
            command: MemberLocalizationsCommand::List(args),
        } => {
            pagination::run_list(
                session,
                CMD_SET_MEMBER_LOCALIZATIONS_LIST,
                Some("v1/gameCenterLeaderboardSetMemberLocalizations".to_string()),
                &args.page,
            )
            .await
        }
        LeaderboardSetsCommand::Releases {
            command: ReleasesCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_RELEASES_LIST,
                "--set",
                args.set.as_deref(),
                &args.page,
                |s| format!("v1/gameCenterLeaderboardSets/{s}/releases"),
            )
            .await
        }
        LeaderboardSetsCommand::V2 { command } => run_v2(session, command).await,
    }
}

async fn run_v2(session: &Session, command: V2Command) -> Result<()> {
    match command {
        V2Command::List(args) => {
            anchored_list(
                session,
                CMD_SETS_V2_LIST,
                "--detail",
                args.detail.as_deref(),
                &args.page,
                |d| format!("v1/gameCenterDetails/{d}/gameCenterLeaderboardSetsV2"),
            )
            .await
        }
        V2Command::Localizations {
            command: V2LocalizationsCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_LOCALIZATIONS_V2_LIST,
                "--version",
                args.version.as_deref(),
                &args.page,
                |v| format!("v2/gameCenterLeaderboardSetVersions/{v}/localizations"),
            )
            .await
        }
        V2Command::Members {
            command: V2MembersCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_MEMBERS_V2_LIST,
                "--set",
                args.set.as_deref(),
                &args.page,
                |s| format!("v2/gameCenterLeaderboardSets/{s}/gameCenterLeaderboards"),
            )
            .await
        }
        V2Command::Versions {
            command: V2VersionsCommand::List(args),
        } => {
            anchored_list(
                session,
                CMD_SET_VERSIONS_V2_LIST,
                "--set",
                args.set.as_deref(),
                &args.page,
                |s| format!("v2/gameCenterLeaderboardSets/{s}/versions"),
            )
            .await
        }
    }
}
