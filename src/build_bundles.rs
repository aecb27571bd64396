use anyhow::Result;
use clap::{Args, Subcommand};

use crate::{
    asc::Session,
    pagination::{self, PageArgs},
};

const CMD_FILE_SIZES_LIST: &str = "build-bundles file-sizes list";
const CMD_INVOCATIONS_LIST: &str = "build-bundles app-clip invocations list";

#[derive(Debug, Subcommand)]
pub enum BuildBundlesCommand {
    /// File sizes reported for a build bundle
    FileSizes {
        #[command(subcommand)]
        command: FileSizesCommand,
    },
    /// App Clip resources attached to a build bundle
    AppClip {
        #[command(subcommand)]
        command: AppClipCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum FileSizesCommand {
    /// List file sizes of a build bundle
    List(BundleListArgs),
}

#[derive(Debug, Subcommand)]
pub enum AppClipCommand {
    /// Beta App Clip invocations
    Invocations {
        #[command(subcommand)]
        command: InvocationsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum InvocationsCommand {
    /// List beta App Clip invocations of a build bundle
    List(BundleListArgs),
}

#[derive(Debug, Args)]
pub struct BundleListArgs {
    /// Build bundle ID
    #[arg(long)]
    pub id: String,

    #[command(flatten)]
    pub page: PageArgs,
}

pub async fn run(session: &Session, command: BuildBundlesCommand) -> Result<()> {
    match command {
        BuildBundlesCommand::FileSizes {
            command: FileSizesCommand::List(args),
        } => {
            pagination::run_list(
                session,
                CMD_FILE_SIZES_LIST,
                Some(format!("v1/buildBundles/{}/buildBundleFileSizes", args.id)),
                &args.page,
            )
            .await
        }
        BuildBundlesCommand::AppClip {
            command:
                AppClipCommand::Invocations {
                    command: InvocationsCommand::List(args),
                },
        } => {
            pagination::run_list(
                session,
                CMD_INVOCATIONS_LIST,
                Some(format!(
                    "v1/buildBundles/{}/betaAppClipInvocations",
                    args.id
                )),
                &args.page,
            )
            .await
        }
    }
}
