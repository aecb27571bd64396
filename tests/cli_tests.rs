use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn prints_help() {
    let mut cmd = Command::cargo_bin("asc").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("App Store Connect CLI in Rust"));
}

#[test]
fn help_lists_resource_commands() {
    let mut cmd = Command::cargo_bin("asc").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("builds")
            .and(predicate::str::contains("game-center"))
            .and(predicate::str::contains("testflight"))
            .and(predicate::str::contains("build-bundles")),
    );
}

fn cmd_without_credentials() -> Command {
    let mut cmd = Command::cargo_bin("asc").unwrap();
    cmd.env_remove("ASC_ISSUER_ID")
        .env_remove("ASC_KEY_ID")
        .env_remove("ASC_PRIVATE_KEY")
        .env("ASC_CONFIG_PATH", "/nonexistent/asc-config.json");
    cmd
}

#[test]
fn next_validation_runs_before_credential_loading() {
    let mut cmd = cmd_without_credentials();
    cmd.args([
        "builds",
        "list",
        "--next",
        "http://api.appstoreconnect.apple.com/v1/builds?cursor=AQ",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains(
        "builds list: --next must be an App Store Connect URL",
    ));
}

#[test]
fn malformed_next_reports_parse_error_without_credentials() {
    let mut cmd = cmd_without_credentials();
    cmd.args([
        "build-bundles",
        "file-sizes",
        "list",
        "--id",
        "bundle-1",
        "--next",
        "not a url",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains(
        "build-bundles file-sizes list: --next must be a valid URL:",
    ));
}

#[test]
fn missing_anchor_reports_flag_error_without_credentials() {
    let mut cmd = cmd_without_credentials();
    cmd.args(["game-center", "leaderboard-sets", "members", "list"]);
    cmd.assert().failure().stderr(predicate::str::contains(
        "game-center leaderboard-sets members list: --set is required unless --next is provided",
    ));
}

#[test]
fn list_commands_document_pagination_flags() {
    let mut cmd = Command::cargo_bin("asc").unwrap();
    cmd.args(["build-bundles", "file-sizes", "list", "--help"]);
    cmd.assert().success().stdout(
        predicate::str::contains("--next").and(predicate::str::contains("--paginate")),
    );
}
