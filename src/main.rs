use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    asc_cli::cli::run_cli().await
}
