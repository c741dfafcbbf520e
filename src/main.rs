use anyhow::Result;

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    mediascout::cli::run().await
}
