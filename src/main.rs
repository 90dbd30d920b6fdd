use anyhow::Result;

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    sok::cli::run().await
}
