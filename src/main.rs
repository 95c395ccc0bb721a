use anyhow::Result;
use stablepush::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
