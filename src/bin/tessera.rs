use anyhow::Result;
use tessera::cli::start;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Parse args, init telemetry, and get the action to run
    let action = start()?;

    action.execute().await
}
