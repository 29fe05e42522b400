use anyhow::Context;
use clap::Parser;
use estate_cli::{run, UploadArgs};
use estate_core::Config;
use estate_infra::{init_telemetry, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = UploadArgs::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let log_format: LogFormat = config.log_format.parse()?;
    init_telemetry(log_format)?;
    config.validate().context("Invalid configuration")?;

    let asset = run(&args, &config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&asset)?);
    } else {
        println!("{}", asset.url);
    }

    Ok(())
}
