use clap::Parser;
use imgdrop::cli::Cli;
use log::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from .env become visible to clap and to the config overrides.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let env = env_logger::Env::default().default_filter_or(cli.log_level.as_str());
    env_logger::Builder::from_env(env).init();

    if let Err(err) = imgdrop::server::run(cli).await {
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}
