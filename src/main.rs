use std::env;

use dotenvy::dotenv;
use env_logger::Env;

use spendwise::{backend, cli, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "server" {
        println!("Starting assist server...");
        backend::run_server(&config).await?;
    } else {
        cli::run(config).await?;
    }
    Ok(())
}
