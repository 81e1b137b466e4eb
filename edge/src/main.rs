mod config;
mod context;
mod gate;
mod proxy;
mod resolver;
mod response;
mod server;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use admingate_misc::config::ConfigArgs;
use admingate_misc::display;

use config::EdgeConfig;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct EdgeArgs {
    /// Print edge configuration data (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

async fn run(args: EdgeArgs) -> Result<()> {
    let cfg: EdgeConfig = args.config.load("edge")?;

    if args.print_config {
        return display::pretty_json(cfg);
    }

    cfg.logs.init("edge")?;

    let ctx = cfg.build_ctx()?;
    let server = cfg.build_server(ctx)?;

    server.run().await.context("run edge server")?;

    info!("Server exited by user");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = EdgeArgs::parse();
    match run(args).await {
        Ok(()) => {}
        Err(e) => {
            error!("Error: {e:#}");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
