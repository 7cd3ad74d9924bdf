use std::net::SocketAddr;

use clap::Parser;

#[derive(Debug, Parser)]
pub enum Args {
    /// Load the page data once and print it as JSON
    Load {
        /// Feed to include alongside the top podcasts
        #[clap(long, short)]
        rss: Option<String>,
    },
    /// Serve page data over HTTP at `GET /?rss=<url>`
    Serve {
        /// Address to listen on, defaults to the configured one
        #[clap(long, short)]
        addr: Option<SocketAddr>,
    },
    /// Write the default configuration file
    Setup {
        #[clap(long, short)]
        force: bool,
    },
    /// Interact with Configuration
    Config {
        /// The provided key will be reset to its default
        #[clap(long, short)]
        #[arg(conflicts_with("value"))]
        delete: bool,
        /// If a value is provided, the key to assign the value to
        /// if no value is provided print the configuration key's value
        #[arg(required_if_eq("delete", "true"))]
        key: Option<String>,
        /// The value to assign to the key
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), podloader::Error> {
    env_logger::init();
    let args = Args::parse();
    match args {
        Args::Load { rss } => println!("{}", podloader::run_load(rss).await?),
        Args::Serve { addr } => podloader::run_serve(addr).await?,
        Args::Setup { force } => podloader::run_setup(force).await?,
        Args::Config { delete, key, value } => podloader::run_config(delete, key, value).await?,
    }
    Ok(())
}
