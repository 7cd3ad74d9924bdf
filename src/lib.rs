use std::path::PathBuf;

use url::Url;

mod config;
mod error;
pub mod feed;
mod loader;
mod page;
pub mod server;

pub use config::{Config, TOP_PODCASTS_URL};
pub use error::{Error, FeedError};
pub use feed::{Feed, FeedEntry, FeedParser, HttpFeedParser};
pub use loader::PageDataLoader;
pub use page::{FeedItem, PageData, PageRequest, TopPodcasts, RSS_PARAM};

pub(crate) type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Run the loader once for an optional feed url and return the page data
/// as pretty printed JSON
pub async fn run_load(rss: Option<String>) -> Result<String> {
    let config = get_config_or_default().await?;
    let loader = PageDataLoader::from_config(&config)?;
    let mut url = Url::parse("http://localhost/")?;
    if let Some(rss) = rss {
        // the loader undoes this along with the query string's own decoding
        url.query_pairs_mut()
            .append_pair(RSS_PARAM, &urlencoding::encode(&rss));
    }
    let data = loader.load(&PageRequest::new(url)).await?;
    Ok(serde_json::to_string_pretty(&data)?)
}

pub async fn run_serve(addr: Option<std::net::SocketAddr>) -> Result {
    let config = get_config_or_default().await?;
    let loader = PageDataLoader::from_config(&config)?;
    log::debug!("top podcasts from {}", loader.top_podcasts_url());
    server::serve(addr.unwrap_or(config.addr), loader).await
}

pub async fn run_setup(force: bool) -> Result {
    let path = get_config_path(None);
    if path.exists() && !force {
        return Err(Error::PreviouslySetup);
    }
    save_config(&Config::default(), path).await
}

pub async fn run_config(delete: bool, key: Option<String>, value: Option<String>) -> Result {
    let mut config = get_config_or_default().await?;
    match (key, value) {
        (None, _) => println!("{config}"),
        (Some(key), _) if delete => {
            config.delete_key(&key)?;
            save_config(&config, None).await?;
        }
        (Some(key), None) => println!("{}", config.report_key(&key)?),
        (Some(key), Some(value)) => {
            config.update_key(&key, value)?;
            save_config(&config, None).await?;
        }
    }
    Ok(())
}

pub async fn get_config() -> Result<Config> {
    let path = get_config_path(None);
    let toml_str = tokio::fs::read_to_string(&path).await.inspect_err(|e| {
        log::warn!("failed to read config at path `{}`: {e}", path.display());
    })?;
    Ok(toml::from_str(&toml_str).inspect_err(|e| {
        log::warn!("Bad toml in config: {e} \n`{toml_str}`");
    })?)
}

/// Like [`get_config`] but a missing file means the defaults
pub async fn get_config_or_default() -> Result<Config> {
    if !get_config_path(None).exists() {
        log::debug!("no config file, using defaults");
        return Ok(Config::default());
    }
    get_config().await
}

pub async fn save_config(config: &Config, path: impl Into<Option<PathBuf>>) -> Result {
    let path = path.into().unwrap_or_else(|| get_config_path(None));
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let toml_str = toml::to_string_pretty(config)
        .inspect_err(|e| log::warn!("Error serializing toml: {e}\n{config:#?}"))?;
    tokio::fs::write(&path, toml_str).await.inspect_err(|e| {
        log::warn!("Error writing toml to `{}`: {e}", path.display());
    })?;
    Ok(())
}

pub fn get_config_path(base_path: impl Into<Option<PathBuf>>) -> PathBuf {
    base_path
        .into()
        .unwrap_or_else(get_project_dir)
        .join("config.toml")
}

pub fn get_project_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "podloader", "podloader")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".podloader"))
}
