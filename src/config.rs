use core::fmt;
use std::{fmt::Write, net::SocketAddr};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const TOP_PODCASTS_URL: &str =
    "https://rss.applemarketingtools.com/api/v2/us/podcasts/top/10/podcasts.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the top podcasts listing comes from
    pub top_podcasts_url: Url,
    /// Address `podloader serve` listens on
    pub addr: SocketAddr,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_podcasts_url: default_top_podcasts_url(),
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            user_agent: format!("podloader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub fn default_top_podcasts_url() -> Url {
    Url::parse(TOP_PODCASTS_URL).expect("TOP_PODCASTS_URL is a valid url")
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config")?;
        for key in Self::KEYS {
            write!(f, "    {key}: ")?;
            self.report_value(key, f)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Config {
    pub const KEYS: [&'static str; 3] = ["top_podcasts_url", "addr", "user_agent"];

    pub fn report_key(&self, key: &str) -> Result<String> {
        let mut s = String::new();
        self.report_value(key, &mut s)
            .map_err(|_| Error::UnknownKey(key.to_string()))?;
        Ok(s)
    }

    fn report_value(&self, key: &str, f: &mut impl Write) -> fmt::Result {
        match key {
            "top_podcasts_url" => write!(f, "{}", self.top_podcasts_url),
            "addr" => write!(f, "{}", self.addr),
            "user_agent" => write!(f, "{}", self.user_agent),
            _ => Err(fmt::Error),
        }
    }

    /// Reset `key` to its default value
    pub fn delete_key(&mut self, key: &str) -> Result {
        let defaults = Self::default();
        match key {
            "top_podcasts_url" => self.top_podcasts_url = defaults.top_podcasts_url,
            "addr" => self.addr = defaults.addr,
            "user_agent" => self.user_agent = defaults.user_agent,
            _ => return Err(Error::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn update_key(&mut self, key: &str, value: String) -> Result {
        match key {
            "top_podcasts_url" => self.top_podcasts_url = Url::parse(&value)?,
            "addr" => {
                self.addr = value.parse().map_err(|e| {
                    Error::InvalidArgument(format!("`{value}` is not a socket address: {e}"))
                })?
            }
            "user_agent" => self.user_agent = value,
            _ => return Err(Error::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
