#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    TomlD(#[from] toml::de::Error),
    #[error(transparent)]
    TomlS(#[from] toml::ser::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Anything that went wrong between reading the `rss` query parameter
    /// and getting a parsed feed back
    #[error("Error parsing RSS feed: {0}")]
    FeedParse(#[source] FeedError),
    #[error("Unknown key: `{0}`")]
    UnknownKey(String),
    #[error("Invalid arguments, {0}")]
    InvalidArgument(String),
    #[error("Previously setup, use --force (-f) to overwrite existing config")]
    PreviouslySetup,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("URI malformed: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    /// A `%` not followed by two hex digits
    #[error("URI malformed")]
    Malformed,
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Rss(#[from] rss::Error),
    #[error(transparent)]
    Atom(#[from] atom_syndication::Error),
    #[error("Feed not recognized as RSS 1 or 2.")]
    Unrecognized,
}
