use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A record names a category that is not registered in the taxonomy
    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),

    /// A breadcrumb trail that cannot be turned into a `BreadcrumbList`
    #[error("Invalid breadcrumb trail: {0}")]
    InvalidTrail(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A schema builder was handed nothing (or only blank text) to describe
    #[error("Empty content: {0}")]
    EmptyContent(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
