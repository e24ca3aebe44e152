/// Failure kinds surfaced by the catalog layer.
///
/// The kinds drive logging and the coarse HTTP mapping in `app::routes`;
/// clients only ever see "bad request", "not found", "conflict" or a generic
/// server error. `Clone` lets a coalesced cache refresh hand the same outcome
/// to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("metadata api unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    pub fn missing_env(name: &str) -> Self {
        Self::Config(format!("{name} is not configured"))
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
