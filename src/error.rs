use thiserror::Error;

use crate::parse::ParseError;
use crate::{ConfigError, ValidationError};

/// Unified error type covering parsing, configuration, validation, and I/O.
///
/// Returned by convenience loaders like
/// [`RuleSet::from_config_str()`](crate::RuleSet::from_config_str) and
/// [`RuleEngine::from_file()`](crate::RuleEngine::from_file).
#[derive(Debug, Error)]
pub enum ConventionalRpError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
