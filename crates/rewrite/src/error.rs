use dom::{BoxError, MutationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    /// The caller-supplied transform returned an error. Units rewritten
    /// earlier in the same cycle stay rewritten.
    #[error("transform failed: {source}")]
    Transform { source: BoxError },
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid watcher options: {0}")]
    Parse(#[from] toml::de::Error),
}
