use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid version '{input}': {source}")]
pub struct VersionParseError {
    pub input: String,
    #[source]
    pub source: semver::Error,
}
