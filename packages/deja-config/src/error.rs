pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Anything wrong with the configuration is fatal before any indexing or
/// query work starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unable to read the configuration at {path:?}.")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("The configuration at {path:?} is not valid TOML.")]
	Parse { path: std::path::PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
