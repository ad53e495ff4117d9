pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The local snapshot is unreadable or carries an unknown schema version.
	/// Fatal: the index refuses to serve search or stats over partial data.
	#[error("Corrupt ticket index snapshot at {path:?}: {message}")]
	Corrupt { path: std::path::PathBuf, message: String },
	#[error("{message}")]
	Validation { message: String },
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
