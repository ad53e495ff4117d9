pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Provider-call failures. Transport and header construction carry their
/// source error; endpoint contract violations carry a message describing what
/// the reply was missing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error(transparent)]
	HeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
