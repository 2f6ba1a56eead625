pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Store unavailable: {message}")]
	Unavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Credentials error: {message}")]
	Credentials { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}

impl From<scout_storage::Error> for Error {
	fn from(err: scout_storage::Error) -> Self {
		if err.is_unavailable() {
			return Self::Unavailable { message: err.to_string() };
		}

		match err {
			scout_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			scout_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<scout_providers::Error> for Error {
	fn from(err: scout_providers::Error) -> Self {
		match err {
			scout_providers::Error::Credentials { message } => Self::Credentials { message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}
