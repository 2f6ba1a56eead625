#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Store unavailable: {0}")]
	Unavailable(String),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl Error {
	/// Connection-level failures, as opposed to a statement that reached the server and failed.
	pub fn is_unavailable(&self) -> bool {
		match self {
			Self::Unavailable(_) => true,
			Self::Sqlx(err) => matches!(
				err,
				sqlx::Error::PoolTimedOut
					| sqlx::Error::PoolClosed
					| sqlx::Error::Io(_)
					| sqlx::Error::Tls(_)
					| sqlx::Error::WorkerCrashed
			),
			_ => false,
		}
	}
}

impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
