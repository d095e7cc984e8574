pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("The {stage} call timed out after {timeout_ms} ms.")]
	Timeout { stage: &'static str, timeout_ms: u64 },
	#[error("The turn exceeded {limit} reasoning iterations without a final answer.")]
	IterationLimit { limit: u32 },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Tool {name} is already registered.")]
	DuplicateTool { name: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<marquee_storage::Error> for Error {
	fn from(err: marquee_storage::Error) -> Self {
		match err {
			marquee_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			marquee_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			marquee_storage::Error::NotFound(message) => Self::NotFound { message },
			marquee_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}
