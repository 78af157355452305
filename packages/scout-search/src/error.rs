pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Index store queried before any index data was set.")]
	NotInitialized,
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
}
