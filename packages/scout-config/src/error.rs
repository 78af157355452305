pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Scout config at {path:?} could not be read.")]
	ReadConfig { path: std::path::PathBuf, source: std::io::Error },
	#[error("Scout config at {path:?} is not valid TOML.")]
	ParseConfig { path: std::path::PathBuf, source: toml::de::Error },
	#[error("Invalid scout config: {message}")]
	Validation { message: String },
}
