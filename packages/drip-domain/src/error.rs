pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid JSON input at line {line}, column {column}.")]
	InvalidJson { line: usize, column: usize, source: serde_json::Error },
}
