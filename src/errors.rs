use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Cannot reach server at {url}: {detail}. Is the application running?")]
    ServerUnreachable { url: String, detail: String },

    #[error("Scenario setup failed: {detail}")]
    SetupFailed { detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParseError { path: PathBuf, detail: String },

    #[error("Failed to write {path}: {source}")]
    OutputWriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read results file {path}: {source}")]
    ResultsReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed CSV at line {line}: {detail}")]
    CsvParseError { line: usize, detail: String },
}
