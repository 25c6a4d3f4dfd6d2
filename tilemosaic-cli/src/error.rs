//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilemosaic::config::ConfigFileError;
use tilemosaic::fetch::FetchError;
use tilemosaic::mosaic::MosaicError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or parsed
    ConfigFile(ConfigFileError),
    /// Failed to create the HTTP client
    HttpClient(FetchError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Rendering failed
    Render(MosaicError),
    /// Failed to write output file
    FileWrite {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Render(MosaicError::NoZoomFound { .. }) => {
                eprintln!();
                eprintln!("The bounding box is too small for the minimum size.");
                eprintln!("Lower --min-width/--min-height or pass --zoom explicitly.");
            }
            CliError::Render(MosaicError::InvalidCrop(_)) => {
                eprintln!();
                eprintln!("Check that the south-west corner is south and west of the north-east corner.");
            }
            CliError::Render(MosaicError::TileFetch(_)) => {
                eprintln!();
                eprintln!("Drop --fail-on-tile-error to render with missing tiles left blank.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Render(e) => write!(f, "Failed to render mosaic: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Render(e)
    }
}
