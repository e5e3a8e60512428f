use std::path::PathBuf;
use thiserror::Error;

/// All errors produced outside the (infallible) normalization core.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sheet export could not be downloaded.
    #[error("Failed to fetch sheet: {0}")]
    Fetch(String),

    /// The sheet export answered with a non-success status.
    #[error("Sheet export returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The CSV blob is syntactically broken.
    #[error("Failed to parse CSV: {0}")]
    Csv(String),

    /// A persisted JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// No row of the table carries the entity-column sentinel.
    #[error("Header row not found: no cell equals \"{0}\"")]
    HeaderNotFound(String),

    /// The header row exists but lacks the category column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A metric definition string could not be parsed.
    #[error("Invalid metric definition: {0}")]
    InvalidMetric(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the board crates.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = DashboardError::FileRead {
            path: PathBuf::from("/some/volumes.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/volumes.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_http_status() {
        let err = DashboardError::HttpStatus {
            status: 404,
            url: "https://example.com/x.csv".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sheet export returned HTTP 404 for https://example.com/x.csv"
        );
    }

    #[test]
    fn test_error_display_fetch_and_csv() {
        let err = DashboardError::Fetch("connection refused".to_string());
        assert_eq!(err.to_string(), "Failed to fetch sheet: connection refused");
        let err = DashboardError::Csv("unequal lengths".to_string());
        assert_eq!(err.to_string(), "Failed to parse CSV: unequal lengths");
    }

    #[test]
    fn test_error_display_header_not_found() {
        let err = DashboardError::HeaderNotFound("화주사".to_string());
        assert_eq!(err.to_string(), "Header row not found: no cell equals \"화주사\"");
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = DashboardError::MissingColumn("구분".to_string());
        assert_eq!(err.to_string(), "Missing column: 구분");
    }

    #[test]
    fn test_error_display_invalid_metric() {
        let err = DashboardError::InvalidMetric("=".to_string());
        assert_eq!(err.to_string(), "Invalid metric definition: =");
    }

    #[test]
    fn test_error_display_config() {
        let err = DashboardError::Config("month out of range".to_string());
        assert_eq!(err.to_string(), "Configuration error: month out of range");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DashboardError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: DashboardError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
