/// Error types shared across the dashboard and proxy binaries.
///
/// These cover configuration problems common to every crate in the workspace.
/// Binary-specific errors are defined in each crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Read an optional environment variable and parse it.
///
/// Absent variables yield `Ok(None)`; present but unparseable values are an error.
pub fn env_parse<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, CommonError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CommonError::InvalidEnv { var, value: raw }),
        Err(_) => Ok(None),
    }
}
