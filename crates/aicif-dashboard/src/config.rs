use aicif_common::api::ApiClientConfig;
use aicif_common::error::env_parse;
use chrono::format::{Item, StrftimeItems};

use crate::error::AppError;

/// en-US style `toLocaleDateString() + ' ' + toLocaleTimeString()`.
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

/// Knobs the page bootstrap and loaders read.
#[derive(Debug, Clone)]
pub struct PageSettings {
    /// `limit` sent with the recent-citations request.
    pub recent_limit: u32,
    /// Fixed header height subtracted from smooth-scroll targets.
    pub header_offset: f64,
    /// chrono strftime pattern for `.format-date` elements.
    pub date_format: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            recent_limit: 10,
            header_offset: 70.0,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiClientConfig,
    pub page: PageSettings,
}

impl Config {
    /// Load configuration from environment variables. Everything is optional.
    ///
    /// - `AICIF_API_BASE_URL`, `AICIF_API_TIMEOUT_SECS`, `AICIF_MAX_ERROR_BODY_BYTES`:
    ///   see [`ApiClientConfig::from_env`]
    /// - `AICIF_RECENT_LIMIT`: recent citations to fetch (default: 10, must be > 0)
    /// - `AICIF_HEADER_OFFSET`: smooth-scroll header offset in px (default: 70)
    /// - `AICIF_DATE_FORMAT`: strftime pattern for dates (default: [`DEFAULT_DATE_FORMAT`])
    pub fn from_env() -> Result<Self, AppError> {
        let api = ApiClientConfig::from_env()?;
        let defaults = PageSettings::default();

        let recent_limit = env_parse::<u32>("AICIF_RECENT_LIMIT")?.unwrap_or(defaults.recent_limit);
        if recent_limit == 0 {
            return Err(AppError::Config(
                "AICIF_RECENT_LIMIT must be greater than zero".to_string(),
            ));
        }

        let header_offset =
            env_parse::<f64>("AICIF_HEADER_OFFSET")?.unwrap_or(defaults.header_offset);

        let date_format = std::env::var("AICIF_DATE_FORMAT").unwrap_or(defaults.date_format);
        validate_date_format(&date_format)?;

        Ok(Self {
            api,
            page: PageSettings {
                recent_limit,
                header_offset,
                date_format,
            },
        })
    }
}

/// Reject patterns chrono cannot format; formatting one would fail at render time.
pub fn validate_date_format(pattern: &str) -> Result<(), AppError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(AppError::Config(format!(
            "AICIF_DATE_FORMAT is not a valid strftime pattern: {pattern}"
        )));
    }
    Ok(())
}
