//! Validation pipe configuration.
//!
//! Reads the process-wide pipe defaults from the environment. Everything
//! not covered here (exception factories, expected types) is set in code
//! through [`PipeOptions`].

use axum::http::StatusCode;

use crate::pipe::PipeOptions;

/// Environment-derived pipe settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Status of the default validation error. Default 400.
    pub error_status: StatusCode,
    /// Validate arguments produced by custom extractors. Default false.
    pub validate_custom: bool,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            error_status: StatusCode::BAD_REQUEST,
            validate_custom: false,
        }
    }
}

impl PipeConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `STDSCHEMA_ERROR_STATUS` (default: 400)
    /// - `STDSCHEMA_VALIDATE_CUSTOM` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`PipeConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("STDSCHEMA_ERROR_STATUS") {
            let status = raw
                .trim()
                .parse::<u16>()
                .ok()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|status| status.is_client_error() || status.is_server_error())
                .ok_or_else(|| ConfigError::InvalidStatus(raw.clone()))?;
            config.error_status = status;
        }

        if let Some(raw) = lookup("STDSCHEMA_VALIDATE_CUSTOM") {
            config.validate_custom = parse_flag("STDSCHEMA_VALIDATE_CUSTOM", &raw)?;
        }

        Ok(config)
    }

    pub fn pipe_options(&self) -> PipeOptions {
        PipeOptions::default()
            .error_status(self.error_status)
            .validate_custom_decorators(self.validate_custom)
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(var.to_string(), raw.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("STDSCHEMA_ERROR_STATUS must be a 4xx or 5xx status code, got '{0}'")]
    InvalidStatus(String),
    #[error("{0} must be true or false, got '{1}'")]
    InvalidFlag(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = PipeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, PipeConfig::default());
        let opts = cfg.pipe_options();
        assert_eq!(opts.error_http_status_code, StatusCode::BAD_REQUEST);
        assert!(!opts.validate_custom_decorators);
    }

    #[test]
    fn reads_status_and_flag() {
        let cfg = PipeConfig::from_lookup(lookup(&[
            ("STDSCHEMA_ERROR_STATUS", "422"),
            ("STDSCHEMA_VALIDATE_CUSTOM", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(cfg.error_status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(cfg.validate_custom);
        assert!(cfg.pipe_options().validate_custom_decorators);
    }

    #[test]
    fn rejects_non_error_status() {
        for raw in ["200", "abc", "99"] {
            let err = PipeConfig::from_lookup(lookup(&[("STDSCHEMA_ERROR_STATUS", raw)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidStatus(_)), "{raw}");
        }
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = PipeConfig::from_lookup(lookup(&[("STDSCHEMA_VALIDATE_CUSTOM", "maybe")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "STDSCHEMA_VALIDATE_CUSTOM must be true or false, got 'maybe'"
        );
    }
}
