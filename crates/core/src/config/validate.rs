use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - max_parallel is not 0 when set
/// - every ancillary suffix starts with a dot
/// - at least one required tag is configured
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.transcode.max_parallel == Some(0) {
        return Err(ConfigError::ValidationError(
            "transcode.max_parallel cannot be 0".to_string(),
        ));
    }

    if let Some(bad) = config
        .transcode
        .ancillary_suffixes
        .iter()
        .find(|s| !s.starts_with('.') || s.len() < 2)
    {
        return Err(ConfigError::ValidationError(format!(
            "transcode.ancillary_suffixes entry {:?} must look like \".ext\"",
            bad
        )));
    }

    if config.transcode.required_tags.is_empty() {
        return Err(ConfigError::ValidationError(
            "transcode.required_tags cannot be empty".to_string(),
        ));
    }

    Ok(())
}
