use crate::config::types::{ConcurrencyConfig, HarvestConfig, HttpConfig, LinkRuleConfig};
use crate::ConfigError;

/// Upper bound for either worker pool
pub const MAX_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &HarvestConfig) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_link_rule(&config.links)?;
    validate_concurrency(&config.concurrency)?;
    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    // Must survive as an HTTP header value
    if config
        .user_agent
        .chars()
        .any(|c| c.is_control() || !c.is_ascii())
    {
        return Err(ConfigError::Validation(format!(
            "user-agent must be printable ASCII, got '{}'",
            config.user_agent.escape_debug()
        )));
    }

    for (name, value) in [
        ("page-timeout-secs", config.page_timeout_secs),
        ("image-timeout-secs", config.image_timeout_secs),
        ("connect-timeout-secs", config.connect_timeout_secs),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates the sub-page link rule
fn validate_link_rule(config: &LinkRuleConfig) -> Result<(), ConfigError> {
    if config.suffixes.is_empty() && config.markers.is_empty() {
        return Err(ConfigError::Validation(
            "link rule needs at least one suffix or marker".to_string(),
        ));
    }

    // An empty pattern would accept every anchor
    if config.suffixes.iter().any(String::is_empty) {
        return Err(ConfigError::Validation(
            "link suffixes cannot contain empty strings".to_string(),
        ));
    }

    if config.markers.iter().any(String::is_empty) {
        return Err(ConfigError::Validation(
            "link markers cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool bounds
fn validate_concurrency(config: &ConcurrencyConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("max-concurrent-pages", config.max_concurrent_pages),
        ("max-concurrent-images", config.max_concurrent_images),
    ] {
        if !(1..=MAX_CONCURRENCY).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_CONCURRENCY, value
            )));
        }
    }

    Ok(())
}
