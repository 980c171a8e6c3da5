use crate::config::types::{Config, FetcherConfig, OutputConfig, UserAgentConfig, ValidatorConfig};
use crate::ConfigError;

const MAX_TIMEOUT_SECS: u64 = 120;
const MAX_PAGE_REDIRECTS: usize = 20;
const MAX_PROBE_REDIRECTS: usize = 10;
const MAX_CONCURRENT_PROBES: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_validator_config(&config.validator)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates page fetch configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    validate_timeout("fetcher timeout-secs", config.timeout_secs)?;

    if config.max_redirects > MAX_PAGE_REDIRECTS {
        return Err(ConfigError::Validation(format!(
            "fetcher max-redirects must be <= {}, got {}",
            MAX_PAGE_REDIRECTS, config.max_redirects
        )));
    }

    Ok(())
}

/// Validates link validation configuration
fn validate_validator_config(config: &ValidatorConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_probes < 1 || config.max_concurrent_probes > MAX_CONCURRENT_PROBES {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-probes must be between 1 and {}, got {}",
            MAX_CONCURRENT_PROBES, config.max_concurrent_probes
        )));
    }

    validate_timeout("probe-timeout-secs", config.probe_timeout_secs)?;

    if config.max_redirects > MAX_PROBE_REDIRECTS {
        return Err(ConfigError::Validation(format!(
            "validator max-redirects must be <= {}, got {}",
            MAX_PROBE_REDIRECTS, config.max_redirects
        )));
    }

    if config.deadline_secs < config.probe_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "deadline-secs ({}) must be >= probe-timeout-secs ({})",
            config.deadline_secs, config.probe_timeout_secs
        )));
    }

    Ok(())
}

fn validate_timeout(name: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
