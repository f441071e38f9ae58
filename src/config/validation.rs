use crate::config::types::{
    Config, CrawlerConfig, DiscoveryConfig, OutputConfig, PayerEntry, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Politeness floor between consecutive fetches
const MIN_POLITENESS_DELAY_MS: u64 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_discovery_config(&config.discovery)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_payers(&config.payers)?;
    Ok(())
}

/// Validates crawler budgets
pub(crate) fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max_urls must be >= 1, got {}",
            config.max_urls
        )));
    }

    if config.max_duration_secs < 1 {
        return Err(ConfigError::Validation(
            "max_duration_secs must be >= 1".to_string(),
        ));
    }

    if config.politeness_delay_ms < MIN_POLITENESS_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "politeness_delay_ms must be >= {}ms, got {}ms",
            MIN_POLITENESS_DELAY_MS, config.politeness_delay_ms
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_sessions < 1 || config.max_concurrent_sessions > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sessions must be between 1 and 16, got {}",
            config.max_concurrent_sessions
        )));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_seeds < 1 {
        return Err(ConfigError::Validation(format!(
            "max_seeds must be >= 1, got {}",
            config.max_seeds
        )));
    }

    if config.enabled && config.probe_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "probe_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the payer registry entries
pub(crate) fn validate_payers(payers: &[PayerEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for entry in payers {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "payer name cannot be empty".to_string(),
            ));
        }

        if !names.insert(entry.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "payer '{}' is listed more than once",
                entry.name
            )));
        }

        validate_domain_string(&entry.base_domain)?;

        for seed in entry.known_portal.iter().chain(entry.seeds.iter()) {
            validate_seed_url(seed)?;
        }
    }

    Ok(())
}

/// Seeds must be absolute HTTP(S) URLs with a host
pub(crate) fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// A base domain is a bare host name: `anthem.com`, never a URL or pattern
pub(crate) fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| {
        Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' {}",
            domain, reason
        )))
    };

    if domain.is_empty() {
        return invalid("is empty");
    }
    if !domain.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-') {
        return invalid("contains invalid characters");
    }
    if domain.split('.').any(|label| {
        label.is_empty() || label.starts_with('-') || label.ends_with('-')
    }) {
        return invalid("has an empty or hyphen-bounded label");
    }
    if !domain.contains('.') {
        return invalid("must have at least two labels (e.g. 'aetna.com')");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ConfigError> {
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        ))),
    }
}
