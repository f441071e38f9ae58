use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates a registry from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Reads the registry at `path`
///
/// ```no_run
/// use payer_scout::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("payers.toml")).unwrap();
/// println!("{} payer(s)", config.payers.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// Reads the registry and fingerprints the exact bytes that were parsed
///
/// The SHA-256 digest is logged at startup so a result file can be traced
/// back to the registry that produced it.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, content_hash(&content)))
}

/// Hex-encoded SHA-256 of a registry file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(content_hash(&std::fs::read_to_string(path)?))
}

fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetcherKind, Priority};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ANTHEM: &str = r#"
[crawler]
max-depth = 3
max-urls = 40
max-duration-secs = 120
politeness-delay-ms = 1500
fetcher = "http"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
results-path = "./out.jsonl"
summary-path = "./summary.md"

[[payer]]
name = "Anthem"
base-domain = "anthem.com"
known-portal = "https://providers.anthem.com/"
priority = "high"
"#;

    #[test]
    fn test_parse_full_registry() {
        let config = parse_config(ANTHEM).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_urls, 40);
        assert_eq!(config.crawler.fetcher, FetcherKind::Http);
        // Unset keys fall back to defaults
        assert_eq!(config.crawler.page_timeout_secs, 30);
        assert!(config.discovery.enabled);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(
            config.payers[0].known_portal.as_deref(),
            Some("https://providers.anthem.com/")
        );
        assert_eq!(config.payers[0].priority, Priority::High);
    }

    #[test]
    fn test_parse_minimal_registry() {
        let config = parse_config("[[payer]]\nname = \"Aetna\"\nbase-domain = \"aetna.com\"\n")
            .unwrap();

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.fetcher, FetcherKind::Browser);
        assert_eq!(config.discovery.max_seeds, 5);
        assert_eq!(config.output.results_path, "./discovery.jsonl");
        assert!(config.payers[0].seeds.is_empty());
        assert_eq!(config.payers[0].priority, Priority::Medium);
    }

    #[test]
    fn test_parse_rejects_unknown_priority() {
        let result = parse_config(
            "[[payer]]\nname = \"Aetna\"\nbase-domain = \"aetna.com\"\npriority = \"urgent\"\n",
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(matches!(
            parse_config("this is not valid TOML {{{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_runs_validation() {
        let result = parse_config("[crawler]\npoliteness-delay-ms = 200\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/payers.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_hash_matches_file_hash() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(ANTHEM.as_bytes()).unwrap();
        file.flush().unwrap();

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.payers.len(), 1);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_ne!(hash, content_hash("[[payer]]"));
    }
}
