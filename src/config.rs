use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Notification dispatch configuration
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    /// Mirrors the host setting that turns notifications on for all group kinds
    pub enabled: bool,
    /// When set, events are POSTed here instead of only being logged
    pub webhook_url: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory store
    pub database: Option<DatabaseConfig>,
    pub log_level: String,
    pub http_port: u16,
    pub environment: String,
    pub notifications: NotificationConfig,
    /// Header the host's authentication layer uses to pass the acting user id
    pub user_header: String,
    /// Group kinds registered at startup, one configuration each
    pub group_kinds: Vec<String>,
}

/// Default when the variable is absent; a value that does not parse is an error
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| env::var(key).ok())?
            .ok_or_else(|| "DATABASE_URL environment variable is required".to_string())
    }

    /// Build from a variable lookup; `Ok(None)` when no database URL is set
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, String> {
        let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let acquire_timeout_secs = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64)?;
        let idle_timeout_secs = parse_or(&lookup, "DATABASE_IDLE_TIMEOUT_SECS", 600u64)?; // 10 minutes
        let max_lifetime_secs = parse_or(&lookup, "DATABASE_MAX_LIFETIME_SECS", 1800u64)?; // 30 minutes
        let test_before_acquire = parse_or(&lookup, "DATABASE_TEST_BEFORE_ACQUIRE", true)?;

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Some(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        }))
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/usergroups".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Create application config from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database = DatabaseConfig::from_vars(&lookup)?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let http_port = match lookup("HTTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("Invalid HTTP_PORT: {}", raw))?,
            None => 8000,
        };

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let notifications = NotificationConfig {
            enabled: parse_or(&lookup, "USERGROUPS_SEND_NOTIFICATIONS", false)?,
            webhook_url: lookup("USERGROUPS_WEBHOOK_URL").filter(|u| !u.trim().is_empty()),
        };

        let user_header = lookup("USERGROUPS_USER_HEADER")
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "x-user-id".to_string());

        let group_kinds: Vec<String> = lookup("USERGROUPS_KINDS")
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["groups".to_string()]);

        if group_kinds.is_empty() {
            return Err("USERGROUPS_KINDS must name at least one group kind".to_string());
        }
        if let Some(bad) = group_kinds
            .iter()
            .find(|k| !k.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(format!("Invalid group kind slug: {}", bad));
        }

        Ok(Self {
            database,
            log_level: log_level.to_lowercase(),
            http_port,
            environment: environment.to_lowercase(),
            notifications,
            user_header,
            group_kinds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: None,
            log_level: "info".to_string(),
            http_port: 8000,
            environment: "development".to_string(),
            notifications: NotificationConfig::default(),
            user_header: "x-user-id".to_string(),
            group_kinds: vec!["groups".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 8000);
        assert!(config.is_development());
        assert!(!config.is_production());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_no_database_url_means_memory_store() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert!(config.database.is_none());
        assert_eq!(config.group_kinds, vec!["groups".to_string()]);
        assert_eq!(config.user_header, "x-user-id");
    }

    #[test]
    fn test_database_settings_parsed() {
        let config = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://db/usergroups"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.idle_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let result = DatabaseConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://db/usergroups"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unparsable_connection_count_rejected() {
        let result = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://db/usergroups"),
            ("DATABASE_MAX_CONNECTIONS", "ten"),
        ]));
        assert_eq!(result.unwrap_err(), "Invalid DATABASE_MAX_CONNECTIONS: ten");
    }

    #[test]
    fn test_unparsable_notification_switch_rejected() {
        let result = AppConfig::from_vars(vars(&[("USERGROUPS_SEND_NOTIFICATIONS", "yes")]));
        assert_eq!(result.unwrap_err(), "Invalid USERGROUPS_SEND_NOTIFICATIONS: yes");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(AppConfig::from_vars(vars(&[("LOG_LEVEL", "loud")])).is_err());
    }

    #[test]
    fn test_group_kinds_and_notifications() {
        let config = AppConfig::from_vars(vars(&[
            ("USERGROUPS_KINDS", "groups, teams"),
            ("USERGROUPS_SEND_NOTIFICATIONS", "true"),
            ("USERGROUPS_WEBHOOK_URL", "http://hooks.local/usergroups"),
        ]))
        .unwrap();
        assert_eq!(config.group_kinds, vec!["groups".to_string(), "teams".to_string()]);
        assert!(config.notifications.enabled);
        assert!(config.notifications.webhook_url.is_some());
    }

    #[test]
    fn test_bad_group_kind_rejected() {
        assert!(AppConfig::from_vars(vars(&[("USERGROUPS_KINDS", "a/b")])).is_err());
    }
}
