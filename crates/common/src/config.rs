use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    /// Full connection string; wins over the individual parts when set.
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Build database URL from configuration
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            ),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "orders".to_string(),
            max_connections: 10,
            url: None,
        }
    }
}

/// Kafka consumer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// Comma-separated list of brokers
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "orders".to_string(),
            group_id: "order-service".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            shutdown_grace_secs: 5,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub server: ServerConfig,
    pub log_level: String,
    pub enable_jaeger: bool,
    pub jaeger_endpoint: Option<String>,
}

impl AppConfig {
    /// Read configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_defaults = DatabaseConfig::default();
        let kafka_defaults = KafkaConfig::default();
        let server_defaults = ServerConfig::default();

        Self {
            database: DatabaseConfig {
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    database_defaults.max_connections,
                ),
                url: lookup("DATABASE_URL"),
                ..database_defaults
            },
            kafka: KafkaConfig {
                brokers: lookup("KAFKA_BROKERS").unwrap_or(kafka_defaults.brokers),
                topic: lookup("KAFKA_TOPIC").unwrap_or(kafka_defaults.topic),
                group_id: lookup("CONSUMER_GROUP").unwrap_or(kafka_defaults.group_id),
            },
            server: ServerConfig {
                port: parse_or(&lookup, "PORT", server_defaults.port),
                shutdown_grace_secs: parse_or(
                    &lookup,
                    "SHUTDOWN_GRACE_SECS",
                    server_defaults.shutdown_grace_secs,
                ),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            enable_jaeger: parse_or(&lookup, "ENABLE_JAEGER", false),
            jaeger_endpoint: lookup("JAEGER_ENDPOINT"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
