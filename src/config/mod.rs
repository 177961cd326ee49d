use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub aggregation: AggregationConfig,
    pub chat: ChatConfig,
}

/// Retrieval backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub profile: BackendProfile,
}

/// Which backend contract the client speaks.
///
/// `Chat` uses `/connect`, `/upload` and `/chat`; `Code` uses `/neo4j`,
/// `/parser` + `/store` and `/query`. Graph, context, path and disconnect
/// endpoints are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendProfile {
    #[default]
    Chat,
    Code,
}

impl BackendProfile {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendProfile::Chat => "chat",
            BackendProfile::Code => "code",
        }
    }
}

impl std::fmt::Display for BackendProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(BackendProfile::Chat),
            "code" | "code-rag" => Ok(BackendProfile::Code),
            _ => Err(format!("Unknown backend profile: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Fan-out bounds for the result aggregation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    /// `limit` passed to the graph overview endpoint.
    pub graph_limit: u32,
    /// Maximum number of entities looked up for context.
    pub context_entity_cap: usize,
    /// Maximum number of entities sent to path finding.
    pub path_entity_cap: usize,
    /// Hop bound for path finding.
    pub max_hops: u32,
    /// Deadline for each aggregation call.
    pub section_timeout_ms: u64,
}

/// Chat profile query options
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub expand_depth: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let profile = match env::var("EXPLORER_BACKEND_PROFILE") {
            Ok(value) => value
                .parse::<BackendProfile>()
                .map_err(|message| AppError::Config { message })?,
            Err(_) => BackendProfile::default(),
        };

        let backend = BackendConfig {
            base_url: env::var("EXPLORER_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            profile,
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env_or("REQUEST_TIMEOUT_MS", RequestConfig::default().timeout_ms),
        };

        let defaults = AggregationConfig::default();
        let aggregation = AggregationConfig {
            graph_limit: env_or("GRAPH_OVERVIEW_LIMIT", defaults.graph_limit),
            context_entity_cap: env_or("CONTEXT_ENTITY_CAP", defaults.context_entity_cap),
            path_entity_cap: env_or("PATH_ENTITY_CAP", defaults.path_entity_cap),
            max_hops: env_or("PATH_MAX_HOPS", defaults.max_hops),
            section_timeout_ms: env_or("SECTION_TIMEOUT_MS", defaults.section_timeout_ms),
        };

        let chat = ChatConfig {
            expand_depth: env_or("CHAT_EXPAND_DEPTH", ChatConfig::default().expand_depth),
        };

        let config = Config {
            backend,
            logging,
            request,
            aggregation,
            chat,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a section unable to ever load.
    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |message: &str| {
            Err(AppError::Config {
                message: message.to_string(),
            })
        };

        if self.request.timeout_ms == 0 {
            return invalid("REQUEST_TIMEOUT_MS must be greater than zero");
        }
        if self.aggregation.graph_limit == 0 {
            return invalid("GRAPH_OVERVIEW_LIMIT must be greater than zero");
        }
        if self.aggregation.context_entity_cap == 0 {
            return invalid("CONTEXT_ENTITY_CAP must be greater than zero");
        }
        if self.aggregation.path_entity_cap < 2 {
            return invalid("PATH_ENTITY_CAP must be at least 2");
        }
        if self.aggregation.max_hops == 0 {
            return invalid("PATH_MAX_HOPS must be greater than zero");
        }
        if self.aggregation.section_timeout_ms == 0 {
            return invalid("SECTION_TIMEOUT_MS must be greater than zero");
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            graph_limit: 100,
            context_entity_cap: 3,
            path_entity_cap: 5,
            max_hops: 3,
            section_timeout_ms: 30000,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { expand_depth: 2 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            backend: BackendConfig {
                base_url: "http://localhost:8000".to_string(),
                profile: BackendProfile::Chat,
            },
            logging: LoggingConfig::default(),
            request: RequestConfig::default(),
            aggregation: AggregationConfig::default(),
            chat: ChatConfig::default(),
        }
    }

    #[test]
    fn test_aggregation_defaults() {
        let defaults = AggregationConfig::default();
        assert_eq!(defaults.graph_limit, 100);
        assert_eq!(defaults.context_entity_cap, 3);
        assert_eq!(defaults.path_entity_cap, 5);
        assert_eq!(defaults.max_hops, 3);
        assert_eq!(defaults.section_timeout_ms, 30000);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("chat".parse::<BackendProfile>(), Ok(BackendProfile::Chat));
        assert_eq!("CODE".parse::<BackendProfile>(), Ok(BackendProfile::Code));
        assert_eq!("code-rag".parse::<BackendProfile>(), Ok(BackendProfile::Code));
        assert!("graphql".parse::<BackendProfile>().is_err());
    }

    #[test]
    fn test_profile_display_round_trip() {
        for profile in [BackendProfile::Chat, BackendProfile::Code] {
            assert_eq!(profile.to_string().parse::<BackendProfile>(), Ok(profile));
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_single_entity_path_cap() {
        let mut config = test_config();
        config.aggregation.path_entity_cap = 1;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: PATH_ENTITY_CAP must be at least 2"
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = test_config();
        config.aggregation.section_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(AppError::Config { .. })));
    }
}
