//! Router configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chat_storage::{RetentionPolicy, DEFAULT_MAX_PAIRS_PER_AGENT, DEFAULT_TTL};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Verbose logging switches.
///
/// Each switch promotes a payload that is otherwise only visible at
/// `trace` level to `info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogToggles {
    /// Agent input and output text (`LOG_AGENT_CHAT`).
    pub agent_chat: bool,
    /// Rendered classifier prompt (`LOG_CLASSIFIER_CHAT`).
    pub classifier_chat: bool,
    /// Raw classifier model output (`LOG_CLASSIFIER_RAW_OUTPUT`).
    pub classifier_raw_output: bool,
    /// Parsed classification (`LOG_CLASSIFIER_OUTPUT`).
    pub classifier_output: bool,
    /// Per-stage durations (`LOG_EXECUTION_TIMES`).
    pub execution_times: bool,
}

impl LogToggles {
    /// Everything on.
    pub fn all() -> Self {
        Self {
            agent_chat: true,
            classifier_chat: true,
            classifier_raw_output: true,
            classifier_output: true,
            execution_times: true,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            agent_chat: parse_flag("LOG_AGENT_CHAT")?.unwrap_or(false),
            classifier_chat: parse_flag("LOG_CLASSIFIER_CHAT")?.unwrap_or(false),
            classifier_raw_output: parse_flag("LOG_CLASSIFIER_RAW_OUTPUT")?.unwrap_or(false),
            classifier_output: parse_flag("LOG_CLASSIFIER_OUTPUT")?.unwrap_or(false),
            execution_times: parse_flag("LOG_EXECUTION_TIMES")?.unwrap_or(false),
        })
    }
}

/// Configuration for the [`crate::Orchestrator`].
///
/// Built once at startup and immutable afterwards. Use [`OrchestratorConfig::from_env`]
/// or the builder; both validate.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Total attempts for classification and for agent invocation.
    pub max_retries: u32,

    /// Route to the default agent when the classifier picks nothing usable.
    pub use_default_agent_if_none_identified: bool,

    /// Pairs kept per agent per session.
    pub max_message_pairs_per_agent: usize,

    /// Session lifetime after the last append.
    pub ttl: Duration,

    /// Most recent session pairs shown to the classifier.
    pub classifier_history_pairs: usize,

    /// Character budget for the history shown to the classifier.
    pub classifier_history_chars: usize,

    /// Per-attempt deadline for agent calls. `None` waits indefinitely.
    pub agent_timeout: Option<Duration>,

    /// Backoff before the first retry.
    pub retry_base_delay: Duration,

    /// Upper bound for any single backoff.
    pub retry_max_delay: Duration,

    /// Verbose logging switches.
    pub logging: LogToggles,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            use_default_agent_if_none_identified: true,
            max_message_pairs_per_agent: DEFAULT_MAX_PAIRS_PER_AGENT,
            ttl: DEFAULT_TTL,
            classifier_history_pairs: DEFAULT_MAX_PAIRS_PER_AGENT,
            classifier_history_chars: 4000,
            agent_timeout: None,
            retry_base_delay: Duration::from_millis(200),
            retry_max_delay: Duration::from_secs(5),
            logging: LogToggles::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `MAX_RETRIES` - Total attempts per collaborator call (default: 3)
    /// - `USE_DEFAULT_AGENT_IF_NONE_IDENTIFIED` - Fallback to first agent (default: true)
    /// - `MAX_MESSAGE_PAIRS_PER_AGENT` - History cap per agent (default: 10)
    /// - `CONVERSATION_TTL_SECS` - Session lifetime (default: 3600)
    /// - `CLASSIFIER_HISTORY_PAIRS` - Pairs shown to the classifier (default: 10)
    /// - `CLASSIFIER_HISTORY_CHARS` - Classifier history budget (default: 4000)
    /// - `AGENT_TIMEOUT_MS` - Per-attempt agent deadline, 0 disables (default: unset)
    /// - `RETRY_BASE_DELAY_MS` - First backoff (default: 200)
    /// - `RETRY_MAX_DELAY_MS` - Backoff ceiling (default: 5000)
    /// - `LOG_AGENT_CHAT`, `LOG_CLASSIFIER_CHAT`, `LOG_CLASSIFIER_RAW_OUTPUT`,
    ///   `LOG_CLASSIFIER_OUTPUT`, `LOG_EXECUTION_TIMES` - Logging switches (default: false)
    ///
    /// Unparseable values are errors, not silently replaced by defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            max_retries: parse_var("MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            use_default_agent_if_none_identified: parse_flag(
                "USE_DEFAULT_AGENT_IF_NONE_IDENTIFIED",
            )?
            .unwrap_or(defaults.use_default_agent_if_none_identified),
            max_message_pairs_per_agent: parse_var("MAX_MESSAGE_PAIRS_PER_AGENT")?
                .unwrap_or(defaults.max_message_pairs_per_agent),
            ttl: parse_var("CONVERSATION_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            classifier_history_pairs: parse_var("CLASSIFIER_HISTORY_PAIRS")?
                .unwrap_or(defaults.classifier_history_pairs),
            classifier_history_chars: parse_var("CLASSIFIER_HISTORY_CHARS")?
                .unwrap_or(defaults.classifier_history_chars),
            agent_timeout: parse_var::<u64>("AGENT_TIMEOUT_MS")?
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            retry_base_delay: parse_var("RETRY_BASE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            retry_max_delay: parse_var("RETRY_MAX_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_max_delay),
            logging: LogToggles::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create a new config builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "MAX_RETRIES must allow at least one attempt".to_string(),
            ));
        }
        if self.max_message_pairs_per_agent == 0 {
            return Err(ConfigError::Invalid(
                "MAX_MESSAGE_PAIRS_PER_AGENT must be at least 1".to_string(),
            ));
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::Invalid("TTL must be positive".to_string()));
        }
        if self.retry_base_delay > self.retry_max_delay {
            return Err(ConfigError::Invalid(format!(
                "retry base delay {:?} exceeds max delay {:?}",
                self.retry_base_delay, self.retry_max_delay
            )));
        }
        Ok(())
    }

    /// Retention settings for the conversation store.
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_pairs_per_agent: self.max_message_pairs_per_agent,
            ttl: self.ttl,
        }
    }

    /// Retry settings shared by classification and invocation.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: self.retry_base_delay,
            max_delay: self.retry_max_delay,
            ..RetryPolicy::default()
        }
    }
}

/// Builder for OrchestratorConfig.
#[derive(Debug, Default)]
pub struct OrchestratorConfigBuilder {
    config: OrchestratorConfig,
}

impl OrchestratorConfigBuilder {
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.config.max_retries = attempts;
        self
    }

    pub fn use_default_agent_if_none_identified(mut self, enabled: bool) -> Self {
        self.config.use_default_agent_if_none_identified = enabled;
        self
    }

    pub fn max_message_pairs_per_agent(mut self, pairs: usize) -> Self {
        self.config.max_message_pairs_per_agent = pairs;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Set how much history the classifier sees.
    pub fn classifier_history(mut self, pairs: usize, chars: usize) -> Self {
        self.config.classifier_history_pairs = pairs;
        self.config.classifier_history_chars = chars;
        self
    }

    pub fn agent_timeout(mut self, timeout: Duration) -> Self {
        self.config.agent_timeout = Some(timeout);
        self
    }

    /// Set the backoff range. Zero delays make retries immediate.
    pub fn retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.config.retry_base_delay = base;
        self.config.retry_max_delay = max;
        self
    }

    pub fn logging(mut self, logging: LogToggles) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<OrchestratorConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        },
        Err(_) => Ok(None),
    }
}
