use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_AGENT_PROMPT: &str = "you are a gary from the phone store";
pub const DEFAULT_FIRST_MESSAGE: &str = "hey there! how can I help you today?";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for placing outbound calls through the telephony REST API.
#[derive(Debug)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub phone_number: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub elevenlabs_api_key: SecretString,
    pub elevenlabs_agent_id: String,
    pub elevenlabs_api_base: String,
    pub public_url: Option<String>,
    pub default_prompt: String,
    pub default_first_message: String,
    pub agent_connect_timeout: Duration,
    pub twilio: Option<TwilioConfig>,
}

fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let elevenlabs_api_key = SecretString::from(required("ELEVENLABS_API_KEY")?);
        let elevenlabs_agent_id = required("ELEVENLABS_AGENT_ID")?;
        let elevenlabs_api_base = optional("ELEVENLABS_API_BASE")
            .unwrap_or_else(|| "https://api.elevenlabs.io".to_string());

        let public_url = optional("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string());

        let default_prompt =
            optional("DEFAULT_AGENT_PROMPT").unwrap_or_else(|| DEFAULT_AGENT_PROMPT.to_string());
        let default_first_message = optional("DEFAULT_FIRST_MESSAGE")
            .unwrap_or_else(|| DEFAULT_FIRST_MESSAGE.to_string());

        let timeout_str = optional("AGENT_CONNECT_TIMEOUT_SECS").unwrap_or_else(|| "10".into());
        let agent_connect_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(ConfigError::InvalidValue(
                    "AGENT_CONNECT_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ));
            }
        };

        let twilio = Self::twilio_from_env()?;

        Ok(Self {
            bind_address,
            log_level,
            elevenlabs_api_key,
            elevenlabs_agent_id,
            elevenlabs_api_base,
            public_url,
            default_prompt,
            default_first_message,
            agent_connect_timeout,
            twilio,
        })
    }

    /// The telephony credentials are all-or-none.
    fn twilio_from_env() -> Result<Option<TwilioConfig>, ConfigError> {
        const VARS: [&str; 3] = [
            "TWILIO_ACCOUNT_SID",
            "TWILIO_AUTH_TOKEN",
            "TWILIO_PHONE_NUMBER",
        ];
        let values = VARS.map(optional);
        if values.iter().all(Option::is_none) {
            return Ok(None);
        }
        if let Some(missing) = VARS.iter().zip(&values).find(|(_, v)| v.is_none()) {
            return Err(ConfigError::MissingVar(format!(
                "{} must be set when placing outbound calls",
                missing.0
            )));
        }
        let [account_sid, auth_token, phone_number] = values;
        Ok(Some(TwilioConfig {
            account_sid: account_sid.unwrap_or_default(),
            auth_token: SecretString::from(auth_token.unwrap_or_default()),
            phone_number: phone_number.unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const ALL_VARS: [&str; 12] = [
        "BIND_ADDRESS",
        "RUST_LOG",
        "ELEVENLABS_API_KEY",
        "ELEVENLABS_AGENT_ID",
        "ELEVENLABS_API_BASE",
        "PUBLIC_URL",
        "DEFAULT_AGENT_PROMPT",
        "DEFAULT_FIRST_MESSAGE",
        "AGENT_CONNECT_TIMEOUT_SECS",
        "TWILIO_ACCOUNT_SID",
        "TWILIO_AUTH_TOKEN",
        "TWILIO_PHONE_NUMBER",
    ];

    fn clear_env_vars() {
        unsafe {
            for var in ALL_VARS {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("ELEVENLABS_API_KEY", "test-xi-key");
            env::set_var("ELEVENLABS_AGENT_ID", "agent-123");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.elevenlabs_api_key.expose_secret(), "test-xi-key");
        assert_eq!(config.elevenlabs_agent_id, "agent-123");
        assert_eq!(config.elevenlabs_api_base, "https://api.elevenlabs.io");
        assert_eq!(config.public_url, None);
        assert_eq!(config.default_prompt, DEFAULT_AGENT_PROMPT);
        assert_eq!(config.default_first_message, DEFAULT_FIRST_MESSAGE);
        assert_eq!(config.agent_connect_timeout, Duration::from_secs(10));
        assert!(config.twilio.is_none());
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:9090");
            env::set_var("RUST_LOG", "debug");
            env::set_var("ELEVENLABS_API_BASE", "http://localhost:4010");
            env::set_var("PUBLIC_URL", "https://bridge.example.com/");
            env::set_var("DEFAULT_AGENT_PROMPT", "You call to remind people of things.");
            env::set_var("DEFAULT_FIRST_MESSAGE", "Hi, this is your reminder.");
            env::set_var("AGENT_CONNECT_TIMEOUT_SECS", "3");
            env::set_var("TWILIO_ACCOUNT_SID", "AC123");
            env::set_var("TWILIO_AUTH_TOKEN", "token");
            env::set_var("TWILIO_PHONE_NUMBER", "+15550001111");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9090");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.elevenlabs_api_base, "http://localhost:4010");
        assert_eq!(
            config.public_url.as_deref(),
            Some("https://bridge.example.com")
        );
        assert_eq!(config.default_prompt, "You call to remind people of things.");
        assert_eq!(config.default_first_message, "Hi, this is your reminder.");
        assert_eq!(config.agent_connect_timeout, Duration::from_secs(3));

        let twilio = config.twilio.expect("twilio config");
        assert_eq!(twilio.account_sid, "AC123");
        assert_eq!(twilio.auth_token.expose_secret(), "token");
        assert_eq!(twilio.phone_number, "+15550001111");
    }

    #[test]
    #[serial]
    fn test_config_secrets_are_redacted_in_debug() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().unwrap();
        assert!(!format!("{:?}", config).contains("test-xi-key"));
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key() {
        clear_env_vars();
        unsafe {
            env::set_var("ELEVENLABS_AGENT_ID", "agent-123");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "ELEVENLABS_API_KEY"),
            _ => panic!("Expected MissingVar for ELEVENLABS_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_blank_agent_id_is_missing() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("ELEVENLABS_AGENT_ID", "   ");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(var) => assert_eq!(var, "ELEVENLABS_AGENT_ID"),
            _ => panic!("Expected MissingVar for ELEVENLABS_AGENT_ID"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_connect_timeout() {
        for bad in ["0", "soon"] {
            clear_env_vars();
            set_minimal_env();
            unsafe {
                env::set_var("AGENT_CONNECT_TIMEOUT_SECS", bad);
            }

            let err = Config::from_env().unwrap_err();
            match err {
                ConfigError::InvalidValue(var, _) => {
                    assert_eq!(var, "AGENT_CONNECT_TIMEOUT_SECS")
                }
                _ => panic!("Expected InvalidValue for AGENT_CONNECT_TIMEOUT_SECS"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_partial_twilio_credentials() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("TWILIO_ACCOUNT_SID", "AC123");
            env::set_var("TWILIO_PHONE_NUMBER", "+15550001111");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("TWILIO_AUTH_TOKEN")),
            _ => panic!("Expected MissingVar for TWILIO_AUTH_TOKEN"),
        }
    }
}
