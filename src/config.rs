use serde::{Deserialize, Serialize};
use std::env;

use crate::utils::{DigestAlgorithm, QuerySyntax, Separators, DEFAULT_HASH_LENGTH, DEFAULT_TOKEN_PARAM};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub imagine: ImagineConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagineConfig {
    /// Secret mixed into every token.
    #[serde(skip_serializing)]
    pub salt: String,
    pub hash_length: usize,
    pub hash_algorithm: DigestAlgorithm,
    /// Query parameter carrying a previously issued token.
    pub token_param: String,
    pub separators: Separators,
    pub query_syntax: QuerySyntax,
    /// Operations implemented by the data-model layer.
    pub model_operations: Vec<String>,
    /// Operations implemented by the image engine.
    pub engine_operations: Vec<String>,
    pub max_operations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ImagineConfig {
    fn default() -> Self {
        Self {
            salt: String::new(),
            hash_length: DEFAULT_HASH_LENGTH,
            hash_algorithm: DigestAlgorithm::default(),
            token_param: DEFAULT_TOKEN_PARAM.to_string(),
            separators: Separators::default(),
            query_syntax: QuerySyntax::default(),
            model_operations: Vec::new(),
            engine_operations: Vec::new(),
            max_operations: Some(16),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5732,
                workers: num_cpus::get(),
            },
            imagine: ImagineConfig::default(),
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        // Server configuration
        if let Ok(host) = env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.server.port = port.parse()?;
        }
        if let Ok(workers) = env::var("WORKERS") {
            config.server.workers = workers.parse()?;
        }

        // Token configuration
        if let Ok(salt) = env::var("IMAGINE_SALT") {
            config.imagine.salt = salt;
        }
        if let Ok(hash_length) = env::var("IMAGINE_HASH_LENGTH") {
            config.imagine.hash_length = hash_length.parse()?;
        }
        if let Ok(algorithm) = env::var("IMAGINE_HASH_ALGORITHM") {
            config.imagine.hash_algorithm = algorithm.parse()?;
        }
        if let Ok(token_param) = env::var("IMAGINE_TOKEN_PARAM") {
            config.imagine.token_param = token_param;
        }
        if let Ok(max_operations) = env::var("IMAGINE_MAX_OPERATIONS") {
            config.imagine.max_operations = match max_operations.trim() {
                "" | "0" => None,
                value => Some(value.parse()?),
            };
        }

        // Separators
        if let Ok(separator) = env::var("IMAGINE_SEPARATOR_OPERATIONS") {
            config.imagine.separators.operations = separator;
        }
        if let Ok(separator) = env::var("IMAGINE_SEPARATOR_PARAMS") {
            config.imagine.separators.params = separator;
        }
        if let Ok(separator) = env::var("IMAGINE_SEPARATOR_PAIRS") {
            config.imagine.separators.pairs = separator;
        }
        if let Ok(separator) = env::var("IMAGINE_SEPARATOR_VALUE") {
            config.imagine.separators.value = separator;
        }
        if let Ok(separator) = env::var("IMAGINE_QUERY_PAIR_SEPARATOR") {
            config.imagine.query_syntax.pair_separator = separator;
        }
        if let Ok(separator) = env::var("IMAGINE_QUERY_VALUE_SEPARATOR") {
            config.imagine.query_syntax.value_separator = separator;
        }

        // Capability bindings
        if let Ok(operations) = env::var("IMAGINE_MODEL_OPERATIONS") {
            config.imagine.model_operations = split_list(&operations);
        }
        if let Ok(operations) = env::var("IMAGINE_ENGINE_OPERATIONS") {
            config.imagine.engine_operations = split_list(&operations);
        }

        // Security configuration
        if let Ok(allowed_origins) = env::var("ALLOWED_ORIGINS") {
            config.security.allowed_origins = split_list(&allowed_origins);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.imagine.salt.trim().is_empty() {
            anyhow::bail!("IMAGINE_SALT must be set");
        }
        if self.imagine.token_param.trim().is_empty() {
            anyhow::bail!("IMAGINE_TOKEN_PARAM must not be empty");
        }
        self.imagine.separators.validate()?;
        if self.imagine.hash_length == 0
            || self.imagine.hash_length > self.imagine.hash_algorithm.hex_len()
        {
            anyhow::bail!(
                "IMAGINE_HASH_LENGTH must be between 1 and {}",
                self.imagine.hash_algorithm.hex_len()
            );
        }
        Ok(())
    }
}
