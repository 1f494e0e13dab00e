use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::answer_synthesis::{DEFAULT_ANSWER_MAX_TOKENS, DEFAULT_MAX_CONCURRENT_ANSWERS};
use crate::generation::{PromptMode, DEFAULT_GENERATION_MAX_TOKENS};
use crate::graph_db::Neo4jSettings;
use crate::pipeline::BatchSettings;
use crate::sampling::{DEFAULT_MAX_LIST_LEN, DEFAULT_PATH_SAMPLE_CAP};

/// Rows pulled per Bolt round trip
const NEO4J_FETCH_SIZE: usize = 500;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Dataset generation settings with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// Bolt URI of the Neo4j server
    #[validate(length(min = 1, message = "Neo4j URI cannot be empty"))]
    pub neo4j_uri: String,

    /// Defaults to the database name when unset
    pub neo4j_user: Option<String>,

    /// Defaults to the database name when unset
    pub neo4j_password: Option<String>,

    /// Databases to generate questions for, in order
    #[validate(
        length(min = 1, message = "At least one database is required"),
        custom(function = "validate_database_names")
    )]
    pub databases: Vec<String>,

    /// Generate-and-verify rounds per database
    #[validate(range(min = 1, max = 1000, message = "Iterations must be between 1 and 1000"))]
    pub iterations: usize,

    #[validate(range(min = 1, message = "Generation token budget must be positive"))]
    pub generation_max_tokens: u32,

    #[validate(range(min = 1, message = "Answer token budget must be positive"))]
    pub answer_max_tokens: u32,

    /// Answer requests in flight at once
    #[validate(range(
        min = 1,
        max = 256,
        message = "Answer concurrency must be between 1 and 256"
    ))]
    pub max_concurrent_answers: usize,

    /// Per-query timeout in seconds
    #[validate(range(
        min = 1,
        max = 3600,
        message = "Query timeout must be between 1 and 3600 seconds"
    ))]
    pub query_timeout_secs: u64,

    /// Paths returned by one sampling query
    #[validate(range(min = 1, max = 500, message = "Path sample cap must be between 1 and 500"))]
    pub path_sample_cap: usize,

    /// Lists this long or longer are stripped from sampled paths
    #[validate(range(min = 1, message = "List length threshold must be positive"))]
    pub max_list_len: usize,

    pub prompt_mode: PromptMode,

    /// Whether validated records get a natural-language answer
    pub synthesize_answers: bool,

    /// Output file; a timestamped name is used when unset
    pub output: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            neo4j_uri: "neo4j+s://demo.neo4jlabs.com:7687".to_string(),
            neo4j_user: None,
            neo4j_password: None,
            databases: vec!["movies".to_string()],
            iterations: 1,
            generation_max_tokens: DEFAULT_GENERATION_MAX_TOKENS,
            answer_max_tokens: DEFAULT_ANSWER_MAX_TOKENS,
            max_concurrent_answers: DEFAULT_MAX_CONCURRENT_ANSWERS,
            query_timeout_secs: 90,
            path_sample_cap: DEFAULT_PATH_SAMPLE_CAP,
            max_list_len: DEFAULT_MAX_LIST_LEN,
            prompt_mode: PromptMode::MultiHop,
            synthesize_answers: true,
            output: None,
        }
    }
}

/// Partial settings from a YAML file or the command line; `None` keeps the
/// lower-precedence value.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
    pub databases: Option<Vec<String>>,
    pub iterations: Option<usize>,
    pub generation_max_tokens: Option<u32>,
    pub answer_max_tokens: Option<u32>,
    pub max_concurrent_answers: Option<usize>,
    pub query_timeout_secs: Option<u64>,
    pub path_sample_cap: Option<usize>,
    pub max_list_len: Option<usize>,
    pub prompt_mode: Option<PromptMode>,
    pub synthesize_answers: Option<bool>,
    pub output: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Read overrides from a YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })
    }
}

impl DatasetConfig {
    /// Layer environment, then the YAML file, then CLI overrides, and validate
    /// the result once.
    pub fn load(
        file: Option<ConfigOverrides>,
        cli: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        if let Some(file) = file {
            config = config.merge(file);
        }
        let config = config.merge(cli);

        config.validate()?;
        Ok(config)
    }

    /// Read environment variables over the defaults. Values are parsed but not
    /// range-checked; later layers may still override them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            neo4j_uri: env::var("NEO4J_URI").unwrap_or(defaults.neo4j_uri),
            neo4j_user: env::var("NEO4J_USERNAME")
                .or_else(|_| env::var("NEO4J_USER"))
                .ok(),
            neo4j_password: env::var("NEO4J_PASSWORD").ok(),
            databases: env::var("CYPHERSYNTH_DATABASES")
                .map(|list| split_list(&list))
                .unwrap_or(defaults.databases),
            iterations: parse_env_var("CYPHERSYNTH_ITERATIONS", defaults.iterations)?,
            generation_max_tokens: parse_env_var(
                "CYPHERSYNTH_GENERATION_MAX_TOKENS",
                defaults.generation_max_tokens,
            )?,
            answer_max_tokens: parse_env_var("CYPHERSYNTH_ANSWER_MAX_TOKENS", defaults.answer_max_tokens)?,
            max_concurrent_answers: parse_env_var(
                "CYPHERSYNTH_MAX_CONCURRENT_ANSWERS",
                defaults.max_concurrent_answers,
            )?,
            query_timeout_secs: parse_env_var("CYPHERSYNTH_QUERY_TIMEOUT_SECS", defaults.query_timeout_secs)?,
            path_sample_cap: parse_env_var("CYPHERSYNTH_PATH_SAMPLE_CAP", defaults.path_sample_cap)?,
            max_list_len: parse_env_var("CYPHERSYNTH_MAX_LIST_LEN", defaults.max_list_len)?,
            prompt_mode: parse_env_var("CYPHERSYNTH_PROMPT_MODE", defaults.prompt_mode)?,
            synthesize_answers: parse_env_var("CYPHERSYNTH_SYNTHESIZE_ANSWERS", defaults.synthesize_answers)?,
            output: env::var("CYPHERSYNTH_OUTPUT").ok().map(PathBuf::from),
        };

        Ok(config)
    }

    /// Apply overrides on top of this configuration
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        let ConfigOverrides {
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            databases,
            iterations,
            generation_max_tokens,
            answer_max_tokens,
            max_concurrent_answers,
            query_timeout_secs,
            path_sample_cap,
            max_list_len,
            prompt_mode,
            synthesize_answers,
            output,
        } = overrides;

        if let Some(v) = neo4j_uri {
            self.neo4j_uri = v;
        }
        if neo4j_user.is_some() {
            self.neo4j_user = neo4j_user;
        }
        if neo4j_password.is_some() {
            self.neo4j_password = neo4j_password;
        }
        if let Some(v) = databases {
            self.databases = v;
        }
        if let Some(v) = iterations {
            self.iterations = v;
        }
        if let Some(v) = generation_max_tokens {
            self.generation_max_tokens = v;
        }
        if let Some(v) = answer_max_tokens {
            self.answer_max_tokens = v;
        }
        if let Some(v) = max_concurrent_answers {
            self.max_concurrent_answers = v;
        }
        if let Some(v) = query_timeout_secs {
            self.query_timeout_secs = v;
        }
        if let Some(v) = path_sample_cap {
            self.path_sample_cap = v;
        }
        if let Some(v) = max_list_len {
            self.max_list_len = v;
        }
        if let Some(v) = prompt_mode {
            self.prompt_mode = v;
        }
        if let Some(v) = synthesize_answers {
            self.synthesize_answers = v;
        }
        if output.is_some() {
            self.output = output;
        }

        self
    }

    pub fn neo4j_settings(&self) -> Neo4jSettings {
        Neo4jSettings {
            uri: self.neo4j_uri.clone(),
            user: self.neo4j_user.clone(),
            password: self.neo4j_password.clone(),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            fetch_size: NEO4J_FETCH_SIZE,
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            iterations: self.iterations,
            generation_max_tokens: self.generation_max_tokens,
            prompt_mode: self.prompt_mode,
            path_sample_cap: self.path_sample_cap,
            max_list_len: self.max_list_len,
        }
    }
}

fn validate_database_names(databases: &[String]) -> Result<(), ValidationError> {
    if databases.iter().any(|name| name.trim().is_empty()) {
        let mut error = ValidationError::new("empty_database_name");
        error.message = Some("Database names cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|e| ConfigError::Parse {
            field: key.to_string(),
            value,
            source: Box::new(e),
        }),
        Err(_) => Ok(default),
    }
}
