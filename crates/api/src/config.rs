//! Server Configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `LESIONES__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use graph_store::GraphEndpoint;
use nl_query::{ModelConfig, QueryProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "LESIONES_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "lesiones.toml";
const ENV_PREFIX: &str = "LESIONES";

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Membership thresholds of the high-risk sprain rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Minimum degree of `dolor_actual.severo`
    pub severe_pain_threshold: f64,
    /// Minimum degree of `mejora_observada.baja`
    pub low_improvement_threshold: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            severe_pain_threshold: 0.7,
            low_improvement_threshold: 0.6,
        }
    }
}

impl RulesConfig {
    /// Fire earlier
    pub fn strict() -> Self {
        Self {
            severe_pain_threshold: 0.5,
            low_improvement_threshold: 0.5,
        }
    }

    /// Fire only on clear cases
    pub fn lenient() -> Self {
        Self {
            severe_pain_threshold: 0.85,
            low_improvement_threshold: 0.75,
        }
    }
}

/// Question answering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Phrase query rows as a natural-language answer
    pub synthesize_answers: bool,
    /// Minimum `mu` for the fuzzy relation listing
    pub relation_threshold: f64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            synthesize_answers: true,
            relation_threshold: 0.6,
        }
    }
}

/// Replacement schema/examples for a built-in query profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverride {
    pub schema: Option<String>,
    pub examples: Option<String>,
    pub instructions: Option<Vec<String>>,
}

impl ProfileOverride {
    pub fn apply(&self, mut profile: QueryProfile) -> QueryProfile {
        if let Some(schema) = &self.schema {
            profile.schema = schema.clone();
        }
        if let Some(examples) = &self.examples {
            profile.examples = examples.clone();
        }
        if let Some(instructions) = &self.instructions {
            profile.instructions = instructions.clone();
        }
        profile
    }
}

/// Full server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub graph: GraphEndpoint,
    pub model: ModelConfig,
    pub rules: RulesConfig,
    pub qa: QaConfig,
    /// Keyed by profile name ("clinico", "monitoreo")
    pub profiles: HashMap<String, ProfileOverride>,
}

impl AppConfig {
    /// Load from `LESIONES_CONFIG` (or `lesiones.toml` when present) and the
    /// environment
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from(Some(Path::new(&path)), true),
            Err(_) => Self::load_from(Some(Path::new(DEFAULT_CONFIG_FILE)), false),
        }
    }

    pub fn load_from(path: Option<&Path>, required: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            if required || path.exists() {
                builder = builder.add_source(File::from(path).required(required));
            }
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in profile with any configured override applied
    pub fn profile(&self, name: &str) -> Option<QueryProfile> {
        let profile = QueryProfile::builtin(name)?;
        Some(match self.profiles.get(name) {
            Some(over) => over.apply(profile),
            None => profile,
        })
    }
}
