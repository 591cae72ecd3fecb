use crate::config::Settings;
use crate::utils::error::{CarmsError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `carms.toml`. Every section and key is optional; present keys override
/// the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesSection {
    pub raw_data_dir: Option<String>,
    pub discipline_file: Option<String>,
    pub program_file: Option<String>,
    pub descriptions_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSection {
    pub bind: Option<String>,
    pub api_url: Option<String>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| CarmsError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CarmsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CarmsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn apply(self, settings: &mut Settings) {
        let FileConfig {
            database,
            sources,
            api,
            dashboard,
        } = self;

        if let Some(url) = database.url {
            settings.database_url = url;
        }
        if let Some(max) = database.max_connections {
            settings.max_connections = max;
        }
        if let Some(dir) = sources.raw_data_dir {
            settings.raw_data_dir = dir;
        }
        if let Some(file) = sources.discipline_file {
            settings.discipline_file = file;
        }
        if let Some(file) = sources.program_file {
            settings.program_file = file;
        }
        if let Some(file) = sources.descriptions_file {
            settings.descriptions_file = file;
        }
        if let Some(bind) = api.bind {
            settings.api_bind = bind;
        }
        if let Some(bind) = dashboard.bind {
            settings.dashboard_bind = bind;
        }
        if let Some(api_url) = dashboard.api_url {
            settings.api_url = api_url;
        }
    }
}
