use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MedwiseConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub locator: LocatorConfig,
    pub sms: SmsConfig,
    pub matcher: MatcherConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

/// Where the reference tables, vocabulary, and medicine catalog live.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub dir: String,
    pub description: String,
    pub precautions: String,
    pub medications: String,
    pub diets: String,
    pub workout: String,
    pub vocabulary: String,
    pub labels: String,
    pub medicines: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Artifact format: `"onnx"` or `"linear"`.
    pub format: String,
    pub path: String,
    /// Name of the ONNX input tensor (skl2onnx exports use `float_input`).
    pub input_name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LocatorConfig {
    pub nominatim_url: String,
    pub places_url: String,
    pub places_api_key: String,
    pub user_agent: String,
    pub radius_m: u32,
    /// Minimum fuzzy ratio (0-100) for a stockist to match a nearby pharmacy.
    pub match_cutoff: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SmsConfig {
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatcherConfig {
    pub enabled: bool,
    pub model: String,
    pub cache_dir: String,
    pub top_n: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            log_level: "info".into(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        let dir = default_medwise_dir()
            .join("data")
            .to_string_lossy()
            .into_owned();
        Self {
            dir,
            description: "description.csv".into(),
            precautions: "precautions_df.csv".into(),
            medications: "medications.csv".into(),
            diets: "diets.csv".into(),
            workout: "workout_df.csv".into(),
            vocabulary: "symptom_vocabulary.csv".into(),
            labels: "disease_labels.csv".into(),
            medicines: "medicine.csv".into(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let path = default_medwise_dir()
            .join("models")
            .join("svc.onnx")
            .to_string_lossy()
            .into_owned();
        Self {
            format: "onnx".into(),
            path,
            input_name: "float_input".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_medwise_dir()
            .join("medwise.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org/search".into(),
            places_url: "https://maps.googleapis.com/maps/api/place/nearbysearch/json".into(),
            places_api_key: String::new(),
            user_agent: "pharmacy_locator".into(),
            radius_m: 5000,
            match_cutoff: 80.0,
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com/2010-04-01".into(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_phone: String::new(),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let cache_dir = default_medwise_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            enabled: true,
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
            top_n: 5,
        }
    }
}

impl SmsConfig {
    /// Twilio needs all three credentials before any message can go out.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_phone.is_empty()
    }
}

/// Returns `~/.medwise/`
pub fn default_medwise_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".medwise")
}

/// Returns the default config file path: `~/.medwise/config.toml`
pub fn default_config_path() -> PathBuf {
    default_medwise_dir().join("config.toml")
}

impl MedwiseConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MedwiseConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEDWISE_DATA_DIR") {
            self.data.dir = val;
        }
        if let Ok(val) = std::env::var("MEDWISE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEDWISE_MODEL") {
            self.model.path = val;
        }
        if let Ok(val) = std::env::var("MEDWISE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid PORT"),
            }
        }
        if let Ok(val) = std::env::var("GOOGLE_PLACES_API_KEY") {
            self.locator.places_api_key = val;
        }
        if let Ok(val) = std::env::var("TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = val;
        }
        if let Ok(val) = std::env::var("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = val;
        }
        if let Ok(val) = std::env::var("TWILIO_PHONE") {
            self.sms.from_phone = val;
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.data.dir)
    }

    pub fn resolved_model_path(&self) -> PathBuf {
        expand_tilde(&self.model.path)
    }

    /// Path of a file inside the data directory.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.resolved_data_dir().join(name)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MedwiseConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.model.format, "onnx");
        assert_eq!(config.model.input_name, "float_input");
        assert_eq!(config.data.precautions, "precautions_df.csv");
        assert_eq!(config.locator.radius_m, 5000);
        assert_eq!(config.matcher.top_n, 5);
        assert!(config.storage.db_path.ends_with("medwise.db"));
        assert!(!config.sms.is_configured());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 8080

[data]
dir = "/srv/medwise/data"
workout = "workouts.csv"

[model]
format = "linear"
path = "/srv/medwise/svc.json"

[sms]
account_sid = "AC123"
auth_token = "secret"
from_phone = "+18507895491"
"#;
        let config: MedwiseConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data.dir, "/srv/medwise/data");
        assert_eq!(config.data.workout, "workouts.csv");
        assert_eq!(config.model.format, "linear");
        assert!(config.sms.is_configured());
        // defaults still apply for unset fields
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.data.description, "description.csv");
        assert_eq!(config.locator.match_cutoff, 80.0);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MedwiseConfig::default();
        std::env::set_var("MEDWISE_DATA_DIR", "/tmp/medwise-data");
        std::env::set_var("MEDWISE_DB", "/tmp/override.db");
        std::env::set_var("MEDWISE_LOG_LEVEL", "trace");
        std::env::set_var("PORT", "9090");

        config.apply_env_overrides();

        assert_eq!(config.data.dir, "/tmp/medwise-data");
        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.data_file("diets.csv"),
            PathBuf::from("/tmp/medwise-data/diets.csv")
        );

        // Clean up
        std::env::remove_var("MEDWISE_DATA_DIR");
        std::env::remove_var("MEDWISE_DB");
        std::env::remove_var("MEDWISE_LOG_LEVEL");
        std::env::remove_var("PORT");
    }
}
