use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound on request bodies, uploads included.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub path: PathBuf,
    pub intra_threads: usize,
    /// Spatial dims fed to the network are padded up to a multiple of this.
    pub pad_multiple: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "restormer-deraining".to_string(),
            path: PathBuf::from("models/deraining.onnx"),
            intra_threads: 4,
            pad_multiple: 8,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("static/uploads"),
            output_dir: PathBuf::from("static/results"),
        }
    }
}

impl AppConfig {
    /// Reads a YAML config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.pad_multiple, 8);
        assert_eq!(config.storage.upload_dir, PathBuf::from("static/uploads"));
        assert_eq!(config.storage.output_dir, PathBuf::from("static/results"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.path, PathBuf::from("models/deraining.onnx"));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
server:
  host: 0.0.0.0
  port: 3000
  max_upload_bytes: 1024
model:
  name: custom
  path: weights/custom.onnx
  intra_threads: 2
  pad_multiple: 16
storage:
  upload_dir: public/in
  output_dir: public/out
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 1024);
        assert_eq!(config.model.name, "custom");
        assert_eq!(config.model.intra_threads, 2);
        assert_eq!(config.model.pad_multiple, 16);
        assert_eq!(config.storage.output_dir, PathBuf::from("public/out"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("definitely/not/here.yaml").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(AppConfig::from_yaml("server: [").is_err());
    }
}
