//! Configuration loading and well-known paths.
//!
//! Values come from, in increasing precedence: the `Default` impls below, an optional
//! `certificados.{toml,json,yaml}` file in the working directory, and environment
//! variables prefixed with `CERTIFICADOS` using `__` as the section separator
//! (`CERTIFICADOS_CONVERSION__TIMEOUT_SECS=60`).

use crate::error::ConfigError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "certificados";
const ENV_PREFIX: &str = "CERTIFICADOS";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub template: TemplateConfig,
    pub conversion: ConversionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted spreadsheet upload.
    pub upload_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root. When unset, `<downloads>/<folder_name>` is used.
    pub root: Option<PathBuf>,
    pub folder_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: None,
            folder_name: "Certificados".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn output_root(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| downloads_dir().join(&self.folder_name))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TemplateConfig {
    /// File name looked up in every search location. Its extension selects the renderer.
    pub file_name: String,
    /// Explicit template path, tried before any search location.
    pub path: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            file_name: "plantilla.docx".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConversionConfig {
    /// Try Word/PowerPoint automation first. Only honored on Windows.
    pub automation: bool,
    /// Explicit `soffice` binary, tried before the well-known locations.
    pub soffice_path: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Budget for `soffice --version` while locating the binary.
    pub version_check_timeout_secs: u64,
    /// Smallest output a single strategy may produce and still count as a PDF.
    pub min_attempt_bytes: u64,
    /// Smallest PDF the row pipeline accepts before deleting the rendered document.
    pub min_final_bytes: u64,
    /// Append the plain text-flow strategy after layout rasterization.
    pub text_flow_fallback: bool,
    pub fonts_dir: PathBuf,
    /// Font families tried in order; each needs `<name>-{Regular,Bold,Italic,BoldItalic}.ttf`.
    pub font_families: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            automation: true,
            soffice_path: None,
            timeout_secs: 120,
            version_check_timeout_secs: 15,
            min_attempt_bytes: 1000,
            min_final_bytes: 5000,
            text_flow_fallback: true,
            fonts_dir: PathBuf::from("./fonts"),
            font_families: vec!["Arial".to_string(), "LiberationSans".to_string()],
        }
    }
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn version_check_timeout(&self) -> Duration {
        Duration::from_secs(self.version_check_timeout_secs)
    }
}

pub fn load() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}

/// The user's downloads folder, falling back to `~/Descargas`, the home directory and
/// finally the working directory.
pub fn downloads_dir() -> PathBuf {
    if let Some(dir) = dirs::download_dir().filter(|d| d.is_dir()) {
        return dir;
    }
    match dirs::home_dir() {
        Some(home) => ["Downloads", "Descargas"]
            .iter()
            .map(|name| home.join(name))
            .find(|candidate| candidate.is_dir())
            .unwrap_or(home),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
