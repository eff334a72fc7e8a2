//! # PDF Conversion
//!
//! Rendered certificates are turned into PDFs by an ordered cascade of strategies.
//! Each one runs to completion (or timeout) before the next is tried, and its output
//! is only accepted when it exists and is at least `min_attempt_bytes` long.
//!
//! 1. `automation`: Word / PowerPoint through COM (Windows, configurable).
//! 2. `headless`: `soffice --headless --convert-to pdf`.
//! 3. `raster`: text boxes redrawn at their positions with genpdf.
//! 4. `textflow`: plain title + paragraphs with genpdf (configurable).

pub mod automation;
pub mod headless;
pub mod pdf;
pub mod process;
pub mod raster;
pub mod textflow;

use crate::config::ConversionConfig;
use crate::error::ConversionError;
use common::model::merge::ConversionOutcome;
use log::{debug, info, warn};
use std::path::Path;

/// One way of producing a PDF from a rendered document.
pub trait ConversionStrategy: Send {
    fn name(&self) -> &str;

    /// Cheap check run before every attempt. Unavailable strategies are skipped and
    /// not reported as attempted.
    fn is_available(&self) -> bool {
        true
    }

    /// Writes `output` from `input`. Size validation is done by the caller.
    fn attempt(&self, input: &Path, output: &Path) -> Result<(), ConversionError>;
}

pub struct Converter {
    strategies: Vec<Box<dyn ConversionStrategy>>,
    min_attempt_bytes: u64,
}

impl Converter {
    pub fn new(strategies: Vec<Box<dyn ConversionStrategy>>, min_attempt_bytes: u64) -> Self {
        Self {
            strategies,
            min_attempt_bytes,
        }
    }

    /// The full cascade as configured.
    pub fn from_config(cfg: &ConversionConfig) -> Self {
        let fonts = pdf::FontSource::new(cfg.fonts_dir.clone(), cfg.font_families.clone());
        let mut strategies: Vec<Box<dyn ConversionStrategy>> = Vec::new();
        if cfg.automation {
            strategies.push(Box::new(automation::OfficeAutomation::new(cfg.timeout())));
        }
        strategies.push(Box::new(headless::Headless::new(
            cfg.soffice_path.clone(),
            cfg.timeout(),
            cfg.version_check_timeout(),
        )));
        strategies.push(Box::new(raster::LayoutRaster::new(fonts.clone())));
        if cfg.text_flow_fallback {
            strategies.push(Box::new(textflow::TextFlow::new(fonts)));
        }
        Self::new(strategies, cfg.min_attempt_bytes)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Tries every available strategy in order until one produces an acceptable file.
    pub fn convert(&self, input: &Path, output: &Path) -> ConversionOutcome {
        let mut attempted = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            if !strategy.is_available() {
                debug!("Skipping unavailable strategy {}", name);
                continue;
            }
            attempted.push(name.to_string());
            info!("Converting {} with {}", input.display(), name);

            // Whatever sits at `output` now is from an earlier run or attempt.
            discard(output);
            let result = strategy
                .attempt(input, output)
                .and_then(|()| validate_output(output, self.min_attempt_bytes));
            match result {
                Ok(size) => {
                    info!("{} produced {} ({} bytes)", name, output.display(), size);
                    return ConversionOutcome::Success {
                        pdf: output.to_path_buf(),
                        strategy: name.to_string(),
                    };
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", name, input.display(), e);
                    discard(output);
                }
            }
        }

        ConversionOutcome::Failure { attempted }
    }
}

/// Size of `path`, or [`ConversionError::InvalidOutput`] when missing or smaller than `min`.
pub fn validate_output(path: &Path, min: u64) -> Result<u64, ConversionError> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size < min {
        return Err(ConversionError::InvalidOutput {
            path: path.to_path_buf(),
            size,
            min,
        });
    }
    Ok(size)
}

/// Removes a rejected output, if any.
pub fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}
