//! LibreOffice in headless mode.

use super::process::run_with_timeout;
use super::ConversionStrategy;
use crate::error::ConversionError;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Result of probing the well-known locations, shared by every batch.
static DISCOVERED: OnceCell<Option<PathBuf>> = OnceCell::new();

#[cfg(windows)]
const WELL_KNOWN: &[&str] = &[
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
];

#[cfg(target_os = "macos")]
const WELL_KNOWN: &[&str] = &["/Applications/LibreOffice.app/Contents/MacOS/soffice"];

#[cfg(not(any(windows, target_os = "macos")))]
const WELL_KNOWN: &[&str] = &[
    "/usr/bin/soffice",
    "/usr/bin/libreoffice",
    "/usr/local/bin/soffice",
    "/opt/libreoffice/program/soffice",
    "/snap/bin/libreoffice",
];

const BARE_NAMES: &[&str] = &["soffice", "libreoffice"];

pub struct Headless {
    override_path: Option<PathBuf>,
    timeout: Duration,
    version_check_timeout: Duration,
    binary: OnceCell<Option<PathBuf>>,
}

impl Headless {
    pub fn new(override_path: Option<PathBuf>, timeout: Duration, version_check_timeout: Duration) -> Self {
        Self {
            override_path,
            timeout,
            version_check_timeout,
            binary: OnceCell::new(),
        }
    }

    /// The configured binary if it answers, else the first well-known or bare name that does.
    fn binary(&self) -> Option<&Path> {
        self.binary
            .get_or_init(|| {
                if let Some(path) = &self.override_path {
                    if answers_version(path, self.version_check_timeout) {
                        return Some(path.clone());
                    }
                    warn!("Configured soffice '{}' does not respond", path.display());
                }
                DISCOVERED
                    .get_or_init(|| discover(self.version_check_timeout))
                    .clone()
            })
            .as_deref()
    }
}

fn discover(version_check_timeout: Duration) -> Option<PathBuf> {
    let found = WELL_KNOWN
        .iter()
        .chain(BARE_NAMES)
        .map(PathBuf::from)
        .find(|candidate| answers_version(candidate, version_check_timeout));
    match &found {
        Some(path) => info!("Using LibreOffice at {}", path.display()),
        None => info!("LibreOffice not found; headless conversion disabled"),
    }
    found
}

/// Runs `<candidate> --version`. Absolute paths that do not exist are skipped without
/// spawning anything.
fn answers_version(candidate: &Path, timeout: Duration) -> bool {
    if candidate.is_absolute() && !candidate.is_file() {
        return false;
    }
    let mut cmd = Command::new(candidate);
    cmd.arg("--version");
    match run_with_timeout(cmd, timeout) {
        Ok(finished) => finished.status.success(),
        Err(e) => {
            debug!("Version check of {} failed: {}", candidate.display(), e);
            false
        }
    }
}

/// `file://` URL for a local directory, as `-env:UserInstallation` expects.
pub fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

/// Where `soffice --convert-to pdf --outdir <dir>` writes its result.
pub fn produced_path(input: &Path, outdir: &Path) -> Option<PathBuf> {
    let mut name = input.file_stem()?.to_os_string();
    name.push(".pdf");
    Some(outdir.join(name))
}

impl ConversionStrategy for Headless {
    fn name(&self) -> &str {
        "libreoffice-headless"
    }

    fn is_available(&self) -> bool {
        self.binary().is_some()
    }

    fn attempt(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let binary = self
            .binary()
            .ok_or_else(|| ConversionError::Unavailable("soffice".to_string()))?;
        let outdir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Throwaway profile, removed when `profile` drops.
        let profile = tempfile::tempdir()?;
        let mut cmd = Command::new(binary);
        cmd.arg(format!("-env:UserInstallation={}", file_url(profile.path())))
            .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
            .arg(outdir)
            .arg(input);

        let program = binary.display().to_string();
        run_with_timeout(cmd, self.timeout)?.success_or(&program)?;

        if let Some(produced) = produced_path(input, outdir) {
            if produced != output && produced.is_file() {
                debug!("Renaming {} to {}", produced.display(), output.display());
                std::fs::rename(&produced, output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_urls_are_absolute_file_urls() {
        assert_eq!(file_url(Path::new("/tmp/lo-profile")), "file:///tmp/lo-profile");
        assert_eq!(
            file_url(Path::new(r"C:\Users\ana\AppData\Local\Temp\x")),
            "file:///C:/Users/ana/AppData/Local/Temp/x"
        );
    }

    #[test]
    fn output_name_follows_input_stem() {
        assert_eq!(
            produced_path(Path::new("/in/certificado_40_horas_Ana.pptx"), Path::new("/out")),
            Some(PathBuf::from("/out/certificado_40_horas_Ana.pdf"))
        );
        assert_eq!(
            produced_path(Path::new("/in/Ana.Q.docx"), Path::new("/out")),
            Some(PathBuf::from("/out/Ana.Q.pdf"))
        );
    }

    #[test]
    fn nonexistent_absolute_candidates_are_rejected_without_spawning() {
        assert!(!answers_version(Path::new("/no/such/soffice"), Duration::from_secs(1)));
    }
}
