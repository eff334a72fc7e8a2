//! Word / PowerPoint export driven through PowerShell COM automation. Windows only.

use super::process::run_with_timeout;
use super::ConversionStrategy;
use crate::error::ConversionError;
use crate::services::templates::TemplateKind;
use log::warn;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// `wdExportFormatPDF`
const WORD_FORMAT_PDF: u8 = 17;
/// `wdExportOptimizeForPrint`
const WORD_OPTIMIZE_PRINT: u8 = 0;
/// `ppFixedFormatTypePDF`
const POWERPOINT_FORMAT_PDF: u8 = 2;
/// `ppFixedFormatIntentPrint`
const POWERPOINT_INTENT_PRINT: u8 = 2;

pub struct OfficeAutomation {
    timeout: Duration,
}

impl OfficeAutomation {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Single-quoted PowerShell literal.
fn ps_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "''"))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Office host process name, as `Get-Process` reports it.
fn host_process(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Document => "WINWORD",
        TemplateKind::Presentation => "POWERPNT",
    }
}

/// Records the ids of host processes that appeared while the application object was
/// created. The COM server is not a child of `powershell`, so killing the script's
/// process tree does not reach it.
fn track_host(kind: TemplateKind, pid_file: &Path, create: &str) -> String {
    let host = host_process(kind);
    let pid_file = ps_quote(pid_file);
    format!(
        "$before = @(Get-Process {host} -ErrorAction SilentlyContinue | ForEach-Object {{ $_.Id }})
  {create}
  Get-Process {host} -ErrorAction SilentlyContinue | Where-Object {{ $before -notcontains $_.Id }} | ForEach-Object {{ $_.Id }} | Set-Content -Path {pid_file}"
    )
}

/// Script that opens `input` read-only, exports it to `output` and always closes the
/// document and quits the application. The host's process ids are written to
/// `pid_file` so a timed-out session can be stopped from outside.
pub fn export_script(kind: TemplateKind, input: &Path, output: &Path, pid_file: &Path) -> String {
    let input = ps_quote(&absolute(input));
    let output = ps_quote(&absolute(output));
    match kind {
        TemplateKind::Document => {
            let create = track_host(kind, pid_file, "$app = New-Object -ComObject Word.Application");
            format!(
                "$ErrorActionPreference = 'Stop'
$app = $null; $doc = $null
try {{
  {create}
  $app.Visible = $false
  $app.DisplayAlerts = 0
  $doc = $app.Documents.Open({input}, $false, $true)
  $doc.ExportAsFixedFormat({output}, {WORD_FORMAT_PDF}, $false, {WORD_OPTIMIZE_PRINT})
}} finally {{
  if ($doc -ne $null) {{ $doc.Close($false) }}
  if ($app -ne $null) {{ $app.Quit() }}
}}"
            )
        }
        TemplateKind::Presentation => {
            let create = track_host(kind, pid_file, "$app = New-Object -ComObject PowerPoint.Application");
            format!(
                "$ErrorActionPreference = 'Stop'
$app = $null; $pres = $null
try {{
  {create}
  $pres = $app.Presentations.Open({input}, -1, 0, 0)
  $pres.ExportAsFixedFormat({output}, {POWERPOINT_FORMAT_PDF}, {POWERPOINT_INTENT_PRINT})
}} finally {{
  if ($pres -ne $null) {{ $pres.Close() }}
  if ($app -ne $null) {{ $app.Quit() }}
}}"
            )
        }
    }
}

/// Force-stops the host processes listed in `pid_file`, if any.
fn stop_hosts(pid_file: &Path) {
    let Ok(ids) = std::fs::read_to_string(pid_file) else {
        return;
    };
    for pid in ids.split_whitespace().filter(|id| id.parse::<u32>().is_ok()) {
        warn!("Stopping orphaned office host (pid {})", pid);
        let status = Command::new("taskkill")
            .args(["/T", "/F", "/PID", pid])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            warn!("Could not stop pid {}: {}", pid, e);
        }
    }
}

impl ConversionStrategy for OfficeAutomation {
    fn name(&self) -> &str {
        "office-automation"
    }

    fn is_available(&self) -> bool {
        cfg!(windows)
    }

    fn attempt(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let kind = TemplateKind::from_path(input).ok_or_else(|| {
            ConversionError::Unavailable(format!("no office application for {}", input.display()))
        })?;
        let session = tempfile::tempdir()?;
        let pid_file = session.path().join("host.pid");
        let mut cmd = Command::new("powershell");
        cmd.args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
        ])
        .arg(export_script(kind, input, output, &pid_file));

        let result = run_with_timeout(cmd, self.timeout).and_then(|f| f.success_or("powershell"));
        if let Err(ConversionError::Timeout { .. }) = &result {
            stop_hosts(&pid_file);
        }
        result.map(|_| ())
    }
}
