//! Resolution of the terraform executable.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::HarnessConfig;
use crate::error::HarnessError;

pub const TERRAFORM_PROGRAM: &str = "terraform";

#[derive(Debug, Clone, Serialize)]
pub struct TerraformResolveResult {
    pub exe: PathBuf,
    pub via: String,
}

/// Locate terraform: explicit override first, then `PATH`.
pub fn locate_terraform() -> Result<TerraformResolveResult, HarnessError> {
    if let Some(path) = HarnessConfig::terraform_override() {
        if is_executable_candidate(&path) {
            let exe = absolutize(path);
            log_resolved(&exe, "env");
            return Ok(TerraformResolveResult {
                exe,
                via: "env".to_string(),
            });
        }
        tracing::warn!(
            target: "tfharness",
            path = %path.display(),
            "terraform override is not an executable file, falling back to PATH"
        );
    }

    match search_in_path(TERRAFORM_PROGRAM) {
        Some(found) => {
            let exe = absolutize(found);
            log_resolved(&exe, "PATH");
            Ok(TerraformResolveResult {
                exe,
                via: "PATH".to_string(),
            })
        }
        None => Err(HarnessError::ToolNotFound {
            detail: match std::env::var_os("PATH") {
                Some(p) if !p.is_empty() => format!("searched {}", p.to_string_lossy()),
                _ => "PATH is empty".to_string(),
            },
        }),
    }
}

/// Like [`locate_terraform`], but a missing binary ends the process.
///
/// Nothing can run without the tool, so this is a prerequisite failure rather
/// than a test failure: one line on stderr and a non-zero exit.
pub fn locate_terraform_or_exit() -> PathBuf {
    match locate_terraform() {
        Ok(resolved) => resolved.exe,
        Err(err) => {
            eprintln!("lookup terraform binary: {err}");
            std::process::exit(1);
        }
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

fn log_resolved(path: &Path, source: &str) {
    tracing::info!(
        target: "tfharness",
        exe = %path.display(),
        source = source,
        os = %std::env::consts::OS,
        arch = %std::env::consts::ARCH,
        "terraform executable resolved"
    );
}

fn is_executable_candidate(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn search_in_path(program: &str) -> Option<PathBuf> {
    let exts: Vec<String> = if cfg!(windows) {
        std::env::var_os("PATHEXT")
            .map(|v| {
                v.to_string_lossy()
                    .split(';')
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_else(|| vec![".EXE".into(), ".CMD".into(), ".BAT".into(), ".COM".into()])
    } else {
        Vec::new()
    };
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find_map(|dir| candidate_in_dir(&dir, program, &exts))
}

fn candidate_in_dir(dir: &Path, program: &str, exts: &[String]) -> Option<PathBuf> {
    if cfg!(windows) && !program.contains('.') {
        return exts
            .iter()
            .map(|ext| dir.join(format!("{program}{ext}")))
            .find(|p| is_executable_candidate(p));
    }
    let p = dir.join(program);
    is_executable_candidate(&p).then_some(p)
}
