use std::path::{Path, PathBuf};

use crate::dispatch::{HandlerResult, Invocation, Reply};
use crate::error::CommandError;
use crate::scan::{package_dirs, PackageScanner};
use crate::session::Session;

/// `-environment-cd <dir>`: remembers the directory, adds it to `GOPATH`
/// and maps every `main` package below it to its binary name.
pub fn environment_cd(session: &mut Session, inv: &mut Invocation<'_>, scanner: &dyn PackageScanner) -> HandlerResult {
    let arg = inv.args_str();
    let dir = unquote(&arg);
    if dir.is_empty() {
        return Err(CommandError::Malformed("no directory supplied".into()));
    }
    let dir = PathBuf::from(dir);

    session.cwd = Some(dir.clone());
    session.append_search_path("GOPATH", &dir.to_string_lossy());

    let files = scanner
        .main_files(&dir)
        .map_err(|e| CommandError::Unresolved(format!("cannot scan {}: {e:#}", dir.display())))?;
    for (binary, package_dir) in package_dirs(&files) {
        if session.record_package_dir(binary.clone(), package_dir.clone()) {
            tracing::debug!("Binary {} builds from {}", binary, package_dir.display());
        }
    }

    Ok(Reply::done())
}

/// `-file-exec-and-symbols <binary>`: picks the package to debug by the
/// binary's base name.
pub fn file_exec_and_symbols(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    let arg = inv.args_str();
    let binary = unquote(&arg);
    if binary.is_empty() {
        return Err(CommandError::Malformed("no executable supplied".into()));
    }

    let package_dir = Path::new(binary)
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| session.package_dirs.get(name))
        .cloned()
        .ok_or_else(|| CommandError::Unresolved(format!("cannot determine package directory for {binary}")))?;

    tracing::info!("Package directory: {}", package_dir.display());
    session.debug_binary = Some(PathBuf::from(binary));
    session.package_dir = Some(package_dir);
    Ok(Reply::done())
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}
