//! Test support: a scripted stand-in for yt-dlp
//!
//! Installs a shell script that logs every invocation, then runs a
//! test-supplied body with `$*` available for dispatching on arguments.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable fake tool into `dir` and return its path.
/// Every invocation appends its full argument line to `invocations.log`
/// next to the script before `body` runs.
pub fn install(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-yt-dlp");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/invocations.log\"\n{body}\n"
    );
    fs::write(&path, script).expect("write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    path
}

/// Argument lines of every invocation so far, in order
pub fn invocations(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("invocations.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
