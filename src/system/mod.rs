//! System module: queries against the running host

use std::process::Command;

/// Get the release string of the booted kernel from `uname -r`
///
/// # Returns
/// The trimmed release (e.g. `6.1.0-13-amd64`), or a description of why `uname`
/// could not report it.
pub fn running_kernel_release() -> Result<String, String> {
    match Command::new("uname").arg("-r").output() {
        Ok(out) => {
            if out.status.success() {
                let release = String::from_utf8_lossy(&out.stdout).trim().to_string();
                if release.is_empty() {
                    Err("uname -r printed nothing".to_string())
                } else {
                    Ok(release)
                }
            } else {
                Err(format!("uname -r failed with status: {:?}", out.status.code()))
            }
        }
        Err(e) => {
            log::warn!("[System] Failed to run uname: {}", e);
            Err(format!("Failed to execute uname: {}", e))
        }
    }
}
