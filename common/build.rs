// Expose BUILD_VERSION as "<package version>-<short commit hash>"
// EAC_COMMIT_HASH takes precedence over git, for builds outside of a checkout.

use std::process::Command;

fn short_commit_hash() -> Option<String> {
    if let Some(hash) = option_env!("EAC_COMMIT_HASH") {
        return Some(hash.chars().take(7).collect());
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn main() {
    let commit_hash = short_commit_hash().unwrap_or_else(|| "unknown".to_owned());
    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), commit_hash);

    println!("cargo:rerun-if-env-changed=EAC_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
