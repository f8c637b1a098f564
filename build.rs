//! Bakes `TT_VERSION` into the binary.
use std::path::PathBuf;
use std::process::Command;

fn main() {
    // Prefer TT_VERSION env var if set (e.g., by CI release workflow),
    // otherwise fall back to git describe for local development builds.
    if let Ok(version) = std::env::var("TT_VERSION") {
        println!("cargo:rustc-env=TT_VERSION={version}");
    } else if let Some(version) = git(&["describe", "--tags", "--always", "--dirty"]) {
        println!("cargo:rustc-env=TT_VERSION={version}");
    }

    // The package may sit inside a larger checkout or in none at all.
    if let Some(git_dir) = git(&["rev-parse", "--absolute-git-dir"]).map(PathBuf::from) {
        for watched in [git_dir.join("HEAD"), git_dir.join("refs")] {
            if watched.exists() {
                println!("cargo:rerun-if-changed={}", watched.display());
            }
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TT_VERSION");
}

/// Run git and return its trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
