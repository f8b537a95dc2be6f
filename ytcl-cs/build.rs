//! Build script for ytcl-cs
//!
//! Stamps the binary with its git commit, build time, and profile so the
//! startup log line identifies exactly what is running.

use std::process::Command;

fn git_short_hash() -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output();

    match output {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string()),
        _ => "unknown".to_string(),
    }
}

fn main() {
    println!("cargo:rustc-env=GIT_HASH={}", git_short_hash());
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string())
    );

    // No rerun-if-changed directives: rerun every build so the timestamp
    // and hash stay current
}
