use std::process::Command;

fn short_head_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-env-changed=RECALL_CHAT_BUILD");

    // Source tarballs have no .git; packagers can stamp the build themselves.
    let build = std::env::var("RECALL_CHAT_BUILD")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(short_head_sha)
        .unwrap_or_else(|| "dev".to_string());

    println!("cargo:rustc-env=RECALL_CHAT_GIT_SHA={build}");
}
