use std::process::Command;

use tempfile::tempdir;

#[test]
fn test_abort_reports_on_stderr_with_logging_off() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("wrangler.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_r2sync"))
        .arg("--config")
        .arg(&config)
        .arg("--persist-to")
        .arg(dir.path().join("state"))
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let expected = format!("Error: Failed to read {}: ", config.display());
    assert!(stderr.starts_with(&expected), "{}", stderr);
    assert_eq!(stderr.lines().count(), 1);
}

#[test]
fn test_missing_state_dir_exits_nonzero() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("wrangler.toml");
    std::fs::write(
        &config,
        "[vars]\nMEDIA_PUBLIC_BASE_URL = \"http://127.0.0.1:1\"\n\n[[r2_buckets]]\nbucket_name = \"products\"\n",
    )
    .unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_r2sync"))
        .arg("--config")
        .arg(&config)
        .arg("--persist-to")
        .arg(dir.path().join("state"))
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("Error: Missing local R2 sqlite dir:"), "{}", stderr);
}
