//! Integration tests for the command line surface

use std::process::Command;
use tempfile::TempDir;

/// Helper to run the harvester binary
fn harvester(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cluster-harvester"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cluster-harvester")
}

#[test]
fn test_version_exits_zero() {
    let output = harvester(&["--version"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_exits_one() {
    let output = harvester(&["--no-such-flag"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_bad_timeout_value_exits_one() {
    let output = harvester(&["--timeout", "soon"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_empty_kubeconfig_dir_is_fatal() {
    let kube = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let output = harvester(&[
        "--kc",
        kube.path().to_str().unwrap(),
        "-o",
        out.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No kubeconfig found"));
}

#[test]
fn test_invalid_kubeconfig_is_fatal() {
    let kube = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    std::fs::write(kube.path().join("bad.kubeconfig"), "clusters: []\n").unwrap();

    let output = harvester(&[
        "--kc",
        kube.path().to_str().unwrap(),
        "-o",
        out.path().to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.kubeconfig"));
    assert!(!out.path().join("bad.kubeconfig").exists());
}

#[test]
fn test_help_exits_zero_and_lists_flags() {
    let output = harvester(&["--help"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--kc"));
    assert!(stdout.contains("--diff"));
}

#[test]
fn test_usage_error_is_reported_on_stderr() {
    let output = harvester(&["--no-such-flag"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--no-such-flag"));
}
