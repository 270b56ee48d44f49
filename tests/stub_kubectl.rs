//! End-to-end run against a stub `kubectl` script.
//!
//! Kept in its own test binary: the script is written and executed by the
//! same process, and no other test may fork while it is open for writing.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const STUB: &str = r#"#!/bin/sh
shift # --kubeconfig=...
case "$1" in
  get)
    echo "NAMESPACE   NAME    READY"
    echo "shop        web-0   2/2"
    ;;
  describe)
    case "$2" in
      pods)
        printf 'Name:         web-0\nNamespace:    shop\nStatus:       Running\n\nName:         db-0\nNamespace:    shop\nStatus:       Running\n'
        ;;
      configmaps)
        printf 'Name:         settings\nNamespace:    shop\nData\n====\n'
        ;;
      services)
        echo "No resources found" >&2
        ;;
      customresourcedefinitions)
        printf 'Name:         widgets.example.com\nNamespace:    \n'
        ;;
      widgets.example.com)
        printf 'Name:         w1\nNamespace:    shop\n'
        ;;
    esac
    ;;
  logs)
    # logs -n <ns> <pod> [-c <container>]
    if [ "$4" = "web-0" ] && [ -z "$6" ]; then
      echo "error: a container name must be specified for pod web-0, choose one of: [web proxy]" >&2
      exit 1
    fi
    echo "log of $4 $6"
    ;;
  cluster-info)
    while [ $# -gt 0 ]; do
      if [ "$1" = "--output-directory" ]; then
        mkdir -p "$2"
        echo '{}' > "$2/nodes.json"
      fi
      shift
    done
    ;;
esac
"#;

fn run(kubectl: &Path, kube: &Path, out: &Path, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cluster-harvester"))
        .arg("--kc")
        .arg(kube)
        .arg("-o")
        .arg(out)
        .arg("--kubectl")
        .arg(kubectl)
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cluster-harvester")
}

#[test]
fn test_full_snapshot_then_rerun() {
    let tools = TempDir::new().unwrap();
    let kubectl = tools.path().join("kubectl");
    fs::write(&kubectl, STUB).unwrap();
    fs::set_permissions(&kubectl, fs::Permissions::from_mode(0o755)).unwrap();

    let kube = TempDir::new().unwrap();
    fs::create_dir_all(kube.path().join("team")).unwrap();
    fs::write(
        kube.path().join("team/stub.kubeconfig"),
        "apiVersion: v1\nkind: Config\ncurrent-context: stub\nclusters:\n- name: stub\n",
    )
    .unwrap();
    let out = TempDir::new().unwrap();

    let output = run(&kubectl, kube.path(), out.path(), &[]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let cluster = out.path().join("stub.kubeconfig");
    assert!(cluster.join("pods.out").exists());
    assert!(cluster.join("cluster-info/nodes.json").exists());
    assert!(cluster.join("pods-describe/web-0.yaml").exists());
    assert!(cluster.join("pods-describe/db-0.yaml").exists());
    assert!(cluster.join("pods-logs/web-0_web.log").exists());
    assert!(cluster.join("pods-logs/web-0_proxy.log").exists());
    assert!(cluster.join("pods-logs/db-0.log").exists());
    assert!(cluster.join("cm/settings.yaml").exists());
    assert!(!cluster.join("svc").exists());
    assert!(cluster
        .join("crd/widgets.example.com/widgets.example.com.yaml")
        .exists());
    assert!(cluster
        .join("crd/widgets.example.com/instances/w1.yaml")
        .exists());

    let settings = fs::read_to_string(cluster.join("cm/settings.yaml")).unwrap();
    assert_eq!(settings, "Name:         settings\nNamespace:    shop\nData\n====\n");

    // Same content again in diff mode: nothing new next to the config map.
    let output = run(&kubectl, kube.path(), out.path(), &["--diff", "--no-pod", "--no-crd"]);
    assert_eq!(output.status.code(), Some(0));
    let cm_files: Vec<_> = fs::read_dir(cluster.join("cm")).unwrap().collect();
    assert_eq!(cm_files.len(), 1);
    assert_eq!(
        fs::read_to_string(cluster.join("cm/settings.yaml")).unwrap(),
        settings
    );

    // Without diff mode the pod descriptions get timestamped siblings.
    let output = run(&kubectl, kube.path(), out.path(), &["--no-cm", "--no-crd", "--no-logs"]);
    assert_eq!(output.status.code(), Some(0));
    let versioned = fs::read_dir(cluster.join("pods-describe"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("web-0_"))
        .count();
    assert_eq!(versioned, 1);
}
