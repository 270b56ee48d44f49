use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One discovered kubeconfig and the folder its snapshot lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTarget {
    pub kubeconfig: PathBuf,
    pub name: String, // last path segment of the kubeconfig, e.g. "prod.kubeconfig"
    pub output_dir: PathBuf,
}

impl ClusterTarget {
    pub fn new(kubeconfig: impl Into<PathBuf>, output_root: &Path) -> Self {
        let kubeconfig = kubeconfig.into();
        let name = kubeconfig
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| kubeconfig.display().to_string());
        let output_dir = output_root.join(&name);
        Self {
            kubeconfig,
            name,
            output_dir,
        }
    }
}

/// Resource kinds that can be toggled on the command line.
///
/// Custom resource instances are not listed here: they are always harvested
/// as part of [`ResourceKind::CustomResourceDefinitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Pods,
    ConfigMaps,
    Services,
    CustomResourceDefinitions,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Pods,
        ResourceKind::ConfigMaps,
        ResourceKind::Services,
        ResourceKind::CustomResourceDefinitions,
    ];

    /// Resource name as understood by `kubectl describe`.
    pub fn api_resource(&self) -> &'static str {
        match self {
            ResourceKind::Pods => "pods",
            ResourceKind::ConfigMaps => "configmaps",
            ResourceKind::Services => "services",
            ResourceKind::CustomResourceDefinitions => "customresourcedefinitions",
        }
    }

    /// Subdirectory of the cluster folder that holds per-object descriptions.
    pub fn output_subdir(&self) -> &'static str {
        match self {
            ResourceKind::Pods => "pods-describe",
            ResourceKind::ConfigMaps => "cm",
            ResourceKind::Services => "svc",
            ResourceKind::CustomResourceDefinitions => "crd",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::Pods => "pods",
            ResourceKind::ConfigMaps => "configmaps",
            ResourceKind::Services => "services",
            ResourceKind::CustomResourceDefinitions => "crds",
        };
        f.write_str(label)
    }
}

/// Which namespaces namespaced queries cover.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceScope {
    #[default]
    All,
    Only(String),
}

/// A single object description cut out of a multi-object `describe` dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub namespace: Option<String>,
    pub kind: String,
    pub body: String,
}

impl ResourceRecord {
    /// Name usable as a file stem: path separators are replaced and an empty
    /// name falls back to `unnamed-<index>`.
    pub fn file_stem(&self, index: usize) -> String {
        if self.name.is_empty() {
            return format!("unnamed-{}", index);
        }
        self.name.replace(['/', '\\'], "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_target_uses_last_segment() {
        let target = ClusterTarget::new("/home/me/.kube/team/prod.kubeconfig", Path::new("/out"));
        assert_eq!(target.name, "prod.kubeconfig");
        assert_eq!(target.output_dir, PathBuf::from("/out/prod.kubeconfig"));
    }

    #[test]
    fn test_file_stem_sanitizes() {
        let mut record = ResourceRecord {
            name: "a/b".to_string(),
            namespace: None,
            kind: "pods".to_string(),
            body: String::new(),
        };
        assert_eq!(record.file_stem(0), "a_b");

        record.name.clear();
        assert_eq!(record.file_stem(3), "unnamed-3");
    }
}
