use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::harvest::traits::{ExtractStats, ExtractionContext, ExtractionError};
use crate::model::ResourceRecord;
use crate::snapshot::LOG;
use crate::traits::AccessError;

pub const LOGS_DIR: &str = "pods-logs";

fn bracket_group() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid regex"))
}

/// Container names listed in a "which container?" log error.
///
/// `kubectl` names the candidates as a bracketed, space-separated list. Only
/// the first bracket group counts; an error without one yields nothing.
pub fn container_names(message: &str) -> Vec<String> {
    bracket_group()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|group| group.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Containers to fetch one by one after a pod-level log fetch failed.
///
/// Only `kubectl`'s own output is searched; the command line may carry
/// brackets of its own (e.g. in the kubeconfig path).
fn containers_to_retry(err: &AccessError) -> Vec<String> {
    match err {
        AccessError::CommandFailed { output, .. } => container_names(output),
        _ => Vec::new(),
    }
}

/// Fetches and writes logs for every pod record that carries a namespace.
///
/// Every pod, and every container of a pod that needs one named, is
/// attempted; failures are reported together at the end.
pub async fn collect_pod_logs(
    ctx: &ExtractionContext,
    records: &[ResourceRecord],
) -> Result<ExtractStats, ExtractionError> {
    let dir = ctx.output_dir.join(LOGS_DIR);
    let mut stats = ExtractStats::default();
    let mut attempted = 0;
    let mut failures = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let Some(namespace) = record.namespace.as_deref() else {
            debug!(pod = %record.name, "Skipping logs for pod without namespace");
            continue;
        };

        let pod = pod_logs(ctx, &dir, namespace, record, &record.file_stem(i)).await;
        for failure in &pod.failures {
            warn!(cluster = ctx.access.cluster(), "Log fetch failed: {}", failure);
        }
        stats.merge(pod.stats);
        attempted += pod.attempted;
        failures.extend(pod.failures);
    }

    if failures.is_empty() {
        Ok(stats)
    } else {
        Err(ExtractionError::Partial {
            what: "pod log fetches",
            attempted,
            failures,
        })
    }
}

/// Log fetches of one pod.
#[derive(Default)]
struct PodLogs {
    stats: ExtractStats,
    attempted: usize,
    failures: Vec<String>,
}

impl PodLogs {
    async fn save(
        &mut self,
        ctx: &ExtractionContext,
        dir: &Path,
        name: &str,
        text: &str,
        label: &str,
    ) {
        self.attempted += 1;
        match ctx.writer.write(dir, name, text, LOG).await {
            Ok(outcome) => self.stats.record(&outcome),
            Err(e) => self.fail(label, e),
        }
    }

    fn fail(&mut self, label: &str, err: impl fmt::Display) {
        self.failures.push(format!("{}: {}", label, err));
    }
}

async fn pod_logs(
    ctx: &ExtractionContext,
    dir: &Path,
    namespace: &str,
    record: &ResourceRecord,
    stem: &str,
) -> PodLogs {
    let label = format!("{}/{}", namespace, record.name);
    let mut pod = PodLogs::default();

    let err = match ctx.access.logs(namespace, &record.name, None, false).await {
        Ok(text) => {
            pod.save(ctx, dir, stem, &text, &label).await;
            return pod;
        }
        Err(err) => err,
    };

    let containers = containers_to_retry(&err);
    if containers.is_empty() {
        pod.attempted += 1;
        pod.fail(&label, err);
        return pod;
    }

    debug!(pod = %record.name, containers = ?containers, "Fetching logs per container");
    for container in &containers {
        let label = format!("{}/{}", label, container);
        match ctx
            .access
            .logs(namespace, &record.name, Some(container), false)
            .await
        {
            Ok(text) => {
                let name = format!("{}_{}", stem, container);
                pod.save(ctx, dir, &name, &text, &label).await;
            }
            Err(e) => {
                pod.attempted += 1;
                pod.fail(&label, e);
            }
        }
    }
    pod
}
