//! Process exit codes

/// Snapshot complete, or `--version` / `--help`
pub const SUCCESS: u8 = 0;

/// Invalid command line
pub const USAGE_ERROR: u8 = 1;

/// Nothing was extracted: no kubeconfig found, unreadable tree, or a cluster
/// handle could not be built
pub const FATAL_ERROR: u8 = 2;

/// Every task ran but at least one failed; the rest of the snapshot is on disk
pub const PARTIAL_FAILURE: u8 = 3;
