use std::collections::BTreeSet;
use thiserror::Error;

/// Requested computed parameters whose inputs never showed up among the resolved columns.
///
/// Always carries the complete set, so a configuration can be fixed in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The following parameters could not be resolved: {}", join(.missing))]
pub struct UnsupportedParameterError {
    pub missing: BTreeSet<String>,
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
