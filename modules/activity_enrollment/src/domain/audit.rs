//! Audit log contract
//!
//! The log is append-only. Stores call `append` inside the same atomic unit as
//! the state change it describes; reporting collaborators only `query`.

use crate::contract::{AuditEntry, AuditQuery};
use anyhow::Result;
use async_trait::async_trait;

/// Append-only compliance log
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Durably append one entry. An error means nothing was written.
    async fn append(&self, entry: &AuditEntry) -> Result<()>;

    /// Entries matching `query`, in commit order
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>>;
}

/// Clamp a caller-supplied limit to the configured maximum
pub fn effective_limit(requested: Option<u64>, max: u64) -> u64 {
    requested.map_or(max, |limit| limit.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(None, 500), 500);
        assert_eq!(effective_limit(Some(10), 500), 10);
        assert_eq!(effective_limit(Some(10_000), 500), 500);
    }
}
