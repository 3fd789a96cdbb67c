//! DNS resolver adapter backed by hickory-resolver.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::ports::DnsResolver;

/// System resolver for email host checks.
///
/// Lookup failures of any kind count as "no records": a transient resolver
/// outage degrades validation rather than rejecting signups.
pub struct HickoryDnsResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ),
        }
    }
}

impl Default for HickoryDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn has_mx_records(&self, host: &str) -> bool {
        self.resolver
            .mx_lookup(host)
            .await
            .map(|records| records.iter().next().is_some())
            .unwrap_or(false)
    }

    async fn has_ip_records(&self, host: &str) -> bool {
        self.resolver
            .lookup_ip(host)
            .await
            .map(|records| records.iter().next().is_some())
            .unwrap_or(false)
    }
}
