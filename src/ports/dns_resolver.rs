//! DNS resolution port for email host validation.

use async_trait::async_trait;

use crate::domain::{Email, EmailError, RESOLUTION_ALLOWLIST};

/// Port for DNS lookups during email validation.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Whether the host has at least one MX record.
    async fn has_mx_records(&self, host: &str) -> bool;

    /// Whether the host has at least one A or AAAA record.
    async fn has_ip_records(&self, host: &str) -> bool;
}

/// Check that an address's host can receive mail.
///
/// MX records are consulted first; a host with no MX but a resolvable
/// A/AAAA record still passes, matching SMTP fallback delivery. Allowlisted
/// hosts skip resolution entirely so tests and local setups never touch
/// the network.
pub async fn verify_email_host(
    resolver: &dyn DnsResolver,
    email: &Email,
) -> Result<(), EmailError> {
    let host = email.host();
    if RESOLUTION_ALLOWLIST.contains(&host) {
        return Ok(());
    }
    if resolver.has_mx_records(host).await || resolver.has_ip_records(host).await {
        return Ok(());
    }
    Err(EmailError::UnresolvableHost)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolver with fixed answers.
    struct FixedResolver {
        mx: bool,
        ip: bool,
    }

    #[async_trait]
    impl DnsResolver for FixedResolver {
        async fn has_mx_records(&self, _host: &str) -> bool {
            self.mx
        }

        async fn has_ip_records(&self, _host: &str) -> bool {
            self.ip
        }
    }

    #[tokio::test]
    async fn passes_with_mx_records() {
        let resolver = FixedResolver { mx: true, ip: false };
        let email = Email::parse("user@mail.example.net").unwrap();
        assert!(verify_email_host(&resolver, &email).await.is_ok());
    }

    #[tokio::test]
    async fn falls_back_to_ip_records() {
        let resolver = FixedResolver { mx: false, ip: true };
        let email = Email::parse("user@mail.example.net").unwrap();
        assert!(verify_email_host(&resolver, &email).await.is_ok());
    }

    #[tokio::test]
    async fn fails_when_nothing_resolves() {
        let resolver = FixedResolver {
            mx: false,
            ip: false,
        };
        let email = Email::parse("user@mail.example.net").unwrap();
        assert_eq!(
            verify_email_host(&resolver, &email).await,
            Err(EmailError::UnresolvableHost)
        );
    }

    #[tokio::test]
    async fn allowlisted_host_skips_resolution() {
        let resolver = FixedResolver {
            mx: false,
            ip: false,
        };
        let email = Email::parse("user@example.com").unwrap();
        assert!(verify_email_host(&resolver, &email).await.is_ok());
    }
}
