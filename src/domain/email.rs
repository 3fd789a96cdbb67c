//! Email address value object.
//!
//! Every address that enters the system passes through [`Email::parse`];
//! no raw string reaches a provider without surviving it. Format checks are
//! pure and fast. Host resolution (MX/A lookups) is a separate, network-bound
//! step driven through the [`DnsResolver`](crate::ports::DnsResolver) port so
//! that callers needing fast rejection can stop at the format check.

use thiserror::Error;

/// Maximum length of the local part, per RFC 5321.
const MAX_LOCAL_LEN: usize = 64;

/// Overall length bounds for a plausible address.
const MIN_TOTAL_LEN: usize = 6;
const MAX_TOTAL_LEN: usize = 254;

/// Hosts that skip DNS resolution during validation.
pub const RESOLUTION_ALLOWLIST: [&str; 2] = ["localhost", "example.com"];

/// Errors from email validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// The address does not satisfy the syntactic rules.
    #[error("invalid format")]
    InvalidFormat,

    /// Neither an MX nor an A/AAAA record could be resolved for the host.
    #[error("unresolvable host")]
    UnresolvableHost,
}

/// A normalized, format-validated email address.
///
/// Immutable once constructed. The full value is always
/// `normalize`-stable: lowercase, trimmed, no trailing dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    value: String,
    at: usize,
}

impl Email {
    /// Parse and validate an address, normalizing it first.
    ///
    /// Rules (derived from RFC 5322 section 3.2.3):
    /// - total length within [6, 254]
    /// - exactly one address separator: the last `@`, not at position 0,
    ///   leaving at least 2 host characters
    /// - local part at most 64 characters, drawn from the atext class plus
    ///   dots, with no leading/trailing dot and no consecutive dots
    /// - host contains a dot-separated label and no whitespace
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let value = normalize(raw);

        if value.len() < MIN_TOTAL_LEN || value.len() > MAX_TOTAL_LEN {
            return Err(EmailError::InvalidFormat);
        }

        let at = value.rfind('@').ok_or(EmailError::InvalidFormat)?;
        if at == 0 || at > value.len() - 3 {
            return Err(EmailError::InvalidFormat);
        }

        let user = &value[..at];
        let host = &value[at + 1..];

        if user.len() > MAX_LOCAL_LEN {
            return Err(EmailError::InvalidFormat);
        }
        if user.starts_with('.') || user.ends_with('.') || user.contains("..") {
            return Err(EmailError::InvalidFormat);
        }
        if !user.chars().all(is_local_char) {
            return Err(EmailError::InvalidFormat);
        }
        if !host_has_label(host) {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self { value, at })
    }

    /// Format-only validation without constructing the value object.
    pub fn validate_format(raw: &str) -> Result<(), EmailError> {
        Self::parse(raw).map(|_| ())
    }

    /// The local part (before the `@`).
    pub fn user(&self) -> &str {
        &self.value[..self.at]
    }

    /// The host part (after the `@`).
    pub fn host(&self) -> &str {
        &self.value[self.at + 1..]
    }

    /// The full normalized address.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Normalize an address: trim whitespace, trim trailing dots, lowercase.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .to_lowercase()
}

/// Mask an address for logging.
///
/// Returns an empty string when the address fails construction. Otherwise
/// reveals the first local-part character and the host. Local parts shorter
/// than 5 characters mask everything after the first character; longer ones
/// keep the final character and mask up to 8 interior characters.
pub fn mask(raw: &str) -> String {
    let Ok(email) = Email::parse(raw) else {
        return String::new();
    };
    let user = email.user();
    let first = &user[..1];

    if user.len() < 5 {
        return format!("{}{}@{}", first, "*".repeat(user.len() - 1), email.host());
    }

    let interior = user.len() - 2;
    let last = &user[user.len() - 1..];
    format!(
        "{}{}{}@{}",
        first,
        "*".repeat(interior.min(8)),
        last,
        email.host()
    )
}

/// Local-part character class: atext plus dot (dot placement is checked
/// separately).
fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '.'
                | '-'
        )
}

/// A host is plausible when it contains no whitespace and at least one dot
/// with characters on both sides.
fn host_has_label(host: &str) -> bool {
    if host.chars().any(char::is_whitespace) {
        return false;
    }
    host.char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < host.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ════════════════════════════════════════════════════════════════════════
    // Normalization
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  User@Example.COM.  "), "user@example.com");
    }

    #[test]
    fn normalize_strips_trailing_dots_only() {
        assert_eq!(normalize("a.b@example.com.."), "a.b@example.com");
    }

    #[test]
    fn normalize_is_idempotent_on_samples() {
        for s in ["  A@B.Co. ", "x@y.z", "", "...", " MiXeD@CaSe.Org "] {
            assert_eq!(normalize(&normalize(s)), normalize(s));
        }
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn parse_accepts_plain_address() {
        let email = Email::parse("user@example.com").unwrap();
        assert_eq!(email.user(), "user");
        assert_eq!(email.host(), "example.com");
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn parse_normalizes_before_validating() {
        let email = Email::parse("  User@Example.COM. ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn parse_rejects_bad_addresses() {
        for raw in [
            "bad",
            "a@b",
            "a..b@example.com",
            ".a@example.com",
            "a.@example.com",
            "@example.com",
            "a@bc",
            "spaced user@example.com",
            "user@no dots allowed",
            "user@nodot",
            "",
        ] {
            assert_eq!(Email::parse(raw), Err(EmailError::InvalidFormat), "{raw}");
        }
    }

    #[test]
    fn parse_rejects_overlong_local_part() {
        let raw = format!("{}@example.com", "a".repeat(65));
        assert_eq!(Email::parse(&raw), Err(EmailError::InvalidFormat));
    }

    #[test]
    fn parse_rejects_overlong_address() {
        let raw = format!("user@{}.com", "a".repeat(250));
        assert_eq!(Email::parse(&raw), Err(EmailError::InvalidFormat));
    }

    #[test]
    fn parse_splits_on_last_at_sign() {
        // The separator is the last '@'; an extra '@' lands in the local
        // part, which the character class rejects.
        assert_eq!(
            Email::parse("a@b@example.com"),
            Err(EmailError::InvalidFormat)
        );
    }

    #[test]
    fn validate_format_matches_parse() {
        assert!(Email::validate_format("user@example.com").is_ok());
        assert_eq!(
            Email::validate_format("nope"),
            Err(EmailError::InvalidFormat)
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // Masking
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn mask_short_local_part_keeps_first_char_only() {
        assert_eq!(mask("jo@example.com"), "j*@example.com");
        assert_eq!(mask("jane@example.com"), "j***@example.com");
    }

    #[test]
    fn mask_long_local_part_keeps_first_and_last() {
        assert_eq!(mask("abcdefgh@example.com"), "a******h@example.com");
    }

    #[test]
    fn mask_caps_interior_stars_at_eight() {
        assert_eq!(
            mask("abcdefghijklmnop@example.com"),
            "a********p@example.com"
        );
    }

    #[test]
    fn mask_invalid_address_is_empty() {
        assert_eq!(mask("not-an-email"), "");
    }
}
