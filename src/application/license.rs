//! Host-locked access gate.
//!
//! The "secret" here is deliberately recoverable: the expected code derives
//! from the same identity string that every rejection discloses, so an
//! operator who can read this module can compute the code for their own
//! machine. This is a self-service licensing speed bump, not a secret-keeping
//! mechanism.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const CODE_LEN: usize = 12;

/// The expected access code plus the identity string it derives from.
/// Computed once at startup and shared read-only through the HTTP state;
/// never recomputed per request.
#[derive(Debug, Clone)]
pub struct LicenseGate {
    code: String,
    identity: String,
}

impl LicenseGate {
    /// Derive the gate from the running host: the identity string is
    /// `user@host-cores`; the code is the first 12 characters of its
    /// uppercase-hex SHA-256 digest.
    pub fn from_host_identity() -> Self {
        let user = whoami::username();
        let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
        let cores = num_cpus::get();
        Self::from_identity(format!("{user}@{host}-{cores}"))
    }

    /// Derive the gate from an explicit identity string.
    pub fn from_identity(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        let digest = Sha256::digest(identity.as_bytes());
        let code = hex::encode_upper(digest)[..CODE_LEN].to_string();
        Self { code, identity }
    }

    /// The `user@host-cores` string the code was derived from. Disclosed on
    /// rejection and at startup.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn expected_code(&self) -> &str {
        &self.code
    }

    /// Exact comparison of a caller-supplied code against the expected one.
    pub fn verify(&self, supplied: &str) -> bool {
        supplied.as_bytes().ct_eq(self.code.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_matches_known_digest() {
        let gate = LicenseGate::from_identity("alice@ward-8");
        // SHA-256("alice@ward-8") starts F1695BCAC9E1...
        assert_eq!(gate.expected_code(), "F1695BCAC9E1");
    }

    #[test]
    fn code_is_twelve_uppercase_hex_characters() {
        let gate = LicenseGate::from_host_identity();
        assert_eq!(gate.expected_code().len(), 12);
        assert!(
            gate.expected_code()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        );
    }

    #[test]
    fn derivation_is_deterministic_within_a_process() {
        let first = LicenseGate::from_host_identity();
        let second = LicenseGate::from_host_identity();
        assert_eq!(first.expected_code(), second.expected_code());
        assert_eq!(first.identity(), second.identity());
    }

    #[test]
    fn identity_has_the_expected_shape() {
        let gate = LicenseGate::from_host_identity();
        let (user_host, cores) = gate.identity().rsplit_once('-').expect("cores suffix");
        assert!(user_host.contains('@'));
        assert!(cores.parse::<usize>().expect("core count") > 0);
    }

    #[test]
    fn verify_accepts_only_the_exact_code() {
        let gate = LicenseGate::from_identity("alice@ward-8");
        assert!(gate.verify("F1695BCAC9E1"));
        assert!(!gate.verify("f1695bcac9e1"));
        assert!(!gate.verify("F1695BCAC9E"));
        assert!(!gate.verify(""));
    }
}
