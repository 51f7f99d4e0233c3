//! Trust-token parsing for validator configuration
//!
//! Each configuration line carries a base58 node-public token and an optional
//! free-text comment. A batch is all-or-nothing: the first bad line rejects
//! every entry, so an operator typo cannot silently admit a subset of the
//! intended trust list.

use keel_core::{base58, KeyType, PublicKey};

use crate::error::{Result, TrustError};

/// A parsed validator trust entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustTokenEntry {
    /// Decoded master public key
    pub public_key: PublicKey,
    /// Normalized comment (may be empty)
    pub comment: String,
}

/// Parse configuration lines into trust entries.
///
/// Comments have leading/trailing whitespace trimmed and internal runs
/// collapsed to single spaces. Blank lines are skipped. Tokens must decode as
/// ed25519 master keys; operational secp256k1 keys are rejected even when the
/// token itself is well formed.
pub fn parse_trust_tokens<'a, I>(lines: I) -> Result<Vec<TrustTokenEntry>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (token, comment) = match trimmed.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest),
            None => (trimmed, ""),
        };

        let public_key = base58::decode_node_public(token)
            .map_err(|e| TrustError::ParseTokens(format!("Bad validator token {}: {}", token, e)))?;

        // Operational keys must never be configured as master identities
        if public_key.key_type() != KeyType::Ed25519 {
            return Err(TrustError::ParseTokens(format!(
                "Validator token {} is an operational key, not a master identity",
                token
            )));
        }

        let comment = comment.split_whitespace().collect::<Vec<_>>().join(" ");
        entries.push(TrustTokenEntry {
            public_key,
            comment,
        });
    }

    Ok(entries)
}
