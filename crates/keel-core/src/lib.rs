//! Keel Core - node identity keys, token encoding, and the manifest codec
//!
//! This crate provides the foundational types for the Keel trust network:
//! unified master/operational public keys, base58-check node tokens, and the
//! signed manifest credential that delegates signing authority.

pub mod base58;
pub mod error;
pub mod keys;
pub mod manifest;

pub use base58::{decode_node_public, encode_node_public, TOKEN_NODE_PUBLIC};
pub use error::{CoreError, Result};
pub use keys::{KeyType, PublicKey, SecretKey};
pub use manifest::{Manifest, MANIFEST_PREFIX};
