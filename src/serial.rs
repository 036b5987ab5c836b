//! Binary serialization and deserialization of compiled rule sets.
//!
//! This module provides a stable binary format for persisting
//! [`RuleSet`](crate::RuleSet) values so a large configuration does not have
//! to be re-parsed on every start. The format consists of a 32-byte fixed
//! header followed by a bincode-encoded payload of the rule definitions.
//! Patterns are stored as source text and recompiled on load.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"CRPS"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ContentRuleDef, MetadataRuleDef, ParserConfig};
use crate::types::{ConfigError, MatchDiscipline, RuleSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"CRPS";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a rule set cache: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to recompile rule set: {0}")]
    Compile(#[from] ConfigError),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleSet {
    metadata: RuleSetMetadata,
    metadata_rules: Vec<SerializedMetadataRule>,
    content_rules: Vec<SerializedContentRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    metadata_rule_count: usize,
    content_rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedMetadataRule {
    patterns: Vec<String>,
    groups: Vec<String>,
    priority: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedContentRule {
    segment_type: String,
    discipline: SerializedDiscipline,
    patterns: Vec<String>,
    groups: Vec<String>,
    priority: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedDiscipline {
    Enclosed,
    Prefix,
    Suffix,
}

// ---------------------------------------------------------------------------
// MatchDiscipline conversion
// ---------------------------------------------------------------------------

fn serialize_discipline(d: MatchDiscipline) -> SerializedDiscipline {
    match d {
        MatchDiscipline::Enclosed => SerializedDiscipline::Enclosed,
        MatchDiscipline::Prefix => SerializedDiscipline::Prefix,
        MatchDiscipline::Suffix => SerializedDiscipline::Suffix,
    }
}

fn deserialize_discipline(d: SerializedDiscipline) -> MatchDiscipline {
    match d {
        SerializedDiscipline::Enclosed => MatchDiscipline::Enclosed,
        SerializedDiscipline::Prefix => MatchDiscipline::Prefix,
        SerializedDiscipline::Suffix => MatchDiscipline::Suffix,
    }
}

// ---------------------------------------------------------------------------
// RuleSet <-> SerializedRuleSet
// ---------------------------------------------------------------------------

fn ruleset_to_serialized(ruleset: &RuleSet, source_text: Option<&str>) -> SerializedRuleSet {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());
    let config = ruleset.to_config();

    let metadata_rules: Vec<SerializedMetadataRule> = config
        .metadata
        .into_iter()
        .map(|m| SerializedMetadataRule {
            patterns: m.patterns,
            groups: m.groups,
            priority: m.priority,
        })
        .collect();

    let content_rules: Vec<SerializedContentRule> = config
        .content
        .into_iter()
        .map(|c| SerializedContentRule {
            segment_type: c.segment_type,
            discipline: serialize_discipline(c.match_type),
            patterns: c.patterns,
            groups: c.groups,
            priority: c.priority,
        })
        .collect();

    SerializedRuleSet {
        metadata: RuleSetMetadata {
            metadata_rule_count: metadata_rules.len(),
            content_rule_count: content_rules.len(),
            source_digest,
        },
        metadata_rules,
        content_rules,
    }
}

fn serialized_to_ruleset(ser: SerializedRuleSet) -> Result<RuleSet, DeserializeError> {
    validate(&ser)?;

    let config = ParserConfig {
        metadata: ser
            .metadata_rules
            .into_iter()
            .map(|m| MetadataRuleDef {
                patterns: m.patterns,
                groups: m.groups,
                priority: m.priority,
            })
            .collect(),
        content: ser
            .content_rules
            .into_iter()
            .map(|c| ContentRuleDef {
                segment_type: c.segment_type,
                match_type: deserialize_discipline(c.discipline),
                patterns: c.patterns,
                groups: c.groups,
                priority: c.priority,
            })
            .collect(),
    };

    Ok(RuleSet::from_config(&config)?)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRuleSet) -> Result<(), DeserializeError> {
    if ser.metadata.metadata_rule_count != ser.metadata_rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} metadata rules but payload has {}",
            ser.metadata.metadata_rule_count,
            ser.metadata_rules.len()
        )));
    }
    if ser.metadata.content_rule_count != ser.content_rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} content rules but payload has {}",
            ser.metadata.content_rule_count,
            ser.content_rules.len()
        )));
    }

    for (i, rule) in ser.metadata_rules.iter().enumerate() {
        if rule.patterns.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "metadata rule {i} has no patterns"
            )));
        }
    }
    for rule in &ser.content_rules {
        if rule.patterns.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "content rule '{}' has no patterns",
                rule.segment_type
            )));
        }
    }

    // Content rule priority ordering (descending)
    for window in ser.content_rules.windows(2) {
        if window[0].priority < window[1].priority {
            return Err(DeserializeError::Validation(
                "content rules not sorted by descending priority".to_owned(),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version (informational, not used for checks)
    // bytes[8..12] is flags (reserved)
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

/// Check the header and checksum, then decode the payload.
fn read_payload(bytes: &[u8]) -> Result<SerializedRuleSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_start = HEADER_SIZE;
    let payload_end = payload_start + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[payload_start..payload_end];

    // Integrity check
    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedRuleSet, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    ruleset: &RuleSet,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = ruleset_to_serialized(ruleset, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    serialized_to_ruleset(read_payload(bytes)?)
}

/// Whether `bytes` were produced from exactly `source_text`.
///
/// Returns `false` for a cache written without a source digest.
///
/// # Errors
///
/// Returns [`DeserializeError`] if `bytes` is not a valid cache.
pub fn cache_matches_source(bytes: &[u8], source_text: &str) -> Result<bool, DeserializeError> {
    let serialized = read_payload(bytes)?;
    let digest = *blake3::hash(source_text.as_bytes()).as_bytes();
    Ok(serialized.metadata.source_digest == Some(digest))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
