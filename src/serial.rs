//! Binary serialization and deserialization of survey logic snapshots.
//!
//! This module provides a stable binary format for caching
//! [`SurveyLogic`](crate::SurveyLogic) values, e.g. next to the `.logic` file
//! they were compiled from. The format consists of a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"BRWS"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! Question ids are interned into a string table; rules refer to questions by
//! slot. A snapshot is decoded without re-running validation, so rules left
//! dangling by a deleted question survive the round trip.
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Condition, LogicAction, LogicOperator, Question, QuestionId, Rule, RuleId, SurveyLogic};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"BRWS";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`SurveyLogic`](crate::SurveyLogic) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode survey logic: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`SurveyLogic`](crate::SurveyLogic) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a branchwise binary: invalid magic bytes")]
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

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedLogic {
    metadata: LogicMetadata,
    ids: Vec<String>,
    questions: Vec<SerializedQuestion>,
    rules: Vec<SerializedRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogicMetadata {
    question_count: usize,
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedQuestion {
    slot: usize,
    order: i32,
    required: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    id: String,
    owner: usize,
    source: usize,
    operator: SerializedOperator,
    value: String,
    action: SerializedAction,
    priority: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    IsAnswered,
    IsEmpty,
    Unsupported,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedAction {
    Show,
    Hide,
    SkipTo(usize),
    End,
}

// ---------------------------------------------------------------------------
// Operator conversion
// ---------------------------------------------------------------------------

fn serialize_op(op: LogicOperator) -> SerializedOperator {
    match op {
        LogicOperator::Equals => SerializedOperator::Equals,
        LogicOperator::NotEquals => SerializedOperator::NotEquals,
        LogicOperator::Contains => SerializedOperator::Contains,
        LogicOperator::NotContains => SerializedOperator::NotContains,
        LogicOperator::GreaterThan => SerializedOperator::GreaterThan,
        LogicOperator::LessThan => SerializedOperator::LessThan,
        LogicOperator::GreaterOrEqual => SerializedOperator::GreaterOrEqual,
        LogicOperator::LessOrEqual => SerializedOperator::LessOrEqual,
        LogicOperator::IsAnswered => SerializedOperator::IsAnswered,
        LogicOperator::IsEmpty => SerializedOperator::IsEmpty,
        LogicOperator::Unsupported => SerializedOperator::Unsupported,
    }
}

fn deserialize_op(op: SerializedOperator) -> LogicOperator {
    match op {
        SerializedOperator::Equals => LogicOperator::Equals,
        SerializedOperator::NotEquals => LogicOperator::NotEquals,
        SerializedOperator::Contains => LogicOperator::Contains,
        SerializedOperator::NotContains => LogicOperator::NotContains,
        SerializedOperator::GreaterThan => LogicOperator::GreaterThan,
        SerializedOperator::LessThan => LogicOperator::LessThan,
        SerializedOperator::GreaterOrEqual => LogicOperator::GreaterOrEqual,
        SerializedOperator::LessOrEqual => LogicOperator::LessOrEqual,
        SerializedOperator::IsAnswered => LogicOperator::IsAnswered,
        SerializedOperator::IsEmpty => LogicOperator::IsEmpty,
        SerializedOperator::Unsupported => LogicOperator::Unsupported,
    }
}

// ---------------------------------------------------------------------------
// Id interning
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Interner {
    ids: Vec<String>,
    slots: HashMap<String, usize>,
}

impl Interner {
    fn slot(&mut self, id: &QuestionId) -> usize {
        if let Some(&slot) = self.slots.get(id.as_str()) {
            return slot;
        }
        let slot = self.ids.len();
        self.ids.push(id.as_str().to_owned());
        self.slots.insert(id.as_str().to_owned(), slot);
        slot
    }
}

// ---------------------------------------------------------------------------
// SurveyLogic -> SerializedLogic
// ---------------------------------------------------------------------------

fn logic_to_serialized(logic: &SurveyLogic, source_text: Option<&str>) -> SerializedLogic {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());
    let mut interner = Interner::default();

    let questions: Vec<SerializedQuestion> = logic
        .questions()
        .iter()
        .map(|q| SerializedQuestion {
            slot: interner.slot(&q.id),
            order: q.order,
            required: q.is_required,
        })
        .collect();

    let rules: Vec<SerializedRule> = logic
        .rules()
        .iter()
        .map(|r| SerializedRule {
            id: r.id.as_str().to_owned(),
            owner: interner.slot(&r.owner),
            source: interner.slot(r.source()),
            operator: serialize_op(r.condition.operator),
            value: r.condition.value.clone(),
            action: match &r.action {
                LogicAction::Show => SerializedAction::Show,
                LogicAction::Hide => SerializedAction::Hide,
                LogicAction::SkipTo(target) => SerializedAction::SkipTo(interner.slot(target)),
                LogicAction::End => SerializedAction::End,
            },
            priority: r.priority,
        })
        .collect();

    SerializedLogic {
        metadata: LogicMetadata {
            question_count: questions.len(),
            rule_count: rules.len(),
            source_digest,
        },
        ids: interner.ids,
        questions,
        rules,
    }
}

// ---------------------------------------------------------------------------
// SerializedLogic -> SurveyLogic
// ---------------------------------------------------------------------------

fn serialized_to_logic(ser: SerializedLogic) -> Result<SurveyLogic, DeserializeError> {
    validate(&ser)?;

    let id = |slot: usize| QuestionId::new(ser.ids[slot].as_str());

    let questions: Vec<Question> = ser
        .questions
        .iter()
        .map(|q| Question {
            id: id(q.slot),
            order: q.order,
            is_required: q.required,
        })
        .collect();

    let rules: Vec<Rule> = ser
        .rules
        .iter()
        .map(|r| {
            let action = match r.action {
                SerializedAction::Show => LogicAction::Show,
                SerializedAction::Hide => LogicAction::Hide,
                SerializedAction::SkipTo(slot) => LogicAction::SkipTo(id(slot)),
                SerializedAction::End => LogicAction::End,
            };
            Rule::new(
                RuleId::new(r.id.as_str()),
                id(r.owner),
                Condition::new(id(r.source), deserialize_op(r.operator), r.value.as_str()),
                action,
                r.priority,
            )
        })
        .collect();

    Ok(SurveyLogic::unchecked(questions, rules))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedLogic) -> Result<(), DeserializeError> {
    let slot_count = ser.ids.len();

    // Metadata consistency
    if ser.metadata.question_count != ser.questions.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} questions but payload has {}",
            ser.metadata.question_count,
            ser.questions.len()
        )));
    }
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    // Slot bounds
    for question in &ser.questions {
        check_slot(question.slot, slot_count)?;
    }
    for rule in &ser.rules {
        check_slot(rule.owner, slot_count)?;
        check_slot(rule.source, slot_count)?;
        if let SerializedAction::SkipTo(target) = rule.action {
            check_slot(target, slot_count)?;
        }
    }

    // Rule ids are unique
    let mut seen = HashSet::new();
    for rule in &ser.rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "duplicate rule id '{}'",
                rule.id
            )));
        }
    }

    Ok(())
}

fn check_slot(slot: usize, slot_count: usize) -> Result<(), DeserializeError> {
    if slot >= slot_count {
        return Err(DeserializeError::Validation(format!(
            "question slot {slot} out of bounds (max {slot_count})"
        )));
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
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    logic: &SurveyLogic,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = logic_to_serialized(logic, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<SurveyLogic, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedLogic, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_logic(serialized)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
