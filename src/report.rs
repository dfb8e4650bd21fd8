//! Validation reports
//!
//! A report is a single slot or one slot per input index. Slots carry a
//! status, the offending value when a check fails, and a change log of the
//! substitutions made while resolving almost-correct values. Writing an
//! error into a slot replaces the slot wholesale, change log included: once
//! a value fails, its earlier resolutions no longer describe a valid value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::status::{Status, StatusCode};

/// One substitution performed during value resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueResolution {
    pub field: String,
    pub original: Value,
    pub resolved: Value,
}

/// Optional attachments set alongside an error status.
#[derive(Debug, Clone, Default)]
pub struct StatusExtras {
    /// The schema fragment the value violated (range, dimension body).
    pub section: Option<Value>,
    /// The pattern a string failed to match.
    pub regexp: Option<String>,
}

/// Report entry for one logical input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSlot {
    pub status: Status,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub descriptor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<String, ValueResolution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_value: Option<Value>,
}

impl ReportSlot {
    fn idle(language: &str) -> Self {
        Self {
            status: Status::new(StatusCode::Ok, language),
            descriptor: String::new(),
            value: None,
            changes: BTreeMap::new(),
            section: None,
            regexp: None,
            parent_value: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// Stable 128-bit digest keying a resolution entry: first sixteen bytes of
/// `sha256(descriptor ‖ 0x00 ‖ json(original))`, hex encoded.
pub fn change_digest(descriptor: &str, original: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(descriptor.as_bytes());
    hasher.update([0u8]);
    hasher.update(original.to_string().as_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

/// Either one slot or an indexed sequence of slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report {
    Single(Box<ReportSlot>),
    PerIndex(Vec<ReportSlot>),
}

impl Report {
    pub fn single(language: &str) -> Self {
        Report::Single(Box::new(ReportSlot::idle(language)))
    }

    pub fn per_index(len: usize, language: &str) -> Self {
        Report::PerIndex(vec![ReportSlot::idle(language); len])
    }

    /// `true` iff every slot carries the idle code.
    pub fn is_ok(&self) -> bool {
        match self {
            Report::Single(slot) => slot.is_ok(),
            Report::PerIndex(slots) => slots.iter().all(|s| s.is_ok()),
        }
    }

    pub fn slot(&self, index: Option<usize>) -> &ReportSlot {
        match (self, index) {
            (Report::Single(slot), _) => slot,
            (Report::PerIndex(slots), Some(i)) => &slots[i],
            (Report::PerIndex(slots), None) => &slots[0],
        }
    }

    fn slot_mut(&mut self, index: Option<usize>) -> &mut ReportSlot {
        match (self, index) {
            (Report::Single(slot), _) => slot,
            (Report::PerIndex(slots), Some(i)) => &mut slots[i],
            (Report::PerIndex(slots), None) => &mut slots[0],
        }
    }

    /// Write a fresh slot. The idle code resets the slot; any other code
    /// replaces it, discarding whatever the slot carried. Returns `true`
    /// iff the written code is the idle one.
    pub fn set_status(
        &mut self,
        code: StatusCode,
        language: &str,
        descriptor: Option<&str>,
        value: Option<Value>,
        index: Option<usize>,
        extras: StatusExtras,
    ) -> bool {
        let slot = self.slot_mut(index);
        *slot = ReportSlot {
            status: Status::new(code, language),
            descriptor: descriptor.unwrap_or_default().to_string(),
            value,
            changes: BTreeMap::new(),
            section: extras.section,
            regexp: extras.regexp,
            parent_value: None,
        };
        code.is_ok()
    }

    /// Record a value substitution on the slot's change log.
    ///
    /// Keyed by the digest of `(descriptor, original)`, so logging the same
    /// substitution twice is a no-op. Must precede any error write to the
    /// slot: an error replaces the slot and the log with it.
    pub fn log_resolution(
        &mut self,
        descriptor: &str,
        original: &Value,
        resolved: Value,
        index: Option<usize>,
    ) {
        let key = change_digest(descriptor, original);
        let slot = self.slot_mut(index);
        slot.changes.entry(key).or_insert_with(|| ValueResolution {
            field: descriptor.to_string(),
            original: original.clone(),
            resolved,
        });
    }

    /// Attach the enclosing container to a failed slot. The closest
    /// enclosing container wins; outer levels leave an existing attachment
    /// in place.
    pub fn attach_parent(&mut self, parent: Value, index: Option<usize>) {
        let slot = self.slot_mut(index);
        if slot.parent_value.is_none() {
            slot.parent_value = Some(parent);
        }
    }

    /// Outbound serialization of the report.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("report serialization")
    }
}
