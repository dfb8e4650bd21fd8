//! Dimension interpreter
//!
//! Recursive walk over a descriptor's data section. Each level carries
//! exactly one dimension tag; the scalar dimension hands off to the type
//! primitives, the container dimensions recurse with the element schema.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::Validator;
use crate::config::DictionaryConfig;
use crate::error::StoreError;
use crate::report::StatusExtras;
use crate::status::StatusCode;
use crate::term::Term;

/// The dimension found at one data-section level, with its body.
pub(crate) enum Dimension<'a> {
    Scalar(&'a Value),
    Array(&'a Value),
    Set(&'a Value),
    Dict(&'a Value),
}

/// Resolve the one dimension tag of a section level. `None` when the level
/// carries zero or several tags, or a tag whose body is not an object.
pub(crate) fn classify<'a>(section: &'a Value, cfg: &DictionaryConfig) -> Option<Dimension<'a>> {
    let level = section.as_object()?;
    let mut found = None;
    let mut count = 0usize;
    type Ctor = for<'a> fn(&'a Value) -> Dimension<'a>;
    let scalar_ctor: Ctor = |v| Dimension::Scalar(v);
    let array_ctor: Ctor = |v| Dimension::Array(v);
    let set_ctor: Ctor = |v| Dimension::Set(v);
    let dict_ctor: Ctor = |v| Dimension::Dict(v);
    for (tag, ctor) in [
        (&cfg.scalar_tag, scalar_ctor),
        (&cfg.array_tag, array_ctor),
        (&cfg.set_tag, set_ctor),
        (&cfg.dict_tag, dict_ctor),
    ] {
        if let Some(body) = level.get(tag.as_str()) {
            count += 1;
            if body.is_object() {
                found = Some(ctor(body));
            } else {
                found = None;
            }
        }
    }
    if count == 1 {
        found
    } else {
        None
    }
}

impl Validator {
    /// Walk one data-section level against a value.
    ///
    /// Returns `Ok(true)` when the value conforms; `Ok(false)` after writing
    /// a finding into the slot. Boxed because container dimensions recurse.
    pub(crate) fn walk<'a>(
        &'a mut self,
        value: &'a mut Value,
        descriptor: &'a Arc<Term>,
        section: &'a Value,
        slot: Option<usize>,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            if self.check_cancel(slot) {
                return Ok(false);
            }
            let cfg = self.config.clone();
            let Some(dimension) = classify(section, &cfg) else {
                return Ok(self.fail(
                    StatusCode::ExpectingDataDimension,
                    Some(descriptor.key.as_str()),
                    None,
                    slot,
                    StatusExtras {
                        section: Some(section.clone()),
                        ..Default::default()
                    },
                ));
            };
            match dimension {
                Dimension::Scalar(body) => self.check_scalar(value, descriptor, body, slot).await,
                Dimension::Array(body) => {
                    self.check_sequence(value, descriptor, body, slot, false).await
                }
                Dimension::Set(body) => {
                    self.check_sequence(value, descriptor, body, slot, true).await
                }
                Dimension::Dict(body) => self.check_dict(value, descriptor, body, slot).await,
            }
        })
    }

    /// Array and set dimensions; `unique` adds the duplicate scan.
    async fn check_sequence(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
        unique: bool,
    ) -> Result<bool, StoreError> {
        let cfg = self.config.clone();
        if !value.is_array() {
            return Ok(self.fail(
                StatusCode::NotAnArray,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        let len = value.as_array().map(|a| a.len()).unwrap_or(0) as u64;
        if let Some(min) = body.get(&cfg.min_items_tag).and_then(|v| v.as_u64()) {
            if len < min {
                return Ok(self.fail(
                    StatusCode::ValueLowRange,
                    Some(descriptor.key.as_str()),
                    Some(value.clone()),
                    slot,
                    StatusExtras {
                        section: Some(body.clone()),
                        ..Default::default()
                    },
                ));
            }
        }
        if let Some(max) = body.get(&cfg.max_items_tag).and_then(|v| v.as_u64()) {
            if len > max {
                return Ok(self.fail(
                    StatusCode::ValueHighRange,
                    Some(descriptor.key.as_str()),
                    Some(value.clone()),
                    slot,
                    StatusExtras {
                        section: Some(body.clone()),
                        ..Default::default()
                    },
                ));
            }
        }

        if unique {
            let mut seen = HashSet::new();
            let duplicate = value
                .as_array()
                .into_iter()
                .flatten()
                .find(|elem| !seen.insert(elem.to_string()))
                .cloned();
            if let Some(dup) = duplicate {
                let parent = value.clone();
                let failed = self.fail(
                    StatusCode::DuplicateSetEntry,
                    Some(descriptor.key.as_str()),
                    Some(dup),
                    slot,
                    StatusExtras::default(),
                );
                self.report.attach_parent(parent, slot);
                return Ok(failed);
            }
        }

        let Some(element_section) = body.get(&cfg.elements_tag) else {
            return Ok(true);
        };
        let parent = value.clone();
        let items = value.as_array_mut().expect("sequence shape checked");
        for item in items.iter_mut() {
            if !self.walk(item, descriptor, element_section, slot).await? {
                if !self.cancelled {
                    self.report.attach_parent(parent.clone(), slot);
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Dict dimension: every entry's key against the key schema, every value
    /// against the value schema. Keys are checked as transient strings and
    /// never rewritten in place.
    async fn check_dict(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> Result<bool, StoreError> {
        let cfg = self.config.clone();
        if !value.is_object() {
            return Ok(self.fail(
                StatusCode::NotAnObject,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        let key_section = body.get(&cfg.dict_key_tag);
        let value_section = body.get(&cfg.dict_value_tag);
        let parent = value.clone();
        let keys: Vec<String> = value
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        for key in keys {
            if let Some(section) = key_section {
                let mut probe = Value::String(key.clone());
                if !self.walk(&mut probe, descriptor, section, slot).await? {
                    if !self.cancelled {
                        self.report.attach_parent(parent.clone(), slot);
                    }
                    return Ok(false);
                }
            }
            if let Some(section) = value_section {
                let entry = value
                    .as_object_mut()
                    .and_then(|m| m.get_mut(&key))
                    .expect("iterated key present");
                if !self.walk(entry, descriptor, section, slot).await? {
                    if !self.cancelled {
                        self.report.attach_parent(parent.clone(), slot);
                    }
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}
