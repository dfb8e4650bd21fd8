//! Reference qualifiers
//!
//! Leaf checks that follow references out of the value: term keys with kind
//! constraints, document handles, and enumeration membership with the
//! code-resolution fallback.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::Validator;
use crate::error::StoreError;
use crate::report::StatusExtras;
use crate::status::StatusCode;
use crate::term::Term;

impl Validator {
    /// `key` scalar: the value must reference an existing term and satisfy
    /// at least one declared kind.
    pub(crate) async fn check_key(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> Result<bool, StoreError> {
        let cfg = self.config.clone();
        let store = self.cache.store().clone();

        let Some(key) = value.as_str().map(|s| s.to_string()) else {
            return Ok(self.fail(
                StatusCode::BadKeyValue,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        };

        if key.is_empty() {
            // The empty reference means "the default namespace"; only the
            // namespace field may carry it, and only when enabled.
            if self.def_namespace && descriptor.key == cfg.namespace_field {
                return Ok(true);
            }
            return Ok(self.fail(
                StatusCode::EmptyKey,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        if key == cfg.default_namespace_key {
            return Ok(self.fail(
                StatusCode::NoRefDefaultNamespace,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        if !store.is_valid_key_value(&key) {
            return Ok(self.fail(
                StatusCode::BadKeyValue,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        if self.check_cancel(slot) {
            return Ok(false);
        }
        let Some(term) = self.lookup_term(&key).await? else {
            return Ok(self.fail(
                StatusCode::UnknownTerm,
                Some(descriptor.key.as_str()),
                Some(Value::String(key)),
                slot,
                StatusExtras::default(),
            ));
        };

        if let Some(kinds) = body.get(&cfg.kind_tag) {
            return Ok(self.check_kinds(&term, kinds, descriptor, &key, slot));
        }
        Ok(true)
    }

    /// Evaluate the kind qualifier list; at least one option must accept
    /// the resolved term. The last recorded failure becomes the report.
    fn check_kinds(
        &mut self,
        term: &Term,
        kinds: &Value,
        descriptor: &Arc<Term>,
        key: &str,
        slot: Option<usize>,
    ) -> bool {
        let cfg = self.config.clone();
        let Some(options) = kinds.as_array() else {
            return self.fail(
                StatusCode::NotArrayDataKind,
                Some(descriptor.key.as_str()),
                Some(kinds.clone()),
                slot,
                StatusExtras::default(),
            );
        };
        if options.is_empty() {
            return true;
        }

        let mut last_failure = None;
        for option in options {
            let Some(word) = option.as_str() else {
                return self.fail(
                    StatusCode::InvalidDataKindOption,
                    Some(descriptor.key.as_str()),
                    Some(option.clone()),
                    slot,
                    StatusExtras::default(),
                );
            };
            if word == cfg.kind_any_term {
                return true;
            }
            if word == cfg.kind_any_enum {
                if term.is_enumeration() {
                    return true;
                }
                last_failure = Some(StatusCode::NotEnum);
            } else if word == cfg.kind_any_descriptor {
                if term.is_descriptor() {
                    return true;
                }
                last_failure = Some(StatusCode::NotDescriptor);
            } else if word == cfg.kind_any_object {
                if term.is_structure() {
                    return true;
                }
                last_failure = Some(StatusCode::NotStructureDefinition);
            } else {
                // Any other word names an enumeration type explicitly.
                if term.belongs_to(word) {
                    return true;
                }
                last_failure = Some(StatusCode::NotCorrectEnumType);
            }
        }

        let code = last_failure.unwrap_or(StatusCode::InvalidDataKindOption);
        self.fail(
            code,
            Some(descriptor.key.as_str()),
            Some(Value::String(key.to_string())),
            slot,
            StatusExtras::default(),
        )
    }

    /// `handle` scalar: `collection/key` naming an existing document.
    pub(crate) async fn check_handle(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        slot: Option<usize>,
    ) -> Result<bool, StoreError> {
        let store = self.cache.store().clone();

        let Some(handle) = value.as_str().map(|s| s.to_string()) else {
            return Ok(self.fail(
                StatusCode::BadHandleValue,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        };
        let Some((collection, doc_key)) = handle.split_once('/') else {
            return Ok(self.fail(
                StatusCode::BadHandleValue,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        };

        if !store.is_valid_collection_name(collection) {
            return Ok(self.fail(
                StatusCode::BadCollectionName,
                Some(descriptor.key.as_str()),
                Some(Value::String(collection.to_string())),
                slot,
                StatusExtras::default(),
            ));
        }
        if self.check_cancel(slot) {
            return Ok(false);
        }
        if !self.cache.collection_exists(collection).await? {
            return Ok(self.fail(
                StatusCode::UnknownCollection,
                Some(descriptor.key.as_str()),
                Some(Value::String(collection.to_string())),
                slot,
                StatusExtras::default(),
            ));
        }
        if !store.is_valid_key_value(doc_key) {
            return Ok(self.fail(
                StatusCode::BadKeyValue,
                Some(descriptor.key.as_str()),
                Some(Value::String(doc_key.to_string())),
                slot,
                StatusExtras::default(),
            ));
        }
        if self.check_cancel(slot) {
            return Ok(false);
        }
        if !self.cache.document_exists(collection, doc_key).await? {
            return Ok(self.fail(
                StatusCode::UnknownDocument,
                Some(descriptor.key.as_str()),
                Some(Value::String(handle.clone())),
                slot,
                StatusExtras::default(),
            ));
        }
        Ok(true)
    }

    /// `enum` scalar: the value must name an enumeration element of one of
    /// the declared types; under `resolve`, unknown values fall back to the
    /// code search and are rewritten to the canonical key on a unique match.
    pub(crate) async fn check_enum(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> Result<bool, StoreError> {
        let cfg = self.config.clone();
        let store = self.cache.store().clone();

        let Some(code) = value.as_str().map(|s| s.to_string()) else {
            return Ok(self.fail(
                StatusCode::NotString,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        };
        if !store.is_valid_key_value(&code) {
            return Ok(self.fail(
                StatusCode::BadKeyValue,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        // The enumeration types this descriptor admits.
        let Some(kinds_value) = body.get(&cfg.kind_tag) else {
            return Ok(self.fail(
                StatusCode::NotArrayDataKind,
                Some(descriptor.key.as_str()),
                None,
                slot,
                StatusExtras {
                    section: Some(body.clone()),
                    ..Default::default()
                },
            ));
        };
        let Some(kind_items) = kinds_value.as_array() else {
            return Ok(self.fail(
                StatusCode::NotArrayDataKind,
                Some(descriptor.key.as_str()),
                Some(kinds_value.clone()),
                slot,
                StatusExtras::default(),
            ));
        };
        let mut kinds = Vec::with_capacity(kind_items.len());
        for item in kind_items {
            let Some(word) = item.as_str() else {
                return Ok(self.fail(
                    StatusCode::InvalidDataKindOption,
                    Some(descriptor.key.as_str()),
                    Some(item.clone()),
                    slot,
                    StatusExtras::default(),
                ));
            };
            kinds.push(word.to_string());
        }

        if self.check_cancel(slot) {
            return Ok(false);
        }
        if let Some(term) = self.lookup_term(&code).await? {
            if !term.is_enumeration() {
                return Ok(self.fail(
                    StatusCode::NotEnum,
                    Some(descriptor.key.as_str()),
                    Some(Value::String(code)),
                    slot,
                    StatusExtras::default(),
                ));
            }
            if kinds.iter().any(|kind| term.belongs_to(kind)) {
                return Ok(true);
            }
            return Ok(self.fail(
                StatusCode::NotCorrectEnumType,
                Some(descriptor.key.as_str()),
                Some(Value::String(code)),
                slot,
                StatusExtras::default(),
            ));
        }

        if self.resolve {
            let resolver = self.resolver.clone();
            let probe = Value::String(code.clone());
            for kind in &kinds {
                if self.check_cancel(slot) {
                    return Ok(false);
                }
                let matches = self
                    .cache
                    .query_enum_identifier_by_code(&resolver, &probe, kind)
                    .await?;
                match matches.len() {
                    0 => continue,
                    1 => {
                        let canonical = matches.into_iter().next().expect("one match");
                        let original = value.clone();
                        *value = Value::String(canonical.clone());
                        self.report
                            .log_resolution(&descriptor.key, &original, value.clone(), slot);
                        info!(
                            descriptor = %descriptor.key,
                            code = %code,
                            term = %canonical,
                            "resolved enumeration code"
                        );
                        return Ok(true);
                    }
                    n => {
                        // Graph corruption: one code maps to several elements
                        // of the same type. Leave the value alone.
                        warn!(
                            descriptor = %descriptor.key,
                            code = %code,
                            enum_type = %kind,
                            matches = n,
                            "ambiguous enumeration code"
                        );
                        continue;
                    }
                }
            }
        }

        Ok(self.fail(
            StatusCode::UnknownTerm,
            Some(descriptor.key.as_str()),
            Some(Value::String(code)),
            slot,
            StatusExtras::default(),
        ))
    }
}
