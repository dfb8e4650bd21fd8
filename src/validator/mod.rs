//! Validator
//!
//! The orchestrator behind a `validate` call. Construction resolves the
//! caller's options into one of four dispatch modes: a single value checked
//! against a descriptor, a zipped list sharing one descriptor, a bag of
//! objects, or a single object whose keys name their own descriptors. The
//! traversal itself lives in the sibling modules: `dimension` walks the data
//! section, `scalar` checks leaf types, `refs` follows term and document
//! references.
//!
//! A validator instance is single-use state and not thread-safe; distinct
//! instances may run concurrently over one shared [`TermCache`].

mod dimension;
mod refs;
mod scalar;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{BatchOverlay, Lookup, TermCache};
use crate::config::DictionaryConfig;
use crate::error::{SetupError, StoreError, ValidateError};
use crate::report::{Report, StatusExtras};
use crate::status::StatusCode;
use crate::term::Term;

/// Shared cancellation signal, checked at every dimension boundary and
/// before every store call.
pub type CancelFlag = Arc<AtomicBool>;

/// Constructor options for a [`Validator`].
///
/// `new` takes the value to validate; everything else is opt-in. Invalid
/// combinations fail at [`build`](ValidatorOptions::build), never inside
/// `validate`.
#[derive(Debug)]
pub struct ValidatorOptions {
    value: Value,
    descriptor: Option<String>,
    zip: bool,
    use_cache: bool,
    cache_missing: bool,
    expect_terms: bool,
    expect_type: bool,
    resolve: bool,
    def_namespace: bool,
    resolver: Option<String>,
    batch: Option<BatchOverlay>,
    cancel: Option<CancelFlag>,
}

impl ValidatorOptions {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            descriptor: None,
            zip: false,
            use_cache: true,
            cache_missing: false,
            expect_terms: false,
            expect_type: false,
            resolve: false,
            def_namespace: false,
            resolver: None,
            batch: None,
            cancel: None,
        }
    }

    /// Validate against this descriptor term instead of reading descriptors
    /// from the value's own keys.
    pub fn descriptor(mut self, key: impl Into<String>) -> Self {
        self.descriptor = Some(key.into());
        self
    }

    /// Treat the value as a list of inputs all sharing the descriptor.
    pub fn zipped(mut self) -> Self {
        self.zip = true;
        self
    }

    pub fn use_cache(mut self, yes: bool) -> Self {
        self.use_cache = yes;
        self
    }

    /// Memoize store misses so repeat lookups short-circuit.
    pub fn cache_missing(mut self, yes: bool) -> Self {
        self.cache_missing = yes;
        self
    }

    /// In object mode, reject keys that resolve to no term.
    pub fn expect_terms(mut self, yes: bool) -> Self {
        self.expect_terms = yes;
        self
    }

    /// Reject scalar dimensions that declare no data type.
    pub fn expect_type(mut self, yes: bool) -> Self {
        self.expect_type = yes;
        self
    }

    /// Allow canonicalizing almost-correct values, logging each change.
    pub fn resolve(mut self, yes: bool) -> Self {
        self.resolve = yes;
        self
    }

    /// Accept the empty string for the namespace reference field.
    pub fn def_namespace(mut self, yes: bool) -> Self {
        self.def_namespace = yes;
        self
    }

    /// Code-section field probed during enumeration resolution. Defaults to
    /// the configured local-identifier field.
    pub fn resolver(mut self, field: impl Into<String>) -> Self {
        self.resolver = Some(field.into());
        self
    }

    /// Consult terms staged but not yet persisted.
    pub fn with_batch(mut self, batch: BatchOverlay) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn cancel_on(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Check the option combination and produce a validator.
    pub fn build(self, cache: TermCache) -> Result<Validator, SetupError> {
        if self.value.is_null() {
            return Err(SetupError::MissingValue);
        }
        if self.zip {
            if self.descriptor.is_none() {
                return Err(SetupError::ZipWithoutDescriptor);
            }
            if !self.value.is_array() {
                return Err(SetupError::ZipValueNotArray);
            }
        } else if self.descriptor.is_none() {
            let shape_ok = match &self.value {
                Value::Object(_) => true,
                Value::Array(items) => items.iter().all(|i| i.is_object()),
                _ => false,
            };
            if !shape_ok {
                return Err(SetupError::ValueNotValidatable);
            }
        }

        let config = cache.config().clone();
        let language = config.default_language.clone();
        let resolver = self
            .resolver
            .unwrap_or_else(|| config.local_identifier_field.clone());

        Ok(Validator {
            cache,
            config,
            value: self.value,
            descriptor: self.descriptor,
            zip: self.zip,
            use_cache: self.use_cache,
            cache_missing: self.cache_missing,
            expect_terms: self.expect_terms,
            expect_type: self.expect_type,
            resolve: self.resolve,
            def_namespace: self.def_namespace,
            resolver,
            batch: self.batch,
            cancel: self.cancel,
            report: Report::single(&language),
            language,
            cancelled: false,
        })
    }
}

/// Schema-driven validator over one value.
#[derive(Debug)]
pub struct Validator {
    cache: TermCache,
    config: Arc<DictionaryConfig>,
    value: Value,
    descriptor: Option<String>,
    zip: bool,
    use_cache: bool,
    cache_missing: bool,
    expect_terms: bool,
    expect_type: bool,
    resolve: bool,
    def_namespace: bool,
    resolver: String,
    batch: Option<BatchOverlay>,
    cancel: Option<CancelFlag>,
    report: Report,
    language: String,
    cancelled: bool,
}

impl Validator {
    /// Run the validation. Returns `true` iff every report slot is idle.
    ///
    /// Store failures stamp the open slot with the store-failure code and
    /// abort the whole call; cancellation stamps the open slot and returns
    /// the report as it stands.
    pub async fn validate(&mut self, language: Option<&str>) -> Result<bool, ValidateError> {
        self.language = language
            .map(|l| l.to_string())
            .unwrap_or_else(|| self.config.default_language.clone());
        self.cancelled = false;

        let mut value = std::mem::take(&mut self.value);
        let outcome = self.dispatch(&mut value).await;
        self.value = value;

        outcome?;
        Ok(self.report.is_ok())
    }

    /// The report produced by the last `validate` call.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The value, including any resolutions written into it.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    async fn dispatch(&mut self, value: &mut Value) -> Result<(), ValidateError> {
        if let Some(desc_key) = self.descriptor.clone() {
            return self.dispatch_descriptor(value, &desc_key).await;
        }
        match value {
            Value::Object(_) => {
                self.report = Report::single(&self.language);
                if let Err(e) = self.validate_object(value, None).await {
                    self.stamp_store_failure(None);
                    return Err(e.into());
                }
                Ok(())
            }
            Value::Array(_) => self.dispatch_bag(value).await,
            _ => Ok(()), // unreachable: build rejects other shapes
        }
    }

    /// Descriptor-driven modes: zipped list or single value.
    async fn dispatch_descriptor(
        &mut self,
        value: &mut Value,
        desc_key: &str,
    ) -> Result<(), ValidateError> {
        self.report = Report::single(&self.language);

        let term = match self.lookup_term(desc_key).await {
            Ok(term) => term,
            Err(e) => {
                self.stamp_store_failure(None);
                return Err(e.into());
            }
        };
        let Some(term) = term else {
            self.fail(
                StatusCode::UnknownTerm,
                Some(desc_key),
                Some(Value::String(desc_key.to_string())),
                None,
                StatusExtras::default(),
            );
            return Ok(());
        };
        let Some(section) = term.data.clone() else {
            self.fail(
                StatusCode::NotDescriptor,
                Some(desc_key),
                None,
                None,
                StatusExtras::default(),
            );
            return Ok(());
        };

        if self.zip {
            let len = value.as_array().map(|a| a.len()).unwrap_or(0);
            self.report = Report::per_index(len, &self.language);
            for index in 0..len {
                if self.cancelled {
                    break;
                }
                self.init_slot(desc_key, Some(index));
                let element = &mut value
                    .as_array_mut()
                    .expect("zip value shape checked at build")[index];
                if let Err(e) = self.walk(element, &term, &section, Some(index)).await {
                    self.stamp_store_failure(Some(index));
                    return Err(e.into());
                }
            }
        } else {
            self.init_slot(desc_key, None);
            if let Err(e) = self.walk(value, &term, &section, None).await {
                self.stamp_store_failure(None);
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Bag mode: a sequence of objects, one slot each.
    async fn dispatch_bag(&mut self, value: &mut Value) -> Result<(), ValidateError> {
        let len = value.as_array().map(|a| a.len()).unwrap_or(0);
        self.report = Report::per_index(len, &self.language);
        for index in 0..len {
            if self.cancelled {
                break;
            }
            let element = &mut value.as_array_mut().expect("bag shape checked")[index];
            if !element.is_object() {
                self.fail(
                    StatusCode::NotAnObject,
                    None,
                    Some(element.clone()),
                    Some(index),
                    StatusExtras::default(),
                );
                continue;
            }
            if let Err(e) = self.validate_object(element, Some(index)).await {
                self.stamp_store_failure(Some(index));
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Object mode: every key names its own descriptor term.
    async fn validate_object(
        &mut self,
        value: &mut Value,
        slot: Option<usize>,
    ) -> Result<(), StoreError> {
        let is_empty = value
            .as_object()
            .map(|m| m.is_empty())
            .expect("object shape checked");
        if is_empty {
            self.fail(
                StatusCode::EmptyObject,
                None,
                None,
                slot,
                StatusExtras::default(),
            );
            return Ok(());
        }

        let keys: Vec<String> = value
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        for key in keys {
            if self.check_cancel(slot) {
                return Ok(());
            }
            let term = match self.lookup_term(&key).await? {
                Some(term) => term,
                None => {
                    if self.expect_terms {
                        let offending = value.get(&key).cloned();
                        self.fail(
                            StatusCode::UnknownTerm,
                            Some(key.as_str()),
                            offending,
                            slot,
                            StatusExtras::default(),
                        );
                        return Ok(());
                    }
                    continue;
                }
            };
            let Some(section) = term.data.clone() else {
                self.fail(
                    StatusCode::NotDescriptor,
                    Some(key.as_str()),
                    value.get(&key).cloned(),
                    slot,
                    StatusExtras::default(),
                );
                return Ok(());
            };

            let element = value
                .as_object_mut()
                .and_then(|m| m.get_mut(&key))
                .expect("iterated key present");
            if !self.walk(element, &term, &section, slot).await? {
                return Ok(());
            }
        }
        Ok(())
    }

    // ── Shared helpers for the traversal modules ──

    /// Resolve a term key through the cache with this validator's flags.
    pub(crate) async fn lookup_term(&self, key: &str) -> Result<Option<Arc<Term>>, StoreError> {
        self.cache
            .get_term(
                key,
                Lookup {
                    use_cache: self.use_cache,
                    use_batch: self.batch.is_some(),
                    cache_missing: self.cache_missing,
                },
                self.batch.as_ref(),
            )
            .await
    }

    /// Write a status into a slot. Returns `true` iff the code is idle.
    pub(crate) fn fail(
        &mut self,
        code: StatusCode,
        descriptor: Option<&str>,
        value: Option<Value>,
        slot: Option<usize>,
        extras: StatusExtras,
    ) -> bool {
        self.report
            .set_status(code, &self.language, descriptor, value, slot, extras)
    }

    /// Observe the cancellation signal; on the first hit stamp the open slot.
    pub(crate) fn check_cancel(&mut self, slot: Option<usize>) -> bool {
        if self.cancelled {
            return true;
        }
        let hit = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if hit {
            self.cancelled = true;
            self.fail(
                StatusCode::Cancelled,
                self.descriptor.clone().as_deref(),
                None,
                slot,
                StatusExtras::default(),
            );
        }
        hit
    }

    fn init_slot(&mut self, descriptor: &str, slot: Option<usize>) {
        self.report.set_status(
            StatusCode::Ok,
            &self.language,
            Some(descriptor),
            None,
            slot,
            StatusExtras::default(),
        );
    }

    fn stamp_store_failure(&mut self, slot: Option<usize>) {
        self.fail(
            StatusCode::StoreFailure,
            self.descriptor.clone().as_deref(),
            None,
            slot,
            StatusExtras::default(),
        );
    }
}
