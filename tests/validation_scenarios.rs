//! End-to-end validation scenarios over the in-memory dictionary.
//!
//! Seeds a small dictionary (boolean, ranged integer, timestamp and
//! enumeration descriptors plus one codelist) and drives the validator
//! through every dispatch mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use datadict_core::{
    change_digest, DictionaryConfig, MemoryDictionary, StatusCode, TermCache, ValidateError,
    ValidatorOptions,
};

async fn fixture() -> (Arc<MemoryDictionary>, TermCache) {
    let config = Arc::new(DictionaryConfig::default());
    let store = Arc::new(MemoryDictionary::new(config.clone()));

    store
        .insert_term("D1", None, Some(json!({ "_scalar": { "_type": "boolean" } })), None)
        .await;
    store
        .insert_term(
            "D2",
            None,
            Some(json!({
                "_scalar": {
                    "_type": "integer",
                    "_valid-range": {
                        "_min-range-inclusive": 0,
                        "_max-range-inclusive": 10
                    }
                }
            })),
            None,
        )
        .await;
    store
        .insert_term("D3", None, Some(json!({ "_scalar": { "_type": "timestamp" } })), None)
        .await;
    store
        .insert_term(
            "D4",
            None,
            Some(json!({ "_scalar": { "_type": "enum", "_kind": ["TYPE_COLOR"] } })),
            None,
        )
        .await;
    store
        .insert_term("color_red", Some(json!({ "_lid": "red" })), None, None)
        .await;
    store.insert_enum_edge("color_red", &["TYPE_COLOR"]).await;
    store
        .insert_term("color_blue", Some(json!({ "_lid": "blue" })), None, None)
        .await;
    store.insert_enum_edge("color_blue", &["TYPE_COLOR"]).await;

    let cache = TermCache::isolated(store.clone(), config);
    (store, cache)
}

fn single_slot(validator: &datadict_core::Validator) -> &datadict_core::ReportSlot {
    validator.report().slot(None)
}

// ── Scenario 1: boolean happy path ──

#[tokio::test]
async fn boolean_value_passes_untouched() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!(true))
        .descriptor("D1")
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(single_slot(&validator).status.code, 0);
    assert_eq!(single_slot(&validator).descriptor, "D1");
    assert_eq!(validator.value(), &json!(true));
}

// ── Scenario 2: integer out of range ──

#[tokio::test]
async fn integer_above_range_reports_high_with_section() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!(11))
        .descriptor("D2")
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    let slot = single_slot(&validator);
    assert_eq!(slot.status.code, StatusCode::ValueHighRange.code());
    assert_eq!(slot.value, Some(json!(11)));
    assert_eq!(
        slot.section,
        Some(json!({
            "_min-range-inclusive": 0,
            "_max-range-inclusive": 10
        }))
    );
}

// ── Scenario 3: timestamp resolution ──

#[tokio::test]
async fn timestamp_string_resolves_to_epoch_millis() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!("1970-01-01T00:00:00Z"))
        .descriptor("D3")
        .resolve(true)
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!(0));

    let slot = single_slot(&validator);
    let key = change_digest("D3", &json!("1970-01-01T00:00:00Z"));
    let change = slot.changes.get(&key).expect("resolution logged");
    assert_eq!(change.field, "D3");
    assert_eq!(change.original, json!("1970-01-01T00:00:00Z"));
    assert_eq!(change.resolved, json!(0));
}

// ── Scenario 4: enumeration code fallback ──

#[tokio::test]
async fn enum_code_falls_back_to_code_search() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!("red"))
        .descriptor("D4")
        .resolve(true)
        .resolver("_lid")
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!("color_red"));
    assert_eq!(single_slot(&validator).changes.len(), 1);
}

#[tokio::test]
async fn enum_canonical_key_passes_without_rewrite() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!("color_red"))
        .descriptor("D4")
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!("color_red"));
    assert!(single_slot(&validator).changes.is_empty());
}

#[tokio::test]
async fn enum_without_resolve_stays_unknown() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!("red"))
        .descriptor("D4")
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    assert_eq!(
        single_slot(&validator).status.code,
        StatusCode::UnknownTerm.code()
    );
    assert_eq!(validator.value(), &json!("red"));
}

// ── Scenario 5: object with unknown descriptor, strict mode ──

#[tokio::test]
async fn strict_object_mode_rejects_unknown_descriptors() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!({ "D_NOPE": 1 }))
        .expect_terms(true)
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    let slot = single_slot(&validator);
    assert_eq!(slot.status.code, StatusCode::UnknownTerm.code());
    assert_eq!(slot.descriptor, "D_NOPE");
}

#[tokio::test]
async fn lenient_object_mode_skips_unknown_descriptors() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!({ "D_NOPE": 1, "D1": true }))
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
}

// ── Scenario 6: zipped list with one bad element ──

#[tokio::test]
async fn zipped_list_isolates_the_failing_slot() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!([3, 11, 7]))
        .descriptor("D2")
        .zipped()
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    let report = validator.report();
    assert_eq!(report.slot(Some(0)).status.code, 0);
    assert_eq!(
        report.slot(Some(1)).status.code,
        StatusCode::ValueHighRange.code()
    );
    assert_eq!(report.slot(Some(2)).status.code, 0);
}

// ── Property: validation without resolve is pure ──

#[tokio::test]
async fn validation_without_resolve_is_pure() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!("1970-01-01T00:00:00Z"))
        .descriptor("D3")
        .build(cache)
        .unwrap();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!("1970-01-01T00:00:00Z"));
    let first = validator.report().clone();

    assert!(validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!("1970-01-01T00:00:00Z"));
    assert_eq!(validator.report(), &first);
}

// ── Property: ambiguous codes leave the value unchanged ──

#[tokio::test]
async fn ambiguous_enum_code_is_not_rewritten() {
    let (store, cache) = fixture().await;
    // A second element of the same type answering to the same code.
    store
        .insert_term("color_crimson", Some(json!({ "_lid": "red" })), None, None)
        .await;
    store.insert_enum_edge("color_crimson", &["TYPE_COLOR"]).await;

    let mut validator = ValidatorOptions::new(json!("red"))
        .descriptor("D4")
        .resolve(true)
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    assert_eq!(validator.value(), &json!("red"));
    assert_eq!(
        single_slot(&validator).status.code,
        StatusCode::UnknownTerm.code()
    );
}

// ── Bag mode ──

#[tokio::test]
async fn bag_mode_validates_each_object_independently() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!([
        { "D1": true },
        { "D1": 5 },
        { "D2": 7 }
    ]))
    .build(cache)
    .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    let report = validator.report();
    assert_eq!(report.slot(Some(0)).status.code, 0);
    assert_eq!(
        report.slot(Some(1)).status.code,
        StatusCode::NotBoolean.code()
    );
    assert_eq!(report.slot(Some(2)).status.code, 0);
}

// ── First error wins inside a slot ──

#[tokio::test]
async fn first_failing_element_decides_the_slot() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_LIST",
            None,
            Some(json!({
                "_array": {
                    "_elements": { "_scalar": { "_type": "integer" } }
                }
            })),
            None,
        )
        .await;

    let mut validator = ValidatorOptions::new(json!([1, "x", true]))
        .descriptor("D_LIST")
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    let slot = single_slot(&validator);
    assert_eq!(slot.status.code, StatusCode::NotInteger.code());
    assert_eq!(slot.value, Some(json!("x")));
    assert_eq!(slot.parent_value, Some(json!([1, "x", true])));
}

// ── Set dimension ──

#[tokio::test]
async fn sets_enforce_cardinality_and_uniqueness() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_SET",
            None,
            Some(json!({
                "_set": {
                    "_elements": { "_scalar": { "_type": "integer" } },
                    "_min-items": 1,
                    "_max-items": 4
                }
            })),
            None,
        )
        .await;

    let mut ok = ValidatorOptions::new(json!([1, 2, 3]))
        .descriptor("D_SET")
        .build(cache.clone())
        .unwrap();
    assert!(ok.validate(None).await.unwrap());

    let mut empty = ValidatorOptions::new(json!([]))
        .descriptor("D_SET")
        .build(cache.clone())
        .unwrap();
    assert!(!empty.validate(None).await.unwrap());
    assert_eq!(
        empty.report().slot(None).status.code,
        StatusCode::ValueLowRange.code()
    );

    let mut dup = ValidatorOptions::new(json!([1, 2, 2]))
        .descriptor("D_SET")
        .build(cache)
        .unwrap();
    assert!(!dup.validate(None).await.unwrap());
    let slot = dup.report().slot(None);
    assert_eq!(slot.status.code, StatusCode::DuplicateSetEntry.code());
    assert_eq!(slot.value, Some(json!(2)));
}

// ── Dict dimension ──

#[tokio::test]
async fn dict_checks_keys_and_values() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_DICT",
            None,
            Some(json!({
                "_dict": {
                    "_dict-key": { "_scalar": { "_type": "string" } },
                    "_dict-value": { "_scalar": { "_type": "number" } }
                }
            })),
            None,
        )
        .await;

    let mut ok = ValidatorOptions::new(json!({ "a": 1, "b": 2.5 }))
        .descriptor("D_DICT")
        .build(cache.clone())
        .unwrap();
    assert!(ok.validate(None).await.unwrap());

    let mut bad = ValidatorOptions::new(json!({ "a": 1, "b": "two" }))
        .descriptor("D_DICT")
        .build(cache)
        .unwrap();
    assert!(!bad.validate(None).await.unwrap());
    let slot = bad.report().slot(None);
    assert_eq!(slot.status.code, StatusCode::NotNumber.code());
    assert_eq!(slot.value, Some(json!("two")));
    assert!(slot.parent_value.is_some());
}

// ── Handle qualifier ──

#[tokio::test]
async fn handles_are_checked_step_by_step() {
    let (store, cache) = fixture().await;
    store
        .insert_term("D_DOC", None, Some(json!({ "_scalar": { "_type": "handle" } })), None)
        .await;
    store.insert_document("clients", "c-1").await;

    let run = |value: Value, cache: TermCache| async move {
        let mut validator = ValidatorOptions::new(value)
            .descriptor("D_DOC")
            .build(cache)
            .unwrap();
        validator.validate(None).await.unwrap();
        validator.report().slot(None).status.code
    };

    assert_eq!(run(json!("clients/c-1"), cache.clone()).await, 0);
    assert_eq!(
        run(json!("no-slash"), cache.clone()).await,
        StatusCode::BadHandleValue.code()
    );
    assert_eq!(
        run(json!("bad name/c-1"), cache.clone()).await,
        StatusCode::BadCollectionName.code()
    );
    assert_eq!(
        run(json!("missing/c-1"), cache.clone()).await,
        StatusCode::UnknownCollection.code()
    );
    assert_eq!(
        run(json!("clients/does not exist"), cache.clone()).await,
        StatusCode::BadKeyValue.code()
    );
    assert_eq!(
        run(json!("clients/c-2"), cache).await,
        StatusCode::UnknownDocument.code()
    );
}

// ── Key qualifier with kinds ──

#[tokio::test]
async fn key_kinds_accept_on_first_satisfied_option() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_REF",
            None,
            Some(json!({ "_scalar": { "_type": "key", "_kind": ["_any-descriptor"] } })),
            None,
        )
        .await;

    let mut ok = ValidatorOptions::new(json!("D1"))
        .descriptor("D_REF")
        .build(cache.clone())
        .unwrap();
    assert!(ok.validate(None).await.unwrap());

    // color_red resolves but carries no data section.
    let mut not_desc = ValidatorOptions::new(json!("color_red"))
        .descriptor("D_REF")
        .build(cache.clone())
        .unwrap();
    assert!(!not_desc.validate(None).await.unwrap());
    assert_eq!(
        not_desc.report().slot(None).status.code,
        StatusCode::NotDescriptor.code()
    );

    let mut unknown = ValidatorOptions::new(json!("nope"))
        .descriptor("D_REF")
        .build(cache.clone())
        .unwrap();
    assert!(!unknown.validate(None).await.unwrap());
    assert_eq!(
        unknown.report().slot(None).status.code,
        StatusCode::UnknownTerm.code()
    );

    let mut empty = ValidatorOptions::new(json!(""))
        .descriptor("D_REF")
        .build(cache)
        .unwrap();
    assert!(!empty.validate(None).await.unwrap());
    assert_eq!(
        empty.report().slot(None).status.code,
        StatusCode::EmptyKey.code()
    );
}

// ── Schema defects surface as negative codes ──

#[tokio::test]
async fn schema_defects_report_negative_codes() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_TWO_DIMS",
            None,
            Some(json!({ "_scalar": {}, "_array": { "_elements": {} } })),
            None,
        )
        .await;
    store
        .insert_term("D_NO_TYPE", None, Some(json!({ "_scalar": {} })), None)
        .await;

    let mut two = ValidatorOptions::new(json!(1))
        .descriptor("D_TWO_DIMS")
        .build(cache.clone())
        .unwrap();
    assert!(!two.validate(None).await.unwrap());
    assert_eq!(
        two.report().slot(None).status.code,
        StatusCode::ExpectingDataDimension.code()
    );

    let mut untyped = ValidatorOptions::new(json!(1))
        .descriptor("D_NO_TYPE")
        .expect_type(true)
        .build(cache.clone())
        .unwrap();
    assert!(!untyped.validate(None).await.unwrap());
    assert_eq!(
        untyped.report().slot(None).status.code,
        StatusCode::MissingScalarType.code()
    );

    // Without the strictness flag an untyped scalar accepts anything.
    let mut lenient = ValidatorOptions::new(json!(1))
        .descriptor("D_NO_TYPE")
        .build(cache)
        .unwrap();
    assert!(lenient.validate(None).await.unwrap());
}

#[tokio::test]
async fn unsupported_type_tags_are_reported() {
    let (store, cache) = fixture().await;
    store
        .insert_term("D_ODD", None, Some(json!({ "_scalar": { "_type": "uuid" } })), None)
        .await;

    let mut validator = ValidatorOptions::new(json!("x"))
        .descriptor("D_ODD")
        .build(cache)
        .unwrap();
    assert!(!validator.validate(None).await.unwrap());
    let slot = single_slot(&validator);
    assert_eq!(slot.status.code, StatusCode::Unsupported.code());
    assert_eq!(slot.value, Some(json!("uuid")));
}

// ── String qualifiers ──

#[tokio::test]
async fn strings_check_pattern_then_range() {
    let (store, cache) = fixture().await;
    store
        .insert_term(
            "D_CODE",
            None,
            Some(json!({
                "_scalar": {
                    "_type": "string",
                    "_regexp": "^[a-z]+$",
                    "_valid-range": {
                        "_min-range-inclusive": "aa",
                        "_max-range-exclusive": "zz"
                    }
                }
            })),
            None,
        )
        .await;

    let mut ok = ValidatorOptions::new(json!("kite"))
        .descriptor("D_CODE")
        .build(cache.clone())
        .unwrap();
    assert!(ok.validate(None).await.unwrap());

    let mut pattern = ValidatorOptions::new(json!("Kite"))
        .descriptor("D_CODE")
        .build(cache.clone())
        .unwrap();
    assert!(!pattern.validate(None).await.unwrap());
    let slot = pattern.report().slot(None);
    assert_eq!(slot.status.code, StatusCode::NoMatchRegexp.code());
    assert_eq!(slot.regexp.as_deref(), Some("^[a-z]+$"));

    let mut low = ValidatorOptions::new(json!("a"))
        .descriptor("D_CODE")
        .build(cache)
        .unwrap();
    assert!(!low.validate(None).await.unwrap());
    assert_eq!(
        low.report().slot(None).status.code,
        StatusCode::ValueLowRange.code()
    );
}

// ── Unknown descriptor / non-descriptor at the top ──

#[tokio::test]
async fn unknown_and_non_descriptor_terms_fail_up_front() {
    let (_store, cache) = fixture().await;

    let mut unknown = ValidatorOptions::new(json!(1))
        .descriptor("D_MISSING")
        .build(cache.clone())
        .unwrap();
    assert!(!unknown.validate(None).await.unwrap());
    assert_eq!(
        unknown.report().slot(None).status.code,
        StatusCode::UnknownTerm.code()
    );

    let mut not_descriptor = ValidatorOptions::new(json!(1))
        .descriptor("color_red")
        .build(cache)
        .unwrap();
    assert!(!not_descriptor.validate(None).await.unwrap());
    assert_eq!(
        not_descriptor.report().slot(None).status.code,
        StatusCode::NotDescriptor.code()
    );
}

// ── Cancellation ──

#[tokio::test]
async fn cancellation_stamps_the_open_slot() {
    let (_store, cache) = fixture().await;
    let flag = Arc::new(AtomicBool::new(true));

    let mut validator = ValidatorOptions::new(json!(true))
        .descriptor("D1")
        .cancel_on(flag.clone())
        .build(cache)
        .unwrap();

    assert!(!validator.validate(None).await.unwrap());
    assert_eq!(
        single_slot(&validator).status.code,
        StatusCode::Cancelled.code()
    );

    flag.store(false, Ordering::Relaxed);
    assert!(validator.validate(None).await.unwrap());
}

// ── Store failures are fatal ──

struct BrokenStore;

#[async_trait::async_trait]
impl datadict_core::StoreAdapter for BrokenStore {
    async fn fetch_term(
        &self,
        _key: &str,
    ) -> Result<Option<datadict_core::TermFetch>, datadict_core::StoreError> {
        Err(datadict_core::StoreError::Backend("connection reset".into()))
    }

    async fn query_by_code(
        &self,
        _field: &str,
        _value: &Value,
        _enum_type: &str,
    ) -> Result<Vec<String>, datadict_core::StoreError> {
        Err(datadict_core::StoreError::Backend("connection reset".into()))
    }

    async fn document_exists(
        &self,
        _collection: &str,
        _key: &str,
    ) -> Result<bool, datadict_core::StoreError> {
        Err(datadict_core::StoreError::Backend("connection reset".into()))
    }

    async fn collection_exists(&self, _name: &str) -> Result<bool, datadict_core::StoreError> {
        Err(datadict_core::StoreError::Backend("connection reset".into()))
    }
}

#[tokio::test]
async fn store_failure_aborts_and_stamps_the_slot() {
    let config = Arc::new(DictionaryConfig::default());
    let cache = TermCache::isolated(Arc::new(BrokenStore), config);

    let mut validator = ValidatorOptions::new(json!(true))
        .descriptor("D1")
        .build(cache)
        .unwrap();

    let err = validator.validate(None).await.unwrap_err();
    assert!(matches!(err, ValidateError::Store(_)));
    assert_eq!(
        single_slot(&validator).status.code,
        StatusCode::StoreFailure.code()
    );
}

// ── Localization ──

#[tokio::test]
async fn messages_localize_with_default_fallback() {
    let (_store, cache) = fixture().await;

    let mut italian = ValidatorOptions::new(json!(1))
        .descriptor("D1")
        .build(cache.clone())
        .unwrap();
    assert!(!italian.validate(Some("it")).await.unwrap());
    assert_eq!(
        italian.report().slot(None).status.message,
        "Il valore non è un booleano."
    );

    let mut fallback = ValidatorOptions::new(json!(1))
        .descriptor("D1")
        .build(cache)
        .unwrap();
    assert!(!fallback.validate(Some("xx")).await.unwrap());
    assert_eq!(
        fallback.report().slot(None).status.message,
        "The value is not a boolean."
    );
}

// ── Report serialization ──

#[tokio::test]
async fn reports_serialize_to_the_outbound_shape() {
    let (_store, cache) = fixture().await;
    let mut validator = ValidatorOptions::new(json!([3, 11]))
        .descriptor("D2")
        .zipped()
        .build(cache)
        .unwrap();
    validator.validate(None).await.unwrap();

    let outbound = validator.report().to_value();
    let slots = outbound.as_array().expect("indexed report");
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["status"]["code"], json!(0));
    assert_eq!(slots[1]["status"]["code"], json!(StatusCode::ValueHighRange.code()));
    assert!(slots[0].get("value").is_none());
    assert_eq!(slots[1]["value"], json!(11));
}
