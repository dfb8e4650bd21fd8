//! Dictionary configuration
//!
//! Names every in-store field tag the validator references. All names are
//! read from this structure at startup; nothing in the traversal hard-codes
//! a tag. The defaults match the canonical dictionary layout, so most
//! deployments construct the config with `DictionaryConfig::default()` and
//! override the handful of tags their store renames.

use serde::{Deserialize, Serialize};

/// Field tags and store names consumed by the cache and the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Collection holding term documents; prefix of a term handle.
    pub terms_collection: String,
    /// Predicate on edges that carry an enumeration path.
    pub enum_predicate: String,

    /// Term section holding the data shape (descriptor role).
    pub section_data: String,
    /// Term section holding cross-field rules (structure role).
    pub section_rule: String,
    /// Term section holding identifier codes; never projected.
    pub section_code: String,

    /// Dimension tags. Exactly one must appear at each data-section level.
    pub scalar_tag: String,
    pub array_tag: String,
    pub set_tag: String,
    pub dict_tag: String,

    /// Element schema inside an array or set dimension.
    pub elements_tag: String,
    /// Key and value schemas inside a dict dimension.
    pub dict_key_tag: String,
    pub dict_value_tag: String,
    /// Cardinality bounds on array and set dimensions.
    pub min_items_tag: String,
    pub max_items_tag: String,

    /// Scalar qualifiers.
    pub type_tag: String,
    pub range_tag: String,
    pub regexp_tag: String,
    pub kind_tag: String,

    /// Range bound tags.
    pub min_inclusive_tag: String,
    pub min_exclusive_tag: String,
    pub max_inclusive_tag: String,
    pub max_exclusive_tag: String,

    /// Kind wildcard options.
    pub kind_any_term: String,
    pub kind_any_enum: String,
    pub kind_any_descriptor: String,
    pub kind_any_object: String,

    /// Descriptor key of the namespace reference field.
    pub namespace_field: String,
    /// Reserved key of the default namespace term; never a valid reference.
    pub default_namespace_key: String,
    /// Code-section field probed by default when resolving enumeration codes.
    pub local_identifier_field: String,

    /// Language used when a caller passes none or an unknown one.
    pub default_language: String,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            terms_collection: "terms".to_string(),
            enum_predicate: "_predicate_enum-of".to_string(),

            section_data: "_data".to_string(),
            section_rule: "_rule".to_string(),
            section_code: "_code".to_string(),

            scalar_tag: "_scalar".to_string(),
            array_tag: "_array".to_string(),
            set_tag: "_set".to_string(),
            dict_tag: "_dict".to_string(),

            elements_tag: "_elements".to_string(),
            dict_key_tag: "_dict-key".to_string(),
            dict_value_tag: "_dict-value".to_string(),
            min_items_tag: "_min-items".to_string(),
            max_items_tag: "_max-items".to_string(),

            type_tag: "_type".to_string(),
            range_tag: "_valid-range".to_string(),
            regexp_tag: "_regexp".to_string(),
            kind_tag: "_kind".to_string(),

            min_inclusive_tag: "_min-range-inclusive".to_string(),
            min_exclusive_tag: "_min-range-exclusive".to_string(),
            max_inclusive_tag: "_max-range-inclusive".to_string(),
            max_exclusive_tag: "_max-range-exclusive".to_string(),

            kind_any_term: "_any-term".to_string(),
            kind_any_enum: "_any-enum".to_string(),
            kind_any_descriptor: "_any-descriptor".to_string(),
            kind_any_object: "_any-object".to_string(),

            namespace_field: "_nid".to_string(),
            default_namespace_key: ":".to_string(),
            local_identifier_field: "_lid".to_string(),

            default_language: "en".to_string(),
        }
    }
}

impl DictionaryConfig {
    /// Handle of a term document, `collection/key`.
    pub fn term_handle(&self, key: &str) -> String {
        format!("{}/{}", self.terms_collection, key)
    }
}
