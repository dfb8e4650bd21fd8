//! Scalar type primitives
//!
//! Leaf checks of the dimension walk: exact type tests, then the range and
//! pattern qualifiers the scalar section declares. Every check is total and
//! reports through the slot, never by panicking.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::info;

use super::Validator;
use crate::config::DictionaryConfig;
use crate::error::StoreError;
use crate::report::StatusExtras;
use crate::status::StatusCode;
use crate::term::{ScalarType, Term};

/// The value side of a range comparison.
pub(crate) enum Probe<'a> {
    Num(f64),
    Str(&'a str),
}

pub(crate) enum RangeCheck {
    Ok,
    NotAnObject,
    Low,
    High,
}

/// Evaluate a range object against a probe.
///
/// Bound order: inclusive minimum, exclusive minimum, inclusive maximum,
/// exclusive maximum. Bounds of a different type than the probe are ignored.
pub(crate) fn evaluate_range(
    range: &Value,
    probe: &Probe<'_>,
    cfg: &DictionaryConfig,
) -> RangeCheck {
    let Some(bounds) = range.as_object() else {
        return RangeCheck::NotAnObject;
    };

    let lt = |bound: &Value| match probe {
        Probe::Num(p) => bound.as_f64().map(|b| *p < b),
        Probe::Str(s) => bound.as_str().map(|b| *s < b),
    };
    let le = |bound: &Value| match probe {
        Probe::Num(p) => bound.as_f64().map(|b| *p <= b),
        Probe::Str(s) => bound.as_str().map(|b| *s <= b),
    };
    let gt = |bound: &Value| match probe {
        Probe::Num(p) => bound.as_f64().map(|b| *p > b),
        Probe::Str(s) => bound.as_str().map(|b| *s > b),
    };
    let ge = |bound: &Value| match probe {
        Probe::Num(p) => bound.as_f64().map(|b| *p >= b),
        Probe::Str(s) => bound.as_str().map(|b| *s >= b),
    };

    if let Some(bound) = bounds.get(&cfg.min_inclusive_tag) {
        if lt(bound) == Some(true) {
            return RangeCheck::Low;
        }
    }
    if let Some(bound) = bounds.get(&cfg.min_exclusive_tag) {
        if le(bound) == Some(true) {
            return RangeCheck::Low;
        }
    }
    if let Some(bound) = bounds.get(&cfg.max_inclusive_tag) {
        if gt(bound) == Some(true) {
            return RangeCheck::High;
        }
    }
    if let Some(bound) = bounds.get(&cfg.max_exclusive_tag) {
        if ge(bound) == Some(true) {
            return RangeCheck::High;
        }
    }
    RangeCheck::Ok
}

/// Interpret a string as an instant, in milliseconds since the epoch.
///
/// Accepts RFC 3339, a plain `Y-m-d H:M:S` or `Y-m-dTH:M:S`, and a bare
/// date taken as midnight UTC.
pub(crate) fn parse_timestamp_ms(text: &str) -> Option<i64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    None
}

impl Validator {
    /// Scalar dimension: reject sequences, then dispatch on the declared
    /// type tag.
    pub(crate) async fn check_scalar(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> Result<bool, StoreError> {
        let cfg = self.config.clone();

        if value.is_array() {
            return Ok(self.fail(
                StatusCode::NotScalar,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            ));
        }

        let Some(type_tag) = body.get(&cfg.type_tag) else {
            if self.expect_type {
                return Ok(self.fail(
                    StatusCode::MissingScalarType,
                    Some(descriptor.key.as_str()),
                    None,
                    slot,
                    StatusExtras {
                        section: Some(body.clone()),
                        ..Default::default()
                    },
                ));
            }
            return Ok(true);
        };

        let declared = match type_tag.as_str().and_then(ScalarType::parse) {
            Some(ty) => ty,
            None => {
                return Ok(self.fail(
                    StatusCode::Unsupported,
                    Some(descriptor.key.as_str()),
                    Some(type_tag.clone()),
                    slot,
                    StatusExtras::default(),
                ));
            }
        };

        match declared {
            ScalarType::Boolean => Ok(self.check_boolean(value, descriptor, slot)),
            ScalarType::Integer => Ok(self.check_integer(value, descriptor, body, slot)),
            ScalarType::Number => Ok(self.check_number(value, descriptor, body, slot)),
            ScalarType::Timestamp => Ok(self.check_timestamp(value, descriptor, body, slot)),
            ScalarType::String => Ok(self.check_string(value, descriptor, body, slot)),
            ScalarType::Key => self.check_key(value, descriptor, body, slot).await,
            ScalarType::Handle => self.check_handle(value, descriptor, slot).await,
            ScalarType::Enum => self.check_enum(value, descriptor, body, slot).await,
            // Reserved for future extension.
            ScalarType::Date | ScalarType::Struct | ScalarType::Object | ScalarType::GeoJson => {
                Ok(true)
            }
        }
    }

    fn check_boolean(
        &mut self,
        value: &Value,
        descriptor: &Arc<Term>,
        slot: Option<usize>,
    ) -> bool {
        if value.is_boolean() {
            return true;
        }
        self.fail(
            StatusCode::NotBoolean,
            Some(descriptor.key.as_str()),
            Some(value.clone()),
            slot,
            StatusExtras::default(),
        )
    }

    fn check_integer(
        &mut self,
        value: &Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> bool {
        if value.as_i64().is_none() && value.as_u64().is_none() {
            return self.fail(
                StatusCode::NotInteger,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            );
        }
        let probe = value.as_f64().unwrap_or_default();
        self.apply_range(body, Probe::Num(probe), descriptor, value.clone(), slot)
    }

    fn check_number(
        &mut self,
        value: &Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> bool {
        let Some(probe) = value.as_f64() else {
            return self.fail(
                StatusCode::NotNumber,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            );
        };
        self.apply_range(body, Probe::Num(probe), descriptor, value.clone(), slot)
    }

    /// Numbers pass as milliseconds; strings must parse as an instant and,
    /// under `resolve`, are rewritten in place to the numeric form with the
    /// substitution logged.
    fn check_timestamp(
        &mut self,
        value: &mut Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> bool {
        if let Some(ms) = value.as_f64() {
            return self.apply_range(body, Probe::Num(ms), descriptor, value.clone(), slot);
        }

        let Some(text) = value.as_str().map(|s| s.to_string()) else {
            return self.fail(
                StatusCode::NotTimestamp,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            );
        };
        let Some(ms) = parse_timestamp_ms(&text) else {
            return self.fail(
                StatusCode::NotTimestamp,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            );
        };

        if self.resolve {
            let original = value.clone();
            *value = Value::from(ms);
            self.report
                .log_resolution(&descriptor.key, &original, value.clone(), slot);
            info!(
                descriptor = %descriptor.key,
                original = %text,
                resolved = ms,
                "resolved timestamp string"
            );
        }
        self.apply_range(body, Probe::Num(ms as f64), descriptor, Value::from(ms), slot)
    }

    fn check_string(
        &mut self,
        value: &Value,
        descriptor: &Arc<Term>,
        body: &Value,
        slot: Option<usize>,
    ) -> bool {
        let cfg = self.config.clone();
        let Some(text) = value.as_str() else {
            return self.fail(
                StatusCode::NotString,
                Some(descriptor.key.as_str()),
                Some(value.clone()),
                slot,
                StatusExtras::default(),
            );
        };

        if let Some(pattern) = body.get(&cfg.regexp_tag).and_then(|p| p.as_str()) {
            let matched = Regex::new(pattern).map(|re| re.is_match(text));
            if !matched.unwrap_or(false) {
                let pattern = pattern.to_string();
                return self.fail(
                    StatusCode::NoMatchRegexp,
                    Some(descriptor.key.as_str()),
                    Some(value.clone()),
                    slot,
                    StatusExtras {
                        regexp: Some(pattern),
                        ..Default::default()
                    },
                );
            }
        }

        let probe = text.to_string();
        self.apply_range(body, Probe::Str(&probe), descriptor, value.clone(), slot)
    }

    /// Range qualifier, when the section carries one.
    fn apply_range(
        &mut self,
        body: &Value,
        probe: Probe<'_>,
        descriptor: &Arc<Term>,
        reported: Value,
        slot: Option<usize>,
    ) -> bool {
        let cfg = self.config.clone();
        let Some(range) = body.get(&cfg.range_tag) else {
            return true;
        };
        let code = match evaluate_range(range, &probe, &cfg) {
            RangeCheck::Ok => return true,
            RangeCheck::NotAnObject => StatusCode::RangeNotAnObject,
            RangeCheck::Low => StatusCode::ValueLowRange,
            RangeCheck::High => StatusCode::ValueHighRange,
        };
        self.fail(
            code,
            Some(descriptor.key.as_str()),
            Some(reported),
            slot,
            StatusExtras {
                section: Some(range.clone()),
                ..Default::default()
            },
        )
    }
}
