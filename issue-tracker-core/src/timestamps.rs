//! Creation/update stamps applied to every document right before it is written.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::db::Fields;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Stamp `fields` with the current UTC time.
///
/// New documents get both `created_at` and `updated_at`; updates only get
/// `updated_at`, leaving any existing `created_at` alone.
pub fn add_timestamps(fields: Fields, is_update: bool) -> Fields {
    add_timestamps_at(fields, is_update, Utc::now())
}

pub fn add_timestamps_at(mut fields: Fields, is_update: bool, now: DateTime<Utc>) -> Fields {
    let stamp = Value::String(format_timestamp(now));
    if !is_update {
        fields.insert(CREATED_AT.to_string(), stamp.clone());
    }
    fields.insert(UPDATED_AT.to_string(), stamp);
    fields
}

/// ISO-8601 with an explicit `+00:00` offset.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

pub fn now_iso() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creation_sets_equal_stamps() {
        let fields = add_timestamps(Fields::new(), false);

        assert_eq!(fields[CREATED_AT], fields[UPDATED_AT]);
        let stamp = fields[CREATED_AT].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
        assert!(stamp.ends_with("+00:00"));
    }

    #[test]
    fn update_keeps_created_at() {
        let mut fields = Fields::new();
        fields.insert(CREATED_AT.into(), json!("2024-01-01T00:00:00.000000+00:00"));

        let fields = add_timestamps(fields, true);

        assert_eq!(fields[CREATED_AT], json!("2024-01-01T00:00:00.000000+00:00"));
        assert_ne!(fields[UPDATED_AT], fields[CREATED_AT]);
    }

    #[test]
    fn update_does_not_invent_created_at() {
        let fields = add_timestamps(Fields::new(), true);
        assert!(!fields.contains_key(CREATED_AT));
        assert!(fields.contains_key(UPDATED_AT));
    }
}
