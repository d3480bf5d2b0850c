//! Local wall-clock timestamps used at the user-facing edges.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::TrackError;

/// Format of full local timestamps: `YYYY-MM-DD HH:MM:SS`.
pub const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a UTC instant as a local `YYYY-MM-DD HH:MM:SS` string.
pub fn format_local(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format(LOCAL_FORMAT)
        .to_string()
}

/// Parses a user-supplied time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`, and `HH:MM:SS` or
/// `HH:MM` on the local date of `today`.
pub fn parse_time_input(input: &str, today: NaiveDate) -> Result<DateTime<Utc>, TrackError> {
    let input = input.trim();
    for format in [LOCAL_FORMAT, "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local_to_utc(naive);
        }
    }
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(input, format) {
            return local_to_utc(today.and_time(time));
        }
    }
    Err(TrackError::validation(
        "time",
        format!("unrecognized time {input:?} (use HH:MM, HH:MM:SS, or YYYY-MM-DD HH:MM:SS)"),
    ))
}

/// Parses a full local `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_local(input: &str) -> Result<DateTime<Utc>, TrackError> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), LOCAL_FORMAT).map_err(|err| {
        TrackError::validation("time", format!("{input:?} is not YYYY-MM-DD HH:MM:SS: {err}"))
    })?;
    local_to_utc(naive)
}

/// Converts a local wall-clock time to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times
/// skipped by a DST spring-forward are rejected.
pub fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>, TrackError> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(TrackError::validation(
            "time",
            format!("{naive} does not exist in the local time zone"),
        )),
    }
}

/// Serde adapter for `DateTime<Utc>` fields written as local timestamps.
pub mod local_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_local(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_local(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional fields.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&super::super::format_local(*value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.filter(|s| !s.trim().is_empty())
                .map(|s| super::super::parse_local(&s))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
