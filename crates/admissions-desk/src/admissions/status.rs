use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Canonical lifecycle state of an application.
///
/// Any state may move to any other through an explicit operator action; the
/// client does not restrict transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Processing,
    Accepted,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Processing, Status::Accepted, Status::Rejected];

    /// Wire token sent to and expected from the API.
    pub const fn token(self) -> &'static str {
        match self {
            Status::Processing => "PROCESSING",
            Status::Accepted => "ACCEPTED",
            Status::Rejected => "REJECTED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Status::Processing => "Processing",
            Status::Accepted => "Accepted",
            Status::Rejected => "Rejected",
        }
    }

    pub const fn hint(self) -> &'static str {
        match self {
            Status::Processing => "In review",
            Status::Accepted => "Approved",
            Status::Rejected => "Not approved",
        }
    }

    /// Map any raw status string onto a canonical state. Never fails: missing,
    /// blank, and unrecognised values all become [`Status::Processing`].
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(recognize).unwrap_or_default()
    }

    /// Same as [`Status::normalize`] for an arbitrary JSON value.
    pub fn normalize_value(raw: &Value) -> Self {
        match raw {
            Value::String(text) => Self::normalize(Some(text)),
            Value::Null => Self::default(),
            other => Self::normalize(Some(&other.to_string())),
        }
    }
}

fn recognize(raw: &str) -> Option<Status> {
    let token = raw.trim().to_uppercase();
    match token.as_str() {
        "PROCESSING" => Some(Status::Processing),
        "ACCEPTED" => Some(Status::Accepted),
        "REJECTED" => Some(Status::Rejected),
        "PENDING" | "IN_REVIEW" => Some(Status::Processing),
        "APPROVED" => Some(Status::Accepted),
        "DECLINED" | "DENIED" => Some(Status::Rejected),
        _ => None,
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Strict parse used for operator input: canonical tokens and known synonyms are
/// accepted case-insensitively, anything else is an error.
impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        recognize(raw).ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}' (expected PROCESSING, ACCEPTED or REJECTED)")]
pub struct UnknownStatus(pub String);

/// Reading a status off the wire always normalizes.
impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Status::normalize_value(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn synonym_table_maps_onto_canonical_states() {
        assert_eq!(Status::normalize(Some("pending")), Status::Processing);
        assert_eq!(Status::normalize(Some("in_review")), Status::Processing);
        assert_eq!(Status::normalize(Some("Approved")), Status::Accepted);
        assert_eq!(Status::normalize(Some("DENIED")), Status::Rejected);
        assert_eq!(Status::normalize(Some("declined")), Status::Rejected);
        assert_eq!(Status::normalize(Some("accepted")), Status::Accepted);
        assert_eq!(Status::normalize(Some("  Rejected \n")), Status::Rejected);
    }

    #[test]
    fn missing_or_blank_defaults_to_processing() {
        assert_eq!(Status::normalize(None), Status::Processing);
        assert_eq!(Status::normalize(Some("")), Status::Processing);
        assert_eq!(Status::normalize(Some("   ")), Status::Processing);
        assert_eq!(Status::normalize_value(&Value::Null), Status::Processing);
    }

    #[test]
    fn normalizer_is_total() {
        let inputs = [
            json!("archived"),
            json!("ACCEPTED_LATE"),
            json!(42),
            json!(true),
            json!(["ACCEPTED"]),
            json!({ "status": "ACCEPTED" }),
            json!("ünïcödé"),
        ];
        for raw in inputs {
            let status = Status::normalize_value(&raw);
            assert!(Status::ALL.contains(&status), "{raw} produced {status:?}");
            assert_eq!(status, Status::Processing, "{raw} is not recognised");
        }
    }

    #[test]
    fn deserialization_normalizes_legacy_tokens() {
        let parsed: Vec<Status> =
            serde_json::from_value(json!(["approved", null, "weird", "Denied"]))
                .expect("statuses deserialize");
        assert_eq!(
            parsed,
            vec![
                Status::Accepted,
                Status::Processing,
                Status::Processing,
                Status::Rejected
            ]
        );
    }

    #[test]
    fn serializes_canonical_tokens() {
        let encoded = serde_json::to_value(Status::ALL).expect("serializes");
        assert_eq!(encoded, json!(["PROCESSING", "ACCEPTED", "REJECTED"]));
    }

    #[test]
    fn strict_parse_rejects_unknown_tokens() {
        assert_eq!("approved".parse::<Status>(), Ok(Status::Accepted));
        assert_eq!(
            "acceptd".parse::<Status>(),
            Err(UnknownStatus("acceptd".to_string()))
        );
    }
}
