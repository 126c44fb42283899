use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::status::Status;

/// Identifier assigned by the API. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl ApplicationId {
    /// Validate an identifier taken from a route or command line before any
    /// request is issued.
    pub fn parse(raw: &str) -> Result<Self, InvalidApplicationId> {
        match raw.trim().parse::<u64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(InvalidApplicationId {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid application id '{raw}'")]
pub struct InvalidApplicationId {
    pub raw: String,
}

/// Application record as owned by the remote API. Status is normalized on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub grade_level: String,
    pub applicant_name: String,
    pub gender: Gender,
    #[serde(default, deserialize_with = "deserialize_activities")]
    pub activities: Vec<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn deserialize_activities<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub const fn token(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownOption;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|gender| gender.token().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownOption::new("gender", raw))
    }
}

/// Grade levels offered by the admissions office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GradeLevel(u8);

impl GradeLevel {
    pub const MIN: u8 = 6;
    pub const MAX: u8 = 13;

    pub fn new(grade: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&grade).then_some(Self(grade))
    }

    pub fn all() -> impl Iterator<Item = GradeLevel> {
        (Self::MIN..=Self::MAX).map(GradeLevel)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("Grade {}", self.0)
    }
}

impl Default for GradeLevel {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grade {}", self.0)
    }
}

/// Accepts either the full label ("Grade 10") or the bare number ("10").
impl FromStr for GradeLevel {
    type Err = UnknownOption;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let number = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("grade"))
            .map(|_| trimmed[5..].trim())
            .unwrap_or(trimmed);

        number
            .parse::<u8>()
            .ok()
            .and_then(GradeLevel::new)
            .ok_or_else(|| UnknownOption::new("grade level", raw))
    }
}

/// Extracurricular activities an applicant may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Sports,
    Music,
    Art,
    Drama,
    Robotics,
    Chess,
}

impl Activity {
    pub const ALL: [Activity; 6] = [
        Activity::Sports,
        Activity::Music,
        Activity::Art,
        Activity::Drama,
        Activity::Robotics,
        Activity::Chess,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Activity::Sports => "Sports",
            Activity::Music => "Music",
            Activity::Art => "Art",
            Activity::Drama => "Drama",
            Activity::Robotics => "Robotics",
            Activity::Chess => "Chess",
        }
    }
}

impl FromStr for Activity {
    type Err = UnknownOption;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Activity::ALL
            .into_iter()
            .find(|activity| activity.label().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownOption::new("activity", raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownOption {
    pub field: &'static str,
    pub value: String,
}

impl UnknownOption {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Toggle set of selected activities. Selecting a present entry removes it,
/// selecting an absent one appends it; duplicates never occur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySet {
    selected: Vec<String>,
}

impl ActivitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an API record, dropping any duplicate entries it carried.
    pub fn from_selected<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for item in items {
            let item = item.into();
            if !set.contains(&item) {
                set.selected.push(item);
            }
        }
        set
    }

    /// Returns `true` when the activity is selected after the toggle.
    pub fn toggle(&mut self, activity: impl Into<String>) -> bool {
        let activity = activity.into();
        match self.selected.iter().position(|entry| *entry == activity) {
            Some(index) => {
                self.selected.remove(index);
                false
            }
            None => {
                self.selected.push(activity);
                true
            }
        }
    }

    pub fn contains(&self, activity: &str) -> bool {
        self.selected.iter().any(|entry| entry == activity)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.selected.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_ids_must_be_positive_integers() {
        assert_eq!(ApplicationId::parse("42"), Ok(ApplicationId(42)));
        assert_eq!(ApplicationId::parse(" 7 "), Ok(ApplicationId(7)));
        for raw in ["0", "-3", "abc", "", "4.5", "12a"] {
            assert_eq!(
                ApplicationId::parse(raw),
                Err(InvalidApplicationId {
                    raw: raw.to_string()
                }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn grade_level_accepts_label_or_number() {
        assert_eq!("Grade 10".parse::<GradeLevel>().map(GradeLevel::number), Ok(10));
        assert_eq!("grade 6".parse::<GradeLevel>().map(GradeLevel::number), Ok(6));
        assert_eq!("13".parse::<GradeLevel>().map(GradeLevel::number), Ok(13));
        assert!("Grade 5".parse::<GradeLevel>().is_err());
        assert!("14".parse::<GradeLevel>().is_err());
        assert_eq!(GradeLevel::all().count(), 8);
        assert_eq!(GradeLevel::default().label(), "Grade 10");
    }

    #[test]
    fn activity_toggle_removes_reselected_entries() {
        let mut activities = ActivitySet::new();
        assert!(activities.toggle("Music"));
        assert!(activities.toggle("Art"));
        assert!(!activities.toggle("Music"));
        assert_eq!(activities.as_slice(), ["Art".to_string()]);
    }

    #[test]
    fn activity_set_never_holds_duplicates() {
        let mut activities = ActivitySet::from_selected(["Chess", "Chess", "Drama"]);
        assert_eq!(activities.as_slice(), ["Chess".to_string(), "Drama".to_string()]);
        activities.toggle(Activity::Sports.label());
        activities.toggle(Activity::Sports.label());
        activities.toggle(Activity::Sports.label());
        let sports = activities
            .as_slice()
            .iter()
            .filter(|entry| entry.as_str() == "Sports")
            .count();
        assert_eq!(sports, 1);
    }

    #[test]
    fn application_deserializes_loose_api_payload() {
        let record: Application = serde_json::from_value(json!({
            "id": 3,
            "grade_level": "Grade 8",
            "applicant_name": "Ana Smith",
            "gender": "FEMALE",
            "activities": null,
            "status": "approved",
            "image": null,
            "created_at": "2025-09-24T10:00:00.123456Z",
            "updated_at": "2025-09-24T10:00:00+05:30"
        }))
        .expect("record deserializes");

        assert_eq!(record.id, ApplicationId(3));
        assert_eq!(record.status, Status::Accepted);
        assert!(record.activities.is_empty());
        assert!(record.image.is_none());
        assert!(record.document.is_none());
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn application_without_status_is_processing() {
        let record: Application = serde_json::from_value(json!({
            "id": 9,
            "grade_level": "Grade 12",
            "applicant_name": "Bob",
            "gender": "MALE",
            "activities": ["Chess"]
        }))
        .expect("record deserializes");
        assert_eq!(record.status, Status::Processing);
    }
}
