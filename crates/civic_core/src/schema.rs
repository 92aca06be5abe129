use crate::error::CivicError;
use crate::geo::Coordinate;
use crate::scoring::PriorityTier;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Fixed-width UTC timestamp, e.g. `2025-06-01T12:00:00.000Z`. The fixed
/// width keeps lexical order equal to time order inside SQLite.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
}

pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, CivicError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|source| CivicError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdeaCategory {
    Sport,
    Art,
    Ecology,
    Infrastructure,
    Education,
    Culture,
    Other,
}

impl IdeaCategory {
    pub const ALL: [IdeaCategory; 7] = [
        IdeaCategory::Sport,
        IdeaCategory::Art,
        IdeaCategory::Ecology,
        IdeaCategory::Infrastructure,
        IdeaCategory::Education,
        IdeaCategory::Culture,
        IdeaCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaCategory::Sport => "sport",
            IdeaCategory::Art => "art",
            IdeaCategory::Ecology => "ecology",
            IdeaCategory::Infrastructure => "infrastructure",
            IdeaCategory::Education => "education",
            IdeaCategory::Culture => "culture",
            IdeaCategory::Other => "other",
        }
    }
}

impl fmt::Display for IdeaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaCategory {
    type Err = CivicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IdeaCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| CivicError::UnknownCategory(value.to_string()))
    }
}

/// Lifecycle: new -> under_review -> approved -> in_progress -> completed,
/// with rejected reachable from anything before completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    New,
    UnderReview,
    Approved,
    InProgress,
    Completed,
    Rejected,
}

impl IdeaStatus {
    pub const ALL: [IdeaStatus; 6] = [
        IdeaStatus::New,
        IdeaStatus::UnderReview,
        IdeaStatus::Approved,
        IdeaStatus::InProgress,
        IdeaStatus::Completed,
        IdeaStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::New => "new",
            IdeaStatus::UnderReview => "under_review",
            IdeaStatus::Approved => "approved",
            IdeaStatus::InProgress => "in_progress",
            IdeaStatus::Completed => "completed",
            IdeaStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IdeaStatus::Completed | IdeaStatus::Rejected)
    }

    /// Ideas still moving through the pipeline.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            IdeaStatus::New | IdeaStatus::UnderReview | IdeaStatus::InProgress
        )
    }

    fn stage(&self) -> Option<u8> {
        match self {
            IdeaStatus::New => Some(0),
            IdeaStatus::UnderReview => Some(1),
            IdeaStatus::Approved => Some(2),
            IdeaStatus::InProgress => Some(3),
            IdeaStatus::Completed => Some(4),
            IdeaStatus::Rejected => None,
        }
    }

    pub fn can_transition_to(&self, next: IdeaStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage(), next.stage()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, _) => false,
        }
    }

    /// Checks a transition; `moderation_override` skips the lifecycle rules.
    pub fn transition(&self, next: IdeaStatus, moderation_override: bool) -> Result<IdeaStatus, CivicError> {
        if moderation_override || self.can_transition_to(next) {
            return Ok(next);
        }
        Err(CivicError::InvalidTransition {
            from: self.to_string(),
            to: next.to_string(),
        })
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = CivicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IdeaStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| CivicError::UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = CivicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            _ => Err(CivicError::UnknownVoteDirection(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InfraCondition {
    Poor,
    Average,
    Good,
    #[default]
    Unknown,
}

impl InfraCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfraCondition::Poor => "poor",
            InfraCondition::Average => "average",
            InfraCondition::Good => "good",
            InfraCondition::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InfraCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfraCondition {
    type Err = CivicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "poor" => Ok(InfraCondition::Poor),
            "average" => Ok(InfraCondition::Average),
            "good" => Ok(InfraCondition::Good),
            "unknown" => Ok(InfraCondition::Unknown),
            _ => Err(CivicError::UnknownCondition(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub points: i64,
    pub is_active: bool,
    pub is_verified: bool,
    pub chat_id: Option<String>,  // chat-bot handle for direct messages
    pub created_at: String,       // ISO-8601 timestamp (UTC)
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewUser {
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: IdeaCategory,
    pub status: IdeaStatus,
    pub location: Coordinate,
    pub address: Option<String>,
    pub author_id: String,
    pub votes_count: u32,
    pub comments_count: u32,
    pub duplicate_count: u32,
    // derived scores, unset until the idea is first prioritized
    pub importance_score: Option<f64>,
    pub infrastructure_deficit: Option<f64>,
    pub social_weight: Option<f64>,
    pub priority: Option<PriorityTier>,
    pub photo_urls: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// A resident's submission before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    /// Left empty to let the categorizer decide.
    pub category: Option<IdeaCategory>,
    pub location: Coordinate,
    pub address: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

impl NewIdea {
    pub fn validate(&self) -> Result<(), CivicError> {
        let title_len = self.title.trim().chars().count();
        if !(5..=500).contains(&title_len) {
            return Err(CivicError::invalid_input(
                "title",
                format!("length {title_len} outside 5..=500"),
            ));
        }
        let description_len = self.description.trim().chars().count();
        if description_len < 10 {
            return Err(CivicError::invalid_input(
                "description",
                format!("length {description_len} shorter than 10"),
            ));
        }
        self.location.validate("location")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Vote {
    pub id: String,
    pub idea_id: String,
    pub voter_id: String,
    pub direction: VoteDirection,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
    pub id: String,
    pub idea_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: String,
}

/// Reference data consumed by the infrastructure factor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InfrastructureObject {
    pub id: String,
    pub kind: String, // e.g. "football_field", "playground", "bench"
    pub location: Coordinate,
    #[serde(default)]
    pub condition: InfraCondition,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in IdeaCategory::ALL {
            assert_eq!(category.as_str().parse::<IdeaCategory>().unwrap(), category);
        }
        assert!(matches!(
            "parks".parse::<IdeaCategory>(),
            Err(CivicError::UnknownCategory(_))
        ));
    }

    #[test]
    fn status_moves_forward_only() {
        assert!(IdeaStatus::New.can_transition_to(IdeaStatus::UnderReview));
        assert!(IdeaStatus::New.can_transition_to(IdeaStatus::Approved));
        assert!(IdeaStatus::InProgress.can_transition_to(IdeaStatus::Completed));
        assert!(!IdeaStatus::Approved.can_transition_to(IdeaStatus::New));
        assert!(!IdeaStatus::Approved.can_transition_to(IdeaStatus::Approved));
    }

    #[test]
    fn rejection_allowed_until_completed() {
        assert!(IdeaStatus::New.can_transition_to(IdeaStatus::Rejected));
        assert!(IdeaStatus::InProgress.can_transition_to(IdeaStatus::Rejected));
        assert!(!IdeaStatus::Completed.can_transition_to(IdeaStatus::Rejected));
        assert!(!IdeaStatus::Rejected.can_transition_to(IdeaStatus::New));
    }

    #[test]
    fn moderation_override_bypasses_lifecycle() {
        assert!(IdeaStatus::Completed.transition(IdeaStatus::UnderReview, false).is_err());
        assert_eq!(
            IdeaStatus::Completed
                .transition(IdeaStatus::UnderReview, true)
                .unwrap(),
            IdeaStatus::UnderReview
        );
    }

    #[test]
    fn new_idea_validation() {
        let mut draft = NewIdea {
            title: "New skate park".to_string(),
            description: "A skate park next to the school stadium".to_string(),
            category: None,
            location: Coordinate::new(53.99, 86.66),
            address: None,
            photo_urls: Vec::new(),
        };
        assert!(draft.validate().is_ok());

        draft.title = "Park".to_string();
        assert!(draft.validate().is_err());

        draft.title = "Skate park".to_string();
        draft.description = "short".to_string();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn timestamps_are_fixed_width_utc() {
        use time::macros::datetime;

        let at = datetime!(2025-03-04 05:06:07.25 +03:00);
        let formatted = format_timestamp(at).unwrap();
        assert_eq!(formatted, "2025-03-04T02:06:07.250Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), at);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(CivicError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn condition_defaults_to_unknown_when_absent() {
        let object: InfrastructureObject = serde_json::from_str(
            r#"{"id":"o1","kind":"bench","location":{"latitude":1.0,"longitude":2.0},"name":null}"#,
        )
        .unwrap();
        assert_eq!(object.condition, InfraCondition::Unknown);
    }
}
