//! Core Data Models
//!
//! This module defines the values that flow out of the ingestion pipeline.
//!
//! ## Core Types
//!
//! - [`EventRecord`] - One decoded, deduplicated event from a JSON Lines source
//! - [`ActionType`] - Closed set of action categories carried by the `type` tag
//!
//! Records are immutable once built. Presentation concerns such as mapping a
//! product name onto a chart slot are left to consumers; a record only carries
//! the raw product name and the full UTC instant.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Launch,
    Signin,
    Resume,
    View,
    Metric,
    UserInteraction,
    Purchase,
    Marketing,
    ApplicationAction,
    Rating,
    Suspend,
    Unrecognized,
}

impl ActionType {
    /// Every recognized category, in ordinal order
    pub const ALL: [ActionType; 11] = [
        ActionType::Launch,
        ActionType::Signin,
        ActionType::Resume,
        ActionType::View,
        ActionType::Metric,
        ActionType::UserInteraction,
        ActionType::Purchase,
        ActionType::Marketing,
        ActionType::ApplicationAction,
        ActionType::Rating,
        ActionType::Suspend,
    ];

    /// Map a snake_case tag to its category. Unknown tags are `Unrecognized`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "launch" => Self::Launch,
            "signin" => Self::Signin,
            "resume" => Self::Resume,
            "view" => Self::View,
            "metric" => Self::Metric,
            "user_interaction" => Self::UserInteraction,
            "purchase" => Self::Purchase,
            "marketing" => Self::Marketing,
            "application_action" => Self::ApplicationAction,
            "rating" => Self::Rating,
            "suspend" => Self::Suspend,
            _ => Self::Unrecognized,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Signin => "signin",
            Self::Resume => "resume",
            Self::View => "view",
            Self::Metric => "metric",
            Self::UserInteraction => "user_interaction",
            Self::Purchase => "purchase",
            Self::Marketing => "marketing",
            Self::ApplicationAction => "application_action",
            Self::Rating => "rating",
            Self::Suspend => "suspend",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Position in [`ActionType::ALL`]; `None` for `Unrecognized`
    pub fn ordinal(&self) -> Option<usize> {
        Self::ALL.iter().position(|t| t == self)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "actionType")]
    pub action_type: ActionType,
    /// The tag as it appeared in the source, kept for diagnostics
    #[serde(rename = "actionTag")]
    pub action_tag: String,
}

impl EventRecord {
    pub fn new(
        id: impl Into<String>,
        product_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        action_tag: impl Into<String>,
    ) -> Self {
        let action_tag = action_tag.into();
        Self {
            id: id.into(),
            product_name: product_name.into(),
            timestamp,
            action_type: ActionType::from_tag(&action_tag),
            action_tag,
        }
    }

    /// Hour of day (0-23, UTC) of the event
    pub fn hour_of_day(&self) -> u32 {
        self.timestamp.hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tag_table_is_total() {
        for action in ActionType::ALL {
            assert_eq!(ActionType::from_tag(action.tag()), action);
        }
        assert_eq!(ActionType::from_tag("unknown_tag"), ActionType::Unrecognized);
        // Tags are case sensitive
        assert_eq!(ActionType::from_tag("View"), ActionType::Unrecognized);
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(ActionType::Launch.ordinal(), Some(0));
        assert_eq!(ActionType::View.ordinal(), Some(3));
        assert_eq!(ActionType::Suspend.ordinal(), Some(10));
        assert_eq!(ActionType::Unrecognized.ordinal(), None);
    }

    #[test]
    fn test_record_keeps_original_tag() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 17, 45, 0).unwrap();
        let record = EventRecord::new("e1", "product-a", ts, "teleport");
        assert_eq!(record.action_type, ActionType::Unrecognized);
        assert_eq!(record.action_tag, "teleport");
        assert_eq!(record.hour_of_day(), 17);
    }
}
