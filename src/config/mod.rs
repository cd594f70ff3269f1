//! Event schema and defaults the breakdown planner compiles against (noun module)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ParseError;

/// Placeholder written in place of a missing property value, so the value
/// column stays non-nullable through grouping and ordering.
pub const BREAKDOWN_NULL_VALUE: &str = "$$_posthog_breakdown_null_$$";

/// Event schema names and request defaults.
///
/// Every field has a default, so an empty document describes the standard
/// exception-event schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownConfig {
    /// Relation holding the raw events
    pub events_table: String,
    pub timestamp_field: String,
    pub event_field: String,
    /// Root of the per-event property map
    pub properties_field: String,
    /// Event name that marks an exception
    pub exception_event: String,
    /// Property holding the subject (issue) identifier
    pub subject_property: String,
    /// Property that is true for identified (non-test) persons
    pub identified_property: String,
    /// Values kept per dimension when the request does not set a limit
    pub default_limit: i64,
    /// Window length used when the request has no lower bound
    pub default_lookback_days: i64,
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        Self {
            events_table: "events".to_string(),
            timestamp_field: "timestamp".to_string(),
            event_field: "event".to_string(),
            properties_field: "properties".to_string(),
            exception_event: "$exception".to_string(),
            subject_property: "$exception_issue_id".to_string(),
            identified_property: "$is_identified".to_string(),
            default_limit: 3,
            default_lookback_days: 7,
        }
    }
}

impl BreakdownConfig {
    /// Load a config from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        crate::parser::parse_file(path)
    }

    /// Check that every schema name is set and the defaults are usable
    pub fn validate(&self) -> Result<(), ParseError> {
        let names = [
            ("events_table", &self.events_table),
            ("timestamp_field", &self.timestamp_field),
            ("event_field", &self.event_field),
            ("properties_field", &self.properties_field),
            ("exception_event", &self.exception_event),
            ("subject_property", &self.subject_property),
            ("identified_property", &self.identified_property),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ParseError::Invalid {
                    field: field.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        if self.default_limit < 1 {
            return Err(ParseError::Invalid {
                field: "default_limit".to_string(),
                message: format!("must be positive, got {}", self.default_limit),
            });
        }
        if self.default_lookback_days < 0 {
            return Err(ParseError::Invalid {
                field: "default_lookback_days".to_string(),
                message: format!("must not be negative, got {}", self.default_lookback_days),
            });
        }
        Ok(())
    }

    /// Dotted path of a property on the event
    pub fn property_chain(&self, property: &str) -> Vec<String> {
        vec![self.properties_field.clone(), property.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BreakdownConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_limit, 3);
        assert_eq!(config.default_lookback_days, 7);
    }

    #[test]
    fn test_property_chain() {
        let config = BreakdownConfig::default();
        assert_eq!(
            config.property_chain("$browser"),
            vec!["properties".to_string(), "$browser".to_string()]
        );
    }

    #[test]
    fn test_rejects_blank_name() {
        let config = BreakdownConfig {
            event_field: "  ".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ParseError::Invalid { ref field, .. } if field == "event_field"));
    }

    #[test]
    fn test_rejects_non_positive_limit() {
        let config = BreakdownConfig {
            default_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
