use serde::{Deserialize, Serialize};

use super::error::SpecError;

/// Optional bounds of the analysis window, as relative or absolute date expressions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

/// Request body for a breakdown query
///
/// Counts the most frequent values of each requested property among the
/// exception events of one subject (an issue) inside a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownQuery {
    /// Properties to break down by; order is kept in the plan
    pub breakdown_properties: Vec<String>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub filter_test_accounts: bool,
    /// Identifier of the subject whose events are counted
    #[serde(rename = "issueId", alias = "subjectId")]
    pub subject_id: String,
    /// Values kept per property; the config default applies when unset
    #[serde(default)]
    pub limit: Option<i64>,
}

impl BreakdownQuery {
    pub fn new<I, S>(subject_id: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            breakdown_properties: properties.into_iter().map(Into::into).collect(),
            subject_id: subject_id.into(),
            ..Default::default()
        }
    }

    pub fn with_date_range(mut self, date_from: Option<&str>, date_to: Option<&str>) -> Self {
        self.date_range = Some(DateRange {
            date_from: date_from.map(str::to_string),
            date_to: date_to.map(str::to_string),
        });
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_test_account_filter(mut self, enabled: bool) -> Self {
        self.filter_test_accounts = enabled;
        self
    }

    pub fn date_from(&self) -> Option<&str> {
        self.date_range.as_ref().and_then(|r| r.date_from.as_deref())
    }

    pub fn date_to(&self) -> Option<&str> {
        self.date_range.as_ref().and_then(|r| r.date_to.as_deref())
    }

    /// Check the basic shape of the request
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.breakdown_properties.is_empty() {
            return Err(SpecError::EmptyBreakdown);
        }
        if let Some(index) = self
            .breakdown_properties
            .iter()
            .position(|p| p.trim().is_empty())
        {
            return Err(SpecError::BlankProperty { index });
        }
        if self.subject_id.trim().is_empty() {
            return Err(SpecError::MissingSubject);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_names() {
        let query: BreakdownQuery = serde_json::from_str(
            r#"{
                "breakdownProperties": ["$browser", "$os"],
                "dateRange": {"date_from": "-14d", "date_to": null},
                "filterTestAccounts": true,
                "issueId": "01890000-issue",
                "limit": 5
            }"#,
        )
        .unwrap();

        assert_eq!(query.breakdown_properties, vec!["$browser", "$os"]);
        assert_eq!(query.date_from(), Some("-14d"));
        assert_eq!(query.date_to(), None);
        assert!(query.filter_test_accounts);
        assert_eq!(query.subject_id, "01890000-issue");
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_deserialize_defaults_and_alias() {
        let query: BreakdownQuery = serde_json::from_str(
            r#"{"breakdownProperties": ["$browser"], "subjectId": "abc"}"#,
        )
        .unwrap();

        assert_eq!(query.subject_id, "abc");
        assert_eq!(query.limit, None);
        assert!(query.date_range.is_none());
        assert!(!query.filter_test_accounts);
    }

    #[test]
    fn test_validate() {
        assert!(BreakdownQuery::new("issue", ["$browser"]).validate().is_ok());
        assert_eq!(
            BreakdownQuery::new("issue", Vec::<String>::new()).validate(),
            Err(SpecError::EmptyBreakdown)
        );
        assert_eq!(
            BreakdownQuery::new("issue", ["$browser", " "]).validate(),
            Err(SpecError::BlankProperty { index: 1 })
        );
        assert_eq!(
            BreakdownQuery::new("", ["$browser"]).validate(),
            Err(SpecError::MissingSubject)
        );
    }
}
