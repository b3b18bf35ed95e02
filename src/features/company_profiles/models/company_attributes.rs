use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::shared::llm::LlmResponse;

/// `null` and a missing key both mean "nothing extracted"
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured company attributes derived from a document's text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "CompanyAttributes")]
pub struct CompanyAttributes {
    #[schemars(description = "Concise description of the company (max 200 words), or null")]
    #[serde(default)]
    pub company_description: Option<String>,

    #[schemars(description = "Legal form or type of business (e.g. LLC, Corporation), or null")]
    #[serde(default)]
    pub business_type: Option<String>,

    #[schemars(description = "Specific business activities or services the company offers")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company_activities: Vec<String>,

    #[schemars(description = "Main industries the company operates in")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub main_industries: Vec<String>,

    #[schemars(description = "Specialized services or capabilities")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub specializations: Vec<String>,
}

impl LlmResponse for CompanyAttributes {}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl CompanyAttributes {
    /// Trim values and drop blanks so "present" always means non-empty
    pub fn normalized(self) -> Self {
        Self {
            company_description: clean_text(self.company_description),
            business_type: clean_text(self.business_type),
            company_activities: clean_list(self.company_activities),
            main_industries: clean_list(self.main_industries),
            specializations: clean_list(self.specializations),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.company_description.is_none()
            && self.business_type.is_none()
            && self.company_activities.is_empty()
            && self.main_industries.is_empty()
            && self.specializations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_reply() {
        let json = r#"{
            "companyDescription": "Builds bridges",
            "businessType": "LLC",
            "companyActivities": ["Bridge construction"],
            "mainIndustries": ["Construction"],
            "specializations": ["Steel structures"]
        }"#;

        let attrs: CompanyAttributes = serde_json::from_str(json).unwrap();
        assert_eq!(attrs.business_type.as_deref(), Some("LLC"));
        assert_eq!(attrs.main_industries, vec!["Construction"]);
        assert!(!attrs.is_empty());
    }

    #[test]
    fn test_nulls_and_missing_keys_become_empty() {
        let json = r#"{"businessType": null, "mainIndustries": null}"#;

        let attrs: CompanyAttributes = serde_json::from_str(json).unwrap();
        assert!(attrs.business_type.is_none());
        assert!(attrs.main_industries.is_empty());
        assert!(attrs.company_activities.is_empty());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_normalized_drops_blank_values() {
        let attrs = CompanyAttributes {
            company_description: Some("   ".to_string()),
            business_type: Some(" LLC ".to_string()),
            company_activities: vec!["".to_string(), " Consulting ".to_string()],
            main_industries: vec![],
            specializations: vec!["  ".to_string()],
        }
        .normalized();

        assert!(attrs.company_description.is_none());
        assert_eq!(attrs.business_type.as_deref(), Some("LLC"));
        assert_eq!(attrs.company_activities, vec!["Consulting"]);
        assert!(attrs.specializations.is_empty());
    }

    #[test]
    fn test_json_schema_uses_wire_names() {
        let schema = CompanyAttributes::json_schema_string();
        assert!(schema.contains("companyDescription"));
        assert!(schema.contains("businessType"));
        assert!(schema.contains("companyActivities"));
        assert!(schema.contains("mainIndustries"));
        assert!(schema.contains("specializations"));
    }
}
