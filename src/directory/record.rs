//! Institution records as the rest of the crate sees them.
//!
//! These types are independent of wire naming; see [`super::mapping`] for
//! how raw JSON rows become records.

use serde::Serialize;

/// A yes/no answer that may also be unknown.
///
/// `Unknown` means the directory has no data. It must never be displayed
/// as a negative answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn is_known(&self) -> bool {
        !matches!(self, TriState::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TriState::Yes => "Yes",
            TriState::No => "No",
            TriState::Unknown => "Unknown",
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::Yes,
            Some(false) => TriState::No,
            None => TriState::Unknown,
        }
    }
}

/// One row of the institution directory
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InstitutionRecord {
    /// Sponsor identifier, forwarded to the search log when present
    pub sponsor_code: Option<String>,
    pub name: String,
    pub city: String,
    pub state_name: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub postal_code: Option<String>,
    pub url: Option<String>,
    pub maternal_leave_weeks: Option<u32>,
    pub paternal_leave_weeks: Option<u32>,
    pub has_fertility_benefits: TriState,
    pub benefit_amount: Option<f64>,
    pub limits_for_coverage: Option<String>,
    pub is_elective_treatment_covered: TriState,
    pub benefits_offered: Option<String>,
    /// Free-text notes shown as "Additional information"
    pub other_details: Option<String>,
    /// Semicolon-delimited list of source citations
    pub data_method: Option<String>,
}

impl InstitutionRecord {
    /// Convenience constructor for the three always-present fields.
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            state_name: state_name.into(),
            ..Default::default()
        }
    }

    /// "City, State" as shown under a suggestion
    pub fn location(&self) -> String {
        match (self.city.is_empty(), self.state_name.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.state_name),
            (false, true) => self.city.clone(),
            (true, false) => self.state_name.clone(),
            (true, true) => String::new(),
        }
    }

    /// Street address lines joined with a space, if any are on file
    pub fn street_address(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.address_line1, &self.address_line2]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Whether `needle_lower` (already lowercased) occurs in the name or city.
    pub fn matches_lower(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self.city.to_lowercase().contains(needle_lower)
    }
}
