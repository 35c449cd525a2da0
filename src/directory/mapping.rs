//! Wire-to-record mapping
//!
//! Deployments disagree on field names (`name` vs `SponsorName`, ...) and on
//! value types (numbers as strings, booleans as `1`/`0` or `"Yes"`). This is
//! the only place that knows about either; everything past it works with
//! [`InstitutionRecord`].

use super::record::{InstitutionRecord, TriState};
use crate::error::FetchError;
use crate::logging;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Field Mapping
// ============================================================================

/// Candidate wire keys for each record field, tried in order.
///
/// The first key whose cell holds a non-empty value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub sponsor_code: Vec<String>,
    pub name: Vec<String>,
    pub city: Vec<String>,
    pub state_name: Vec<String>,
    pub address_line1: Vec<String>,
    pub address_line2: Vec<String>,
    pub postal_code: Vec<String>,
    pub url: Vec<String>,
    pub maternal_leave_weeks: Vec<String>,
    pub paternal_leave_weeks: Vec<String>,
    pub has_fertility_benefits: Vec<String>,
    pub benefit_amount: Vec<String>,
    pub limits_for_coverage: Vec<String>,
    pub is_elective_treatment_covered: Vec<String>,
    pub benefits_offered: Vec<String>,
    pub other_details: Vec<String>,
    pub data_method: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl FieldMapping {
    /// snake_case columns served by the institutions API
    pub fn standard() -> Self {
        Self {
            sponsor_code: keys(&["sponsor_code"]),
            name: keys(&["name"]),
            city: keys(&["city"]),
            state_name: keys(&["state_name"]),
            address_line1: keys(&["address_line1"]),
            address_line2: keys(&["address_line2"]),
            postal_code: keys(&["postal_code"]),
            url: keys(&["url"]),
            maternal_leave_weeks: keys(&["maternal_leave_weeks"]),
            paternal_leave_weeks: keys(&["paternal_leave_weeks"]),
            has_fertility_benefits: keys(&["has_fertility_benefits"]),
            benefit_amount: keys(&["benefit_amount"]),
            limits_for_coverage: keys(&["limits_for_coverage"]),
            // Older snapshots carry the misspelled column
            is_elective_treatment_covered: keys(&[
                "is_elective_treatment_covered",
                "is_elective_treament_covered",
            ]),
            benefits_offered: keys(&["benefits_offered"]),
            other_details: keys(&["other_details"]),
            data_method: keys(&["data_method", "data_source"]),
        }
    }

    /// Spreadsheet-style columns from the sponsor export
    pub fn sponsor() -> Self {
        Self {
            sponsor_code: keys(&["SponsorCode"]),
            name: keys(&["SponsorName"]),
            city: keys(&["SponsorCity"]),
            state_name: keys(&["SponsorStateName"]),
            address_line1: keys(&["AddressLine1"]),
            address_line2: keys(&["AddressLine2"]),
            postal_code: keys(&["SponsorPostalCode"]),
            url: keys(&["SponsorUrl"]),
            maternal_leave_weeks: keys(&["Maternal leave (wks)"]),
            paternal_leave_weeks: keys(&["Paternal leave (wks)"]),
            has_fertility_benefits: keys(&["Fertility Benefits offered? (Yes/No)"]),
            benefit_amount: keys(&["Benefit amount"]),
            limits_for_coverage: keys(&[
                "Limits for coverage (elective, oocyte and/or embryo, PGT)",
            ]),
            is_elective_treatment_covered: keys(&["Elective treatment covered"]),
            benefits_offered: keys(&[
                "Type of benefits offered  (lifetime benefit, fertility insurance ie progyny)",
            ]),
            other_details: keys(&["Other details"]),
            data_method: keys(&["Data method"]),
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "sponsor" => Some(Self::sponsor()),
            "auto" => Some(Self::default()),
            _ => None,
        }
    }

    /// Append `other`'s candidates after our own, skipping duplicates.
    pub fn merged_with(mut self, other: &FieldMapping) -> Self {
        fn extend(dst: &mut Vec<String>, src: &[String]) {
            for key in src {
                if !dst.contains(key) {
                    dst.push(key.clone());
                }
            }
        }
        extend(&mut self.sponsor_code, &other.sponsor_code);
        extend(&mut self.name, &other.name);
        extend(&mut self.city, &other.city);
        extend(&mut self.state_name, &other.state_name);
        extend(&mut self.address_line1, &other.address_line1);
        extend(&mut self.address_line2, &other.address_line2);
        extend(&mut self.postal_code, &other.postal_code);
        extend(&mut self.url, &other.url);
        extend(&mut self.maternal_leave_weeks, &other.maternal_leave_weeks);
        extend(&mut self.paternal_leave_weeks, &other.paternal_leave_weeks);
        extend(&mut self.has_fertility_benefits, &other.has_fertility_benefits);
        extend(&mut self.benefit_amount, &other.benefit_amount);
        extend(&mut self.limits_for_coverage, &other.limits_for_coverage);
        extend(
            &mut self.is_elective_treatment_covered,
            &other.is_elective_treatment_covered,
        );
        extend(&mut self.benefits_offered, &other.benefits_offered);
        extend(&mut self.other_details, &other.other_details);
        extend(&mut self.data_method, &other.data_method);
        self
    }
}

impl Default for FieldMapping {
    /// Accepts both known wire shapes.
    fn default() -> Self {
        Self::standard().merged_with(&Self::sponsor())
    }
}

// ============================================================================
// Response Shape
// ============================================================================

/// Pull the row array out of a parsed response.
///
/// Accepts a bare array or an object wrapping one under `data`.
pub fn extract_rows(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(FetchError::MalformedResponse(
                "The server response does not have the expected data format".to_string(),
            )),
        },
        _ => Err(FetchError::MalformedResponse(
            "The server response does not have the expected data format".to_string(),
        )),
    }
}

/// Map every row, rejecting non-object rows and skipping nameless ones.
pub fn map_rows(
    rows: Vec<Value>,
    mapping: &FieldMapping,
) -> Result<Vec<InstitutionRecord>, FetchError> {
    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let Value::Object(obj) = row else {
            return Err(FetchError::MalformedResponse(format!(
                "row {} is not an object",
                index
            )));
        };
        let record = map_record(&obj, mapping);
        if record.name.is_empty() {
            logging::warn("MAPPING", &format!("Skipping row {} without a name", index));
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Map one JSON object to a record.
pub fn map_record(obj: &Map<String, Value>, mapping: &FieldMapping) -> InstitutionRecord {
    let cell = |candidates: &[String]| lookup(obj, candidates);

    InstitutionRecord {
        sponsor_code: cell(&mapping.sponsor_code).and_then(as_text),
        name: cell(&mapping.name).and_then(as_text).unwrap_or_default(),
        city: cell(&mapping.city).and_then(as_text).unwrap_or_default(),
        state_name: cell(&mapping.state_name).and_then(as_text).unwrap_or_default(),
        address_line1: cell(&mapping.address_line1).and_then(as_text),
        address_line2: cell(&mapping.address_line2).and_then(as_text),
        postal_code: cell(&mapping.postal_code).and_then(as_text),
        url: cell(&mapping.url).and_then(as_text),
        maternal_leave_weeks: cell(&mapping.maternal_leave_weeks).and_then(as_weeks),
        paternal_leave_weeks: cell(&mapping.paternal_leave_weeks).and_then(as_weeks),
        has_fertility_benefits: cell(&mapping.has_fertility_benefits)
            .map(as_tristate)
            .unwrap_or_default(),
        benefit_amount: cell(&mapping.benefit_amount).and_then(as_amount),
        limits_for_coverage: cell(&mapping.limits_for_coverage).and_then(as_text),
        is_elective_treatment_covered: elective_coverage(
            cell(&mapping.is_elective_treatment_covered),
        ),
        benefits_offered: cell(&mapping.benefits_offered).and_then(as_text),
        other_details: cell(&mapping.other_details).and_then(as_text),
        data_method: cell(&mapping.data_method).and_then(as_text),
    }
}

// ============================================================================
// Cell Coercion
// ============================================================================

fn lookup<'a>(obj: &'a Map<String, Value>, candidates: &[String]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| obj.get(key))
        .find_map(clean_cell)
}

/// Treat null, blank and placeholder dashes as missing.
fn clean_cell(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "-" || trimmed == "\u{2013}" {
                None
            } else {
                Some(value)
            }
        }
        _ => Some(value),
    }
}

/// Render a cell the way a loosely typed frontend would stringify it.
pub fn loose_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(_) | Value::Bool(_) => Some(loose_string(value)),
        _ => None,
    }
}

fn as_weeks(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).ok()
            } else {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u32)
            }
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn as_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
            digits.trim().parse::<f64>().ok()
        }
        _ => None,
    }?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

fn as_tristate(value: &Value) -> TriState {
    match value {
        Value::Bool(b) => TriState::from(Some(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => TriState::Yes,
            Some(f) if f == 0.0 => TriState::No,
            _ => TriState::Unknown,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "y" => TriState::Yes,
            "0" | "no" | "false" | "n" => TriState::No,
            _ => TriState::Unknown,
        },
        _ => TriState::Unknown,
    }
}

/// Elective coverage is stored loosely; only the strings `"1"` and `"0"`
/// count as answers. A JSON `true` stringifies to `"true"` and stays
/// unknown.
pub fn elective_coverage(value: Option<&Value>) -> TriState {
    let text = value.map(loose_string).unwrap_or_default();
    match text.as_str() {
        "1" => TriState::Yes,
        "0" => TriState::No,
        _ => TriState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn maps_standard_row() {
        let row = obj(json!({
            "name": "Mercy General",
            "city": "Austin",
            "state_name": "Texas",
            "url": "https://mercy.example.org",
            "maternal_leave_weeks": 6,
            "paternal_leave_weeks": "2",
            "has_fertility_benefits": 1,
            "benefit_amount": "$25,000",
            "is_elective_treament_covered": "1",
            "data_method": "Direct outreach"
        }));
        let r = map_record(&row, &FieldMapping::default());
        assert_eq!(r.name, "Mercy General");
        assert_eq!(r.location(), "Austin, Texas");
        assert_eq!(r.maternal_leave_weeks, Some(6));
        assert_eq!(r.paternal_leave_weeks, Some(2));
        assert_eq!(r.has_fertility_benefits, TriState::Yes);
        assert_eq!(r.benefit_amount, Some(25_000.0));
        assert_eq!(r.is_elective_treatment_covered, TriState::Yes);
        assert_eq!(r.data_method.as_deref(), Some("Direct outreach"));
    }

    #[test]
    fn maps_sponsor_row() {
        let row = obj(json!({
            "SponsorName": "St. Mercy",
            "SponsorCity": "Dallas",
            "SponsorStateName": "Texas",
            "Maternal leave (wks)": "12",
            "Fertility Benefits offered? (Yes/No)": "No"
        }));
        let r = map_record(&row, &FieldMapping::sponsor());
        assert_eq!(r.name, "St. Mercy");
        assert_eq!(r.city, "Dallas");
        assert_eq!(r.maternal_leave_weeks, Some(12));
        assert_eq!(r.has_fertility_benefits, TriState::No);
    }

    #[test]
    fn maps_other_details_and_address_from_either_shape() {
        let standard = obj(json!({
            "name": "X",
            "address_line1": "1 Main St",
            "other_details": "Covers 3 IVF cycles"
        }));
        let r = map_record(&standard, &FieldMapping::default());
        assert_eq!(r.other_details.as_deref(), Some("Covers 3 IVF cycles"));
        assert_eq!(r.address_line1.as_deref(), Some("1 Main St"));
        assert_eq!(r.address_line2, None);

        let sponsor = obj(json!({
            "SponsorName": "Y",
            "AddressLine1": "200 Oak Ave",
            "AddressLine2": "Floor 4",
            "Other details": "Adoption assistance"
        }));
        let r = map_record(&sponsor, &FieldMapping::default());
        assert_eq!(r.other_details.as_deref(), Some("Adoption assistance"));
        assert_eq!(r.street_address().as_deref(), Some("200 Oak Ave Floor 4"));
    }

    #[test]
    fn standard_mapping_ignores_sponsor_keys() {
        let row = obj(json!({ "SponsorName": "St. Mercy" }));
        assert_eq!(map_record(&row, &FieldMapping::standard()).name, "");
    }

    #[test]
    fn dashes_and_nulls_are_missing() {
        let row = obj(json!({
            "name": "X",
            "maternal_leave_weeks": "-",
            "paternal_leave_weeks": null,
            "has_fertility_benefits": "\u{2013}",
            "url": "  "
        }));
        let r = map_record(&row, &FieldMapping::standard());
        assert_eq!(r.maternal_leave_weeks, None);
        assert_eq!(r.paternal_leave_weeks, None);
        assert_eq!(r.has_fertility_benefits, TriState::Unknown);
        assert_eq!(r.url, None);
    }

    #[test]
    fn zero_weeks_is_known() {
        let row = obj(json!({ "name": "X", "maternal_leave_weeks": 0 }));
        assert_eq!(map_record(&row, &FieldMapping::standard()).maternal_leave_weeks, Some(0));
    }

    #[test]
    fn elective_coercion_matches_only_one_and_zero() {
        assert_eq!(elective_coverage(Some(&json!(1))), TriState::Yes);
        assert_eq!(elective_coverage(Some(&json!("1"))), TriState::Yes);
        assert_eq!(elective_coverage(Some(&json!(0))), TriState::No);
        assert_eq!(elective_coverage(Some(&json!(0.0))), TriState::No);
        assert_eq!(elective_coverage(Some(&json!(""))), TriState::Unknown);
        assert_eq!(elective_coverage(Some(&json!(true))), TriState::Unknown);
        assert_eq!(elective_coverage(Some(&json!("Yes"))), TriState::Unknown);
        assert_eq!(elective_coverage(None), TriState::Unknown);
    }

    #[test]
    fn extracts_rows_from_both_shapes() {
        assert_eq!(extract_rows(json!([{"name": "a"}])).unwrap().len(), 1);
        assert_eq!(
            extract_rows(json!({"status": 200, "data": [{"name": "a"}, {"name": "b"}]}))
                .unwrap()
                .len(),
            2
        );
        assert!(matches!(
            extract_rows(json!({"data": {}})),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_rows(json!("nope")),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_object_row_is_malformed_and_nameless_rows_are_skipped() {
        let mapping = FieldMapping::default();
        assert!(map_rows(vec![json!(3)], &mapping).is_err());
        let rows = vec![json!({"city": "Nowhere"}), json!({"name": "A"})];
        let records = map_rows(rows, &mapping).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(FieldMapping::preset("sponsor"), Some(FieldMapping::sponsor()));
        assert_eq!(FieldMapping::preset("auto"), Some(FieldMapping::default()));
        assert_eq!(FieldMapping::preset("other"), None);
    }
}
