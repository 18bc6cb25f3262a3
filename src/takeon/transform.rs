use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::TransformError;
use crate::periods;
use crate::schema::{optional_string_or_number, string_or_number};

/// A take-on export: `data.allSurveys.nodes[]`.
///
/// Only the envelope is parsed up front. Survey and contributor nodes are
/// parsed as they pass the survey and period filters, so nodes which are
/// skipped are never inspected beyond their key field.
#[derive(Debug, Clone, Deserialize)]
pub struct TakeonExport {
    pub data: ExportData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub all_surveys: Nodes<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SurveyKey {
    #[serde(deserialize_with = "string_or_number")]
    survey: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurveyContributors {
    contributors_by_survey: Nodes<Value>,
}

#[derive(Debug, Deserialize)]
struct PeriodKey {
    #[serde(deserialize_with = "string_or_number")]
    period: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    #[serde(deserialize_with = "string_or_number")]
    pub period: String,
    #[serde(deserialize_with = "string_or_number")]
    pub reference: String,
    #[serde(deserialize_with = "optional_string_or_number")]
    pub region: Option<String>,
    #[serde(rename = "enterprisereference", deserialize_with = "string_or_number")]
    pub enterprise_reference: String,
    #[serde(rename = "enterprisename", deserialize_with = "optional_string_or_number")]
    pub enterprise_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "responsesByReferenceAndPeriodAndSurvey")]
    pub responses: Nodes<Response>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(rename = "questioncode", deserialize_with = "string_or_number")]
    pub question_code: String,
    /// Any JSON value; only digit strings and integers are used.
    #[serde(deserialize_with = "any_value")]
    pub response: Value,
}

// required, but null is allowed
fn any_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
}

fn parse<T: DeserializeOwned>(value: &Value, location: impl FnOnce() -> String) -> Result<T, TransformError> {
    T::deserialize(value).map_err(|source| TransformError::Malformed {
        location: location(),
        source,
    })
}

impl TakeonExport {
    pub fn from_value(value: &Value) -> Result<TakeonExport, TransformError> {
        parse(value, || "data.allSurveys.nodes".to_string())
    }
}

/// Configuration bundle for [`reshape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeonParameters {
    pub period: String,
    pub periodicity: String,
    /// question code -> output column
    pub question_labels: IndexMap<String, String>,
    /// raw survey code -> output survey code
    pub survey_codes: IndexMap<String, String>,
    /// contributor status -> response_type
    pub statuses: IndexMap<String, i64>,
}

/// Response type given to contributors whose status is not configured.
pub const DEFAULT_RESPONSE_TYPE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TakeonRecord {
    pub survey: String,
    pub period: String,
    pub responder_id: String,
    pub gor_code: Option<String>,
    pub enterprise_reference: String,
    pub enterprise_name: Option<String>,
    #[serde(flatten)]
    pub questions: IndexMap<String, i64>,
    pub response_type: i64,
}

/// Flatten a take-on export into one record per contributor in the current
/// or previous period, for every configured survey.
pub fn reshape(
    export: &TakeonExport,
    params: &TakeonParameters,
) -> Result<Vec<TakeonRecord>, TransformError> {
    let previous_period = periods::calculate_adjacent_period(&params.period, &params.periodicity)?;
    debug!(
        "keeping contributors for periods {} and {}",
        params.period, previous_period
    );

    let mut records = Vec::new();
    for (s, survey) in export.data.all_surveys.nodes.iter().enumerate() {
        let survey_path = || format!("data.allSurveys.nodes[{}]", s);
        let key: SurveyKey = parse(survey, survey_path)?;
        let Some(survey_code) = params.survey_codes.get(&key.survey) else {
            debug!("skipping unconfigured survey {}", key.survey);
            continue;
        };

        let contributors: SurveyContributors = parse(survey, survey_path)?;
        for (c, contributor) in contributors.contributors_by_survey.nodes.iter().enumerate() {
            let contributor_path = || format!("{}.contributorsBySurvey.nodes[{}]", survey_path(), c);
            let key: PeriodKey = parse(contributor, contributor_path)?;
            if key.period != params.period && key.period != previous_period {
                continue;
            }

            let contributor: Contributor = parse(contributor, || {
                match contributor.get("reference").filter(|r| !r.is_null()) {
                    Some(reference) => format!("{} (reference {})", contributor_path(), reference),
                    None => contributor_path(),
                }
            })?;
            records.push(contributor_record(survey_code, &contributor, params));
        }
    }

    info!("Successfully extracted {} records from take on.", records.len());
    Ok(records)
}

fn contributor_record(
    survey_code: &str,
    contributor: &Contributor,
    params: &TakeonParameters,
) -> TakeonRecord {
    let mut questions: IndexMap<String, i64> = params
        .question_labels
        .values()
        .map(|label| (label.clone(), 0))
        .collect();

    for response in &contributor.responses.nodes {
        let Some(label) = params.question_labels.get(&response.question_code) else {
            continue;
        };
        match numeric_response(&response.response) {
            Some(value) => {
                questions.insert(label.clone(), value);
            }
            None => debug!(
                "ignoring non-numeric response {} to {} from {}",
                response.response, response.question_code, contributor.reference
            ),
        }
    }

    let response_type = contributor
        .status
        .as_ref()
        .and_then(|status| params.statuses.get(status))
        .copied()
        .unwrap_or(DEFAULT_RESPONSE_TYPE);

    TakeonRecord {
        survey: survey_code.to_string(),
        period: contributor.period.clone(),
        responder_id: contributor.reference.clone(),
        gor_code: contributor.region.clone(),
        enterprise_reference: contributor.enterprise_reference.clone(),
        enterprise_name: contributor.enterprise_name.clone(),
        questions,
        response_type,
    }
}

/// Digit strings and non-negative integers; signs, decimals, blanks and
/// nulls are not numeric.
fn numeric_response(response: &Value) -> Option<i64> {
    match response {
        Value::String(text) => {
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            text.parse().ok()
        }
        Value::Number(n) => n.as_i64().filter(|v| *v >= 0),
        _ => None,
    }
}
