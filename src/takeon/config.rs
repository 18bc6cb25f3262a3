use serde_json::{json, Value};
use std::env;

use crate::error::ValidationError;
use crate::schema::{self, Environment, Field, FieldKind};
use crate::takeon::transform::TakeonParameters;
use crate::wrangler::RuntimeCommon;

const ENVIRONMENT: &[&str] = &[
    "CHECKPOINT",
    "METHOD_NAME",
    "RESULTS_BUCKET_NAME",
    "TAKEON_BUCKET_NAME",
];

const METHOD_FIELDS: &[Field] = &[
    Field::new("data", FieldKind::Object),
    Field::new("period", FieldKind::Text),
    Field::new("periodicity", FieldKind::Text),
    Field::new("question_labels", FieldKind::Object),
    Field::new("survey_codes", FieldKind::Object),
    Field::new("statuses", FieldKind::Object),
];

const WRANGLER_FIELDS: &[Field] = &[
    Field::new("period", FieldKind::Text),
    Field::new("periodicity", FieldKind::Text),
];

const INGESTION_FIELDS: &[Field] = &[
    Field::new("question_labels", FieldKind::Object),
    Field::new("survey_codes", FieldKind::Object),
    Field::new("statuses", FieldKind::Object),
];

/// Environment of the takeon wrangler.
#[derive(Debug, Clone)]
pub struct Config {
    pub checkpoint: String,
    pub method_name: String,
    pub results_bucket_name: String,
    pub takeon_bucket_name: String,
}

impl Config {
    pub fn load_from_env() -> Result<Config, ValidationError> {
        let mut vars = Environment::load(ENVIRONMENT, |name| env::var(name).ok())?;
        Ok(Config {
            checkpoint: vars.take("CHECKPOINT"),
            method_name: vars.take("METHOD_NAME"),
            results_bucket_name: vars.take("RESULTS_BUCKET_NAME"),
            takeon_bucket_name: vars.take("TAKEON_BUCKET_NAME"),
        })
    }
}

/// A validated request to the takeon method.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    pub data: Value,
    pub parameters: TakeonParameters,
}

impl MethodRequest {
    pub fn from_event(event: &Value) -> Result<MethodRequest, ValidationError> {
        let vars = schema::runtime_variables(event)?;
        schema::validate(vars, None, METHOD_FIELDS)?;

        Ok(MethodRequest {
            data: vars.get("data").cloned().unwrap_or(Value::Null),
            parameters: TakeonParameters {
                period: schema::extract(vars, None, "period")?,
                periodicity: schema::extract(vars, None, "periodicity")?,
                question_labels: schema::extract(vars, None, "question_labels")?,
                survey_codes: schema::extract(vars, None, "survey_codes")?,
                statuses: schema::extract(vars, None, "statuses")?,
            },
        })
    }
}

/// Validated runtime variables of the takeon wrangler.
#[derive(Debug, Clone)]
pub struct WranglerVariables {
    pub common: RuntimeCommon,
    pub parameters: TakeonParameters,
}

impl WranglerVariables {
    pub fn from_event(event: &Value) -> Result<WranglerVariables, ValidationError> {
        let vars = schema::runtime_variables(event)?;
        let common = RuntimeCommon::from_variables(vars)?;
        schema::validate(vars, None, WRANGLER_FIELDS)?;
        let ingestion = schema::nested(vars, "ingestion_parameters")?;
        let scope = Some("ingestion_parameters");
        schema::validate(ingestion, scope, INGESTION_FIELDS)?;

        Ok(WranglerVariables {
            common,
            parameters: TakeonParameters {
                period: schema::extract(vars, None, "period")?,
                periodicity: schema::extract(vars, None, "periodicity")?,
                question_labels: schema::extract(ingestion, scope, "question_labels")?,
                survey_codes: schema::extract(ingestion, scope, "survey_codes")?,
                statuses: schema::extract(ingestion, scope, "statuses")?,
            },
        })
    }

    /// The request sent to the method function.
    pub fn method_payload(&self, data: Value) -> Value {
        let p = &self.parameters;
        json!({
            schema::RUNTIME_VARIABLES: {
                "data": data,
                "run_id": self.common.run_id,
                "period": p.period,
                "periodicity": p.periodicity,
                "question_labels": p.question_labels,
                "survey_codes": p.survey_codes,
                "statuses": p.statuses,
            }
        })
    }
}
