use serde_json::{json, Value};
use std::env;

use crate::bricks::transform::{BrickParameters, Record};
use crate::error::ValidationError;
use crate::schema::{self, Environment, Field, FieldKind};
use crate::wrangler::RuntimeCommon;

const ENVIRONMENT: &[&str] = &["CHECKPOINT", "METHOD_NAME", "RESULTS_BUCKET_NAME"];

const PARAMETER_FIELDS: &[Field] = &[
    Field::new("brick_types", FieldKind::Array),
    Field::new("brick_type_column", FieldKind::Text),
    Field::new("brick_questions", FieldKind::Object),
];

/// Environment of the brick type wrangler.
#[derive(Debug, Clone)]
pub struct Config {
    pub checkpoint: String,
    pub method_name: String,
    pub results_bucket_name: String,
}

impl Config {
    pub fn load_from_env() -> Result<Config, ValidationError> {
        let mut vars = Environment::load(ENVIRONMENT, |name| env::var(name).ok())?;
        Ok(Config {
            checkpoint: vars.take("CHECKPOINT"),
            method_name: vars.take("METHOD_NAME"),
            results_bucket_name: vars.take("RESULTS_BUCKET_NAME"),
        })
    }
}

fn parameters(
    object: &serde_json::Map<String, Value>,
    scope: Option<&str>,
) -> Result<BrickParameters, ValidationError> {
    schema::validate(object, scope, PARAMETER_FIELDS)?;
    Ok(BrickParameters {
        brick_types: schema::extract(object, scope, "brick_types")?,
        brick_type_column: schema::extract(object, scope, "brick_type_column")?,
        brick_questions: schema::extract(object, scope, "brick_questions")?,
    })
}

/// A validated request to the brick type method.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    pub data: Vec<Record>,
    pub parameters: BrickParameters,
}

impl MethodRequest {
    pub fn from_event(event: &Value) -> Result<MethodRequest, ValidationError> {
        let vars = schema::runtime_variables(event)?;
        schema::validate(vars, None, &[Field::new("data", FieldKind::Array)])?;
        let parameters = parameters(vars, None)?;

        Ok(MethodRequest {
            data: schema::extract(vars, None, "data")?,
            parameters,
        })
    }
}

/// Validated runtime variables of the brick type wrangler.
#[derive(Debug, Clone)]
pub struct WranglerVariables {
    pub common: RuntimeCommon,
    pub parameters: BrickParameters,
}

impl WranglerVariables {
    pub fn from_event(event: &Value) -> Result<WranglerVariables, ValidationError> {
        let vars = schema::runtime_variables(event)?;
        let common = RuntimeCommon::from_variables(vars)?;
        let ingestion = schema::nested(vars, "ingestion_parameters")?;

        Ok(WranglerVariables {
            common,
            parameters: parameters(ingestion, Some("ingestion_parameters"))?,
        })
    }

    /// The request sent to the method function.
    pub fn method_payload(&self, data: Value) -> Value {
        let p = &self.parameters;
        json!({
            schema::RUNTIME_VARIABLES: {
                "data": data,
                "run_id": self.common.run_id,
                "brick_types": p.brick_types,
                "brick_type_column": p.brick_type_column,
                "brick_questions": p.brick_questions,
            }
        })
    }
}
