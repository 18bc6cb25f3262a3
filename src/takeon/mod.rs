use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, info_span, Instrument};

use crate::error::{ErrorContext, IngestError, TransformError};
use crate::method::{self, MethodResponse};
use crate::schema;
use crate::services::Services;
use crate::wrangler::{self, Plan, WranglerResponse};

pub mod config;
pub mod transform;

use config::{Config, MethodRequest, WranglerVariables};
use transform::TakeonExport;

pub const METHOD: &str = "Results Data Ingest - Method";
pub const WRANGLER: &str = "Results Data Ingest - Wrangler";

// takeon method handler
pub async fn method_handler(evt: LambdaEvent<Value>) -> Result<MethodResponse, Error> {
    Ok(run_method(&evt.payload, &evt.context.request_id))
}

/// Reshape the take-on export carried by `event`. Never fails; problems are
/// reported in the response.
pub fn run_method(event: &Value, request_id: &str) -> MethodResponse {
    let run_id = schema::run_id(event);
    let span = info_span!("method", component = METHOD, run_id = %run_id);
    let _guard = span.enter();
    info!("Starting {}", METHOD);

    let outcome = MethodRequest::from_event(event)
        .map_err(TransformError::from)
        .and_then(|request| {
            let export = TakeonExport::from_value(&request.data)?;
            transform::reshape(&export, &request.parameters)
        });

    method::respond(&ErrorContext::new(METHOD, &run_id, request_id), outcome)
}

// takeon wrangler handler
pub async fn wrangler_handler(
    services: Services<'_>,
    evt: LambdaEvent<Value>,
) -> Result<WranglerResponse, Error> {
    let run_id = schema::run_id(&evt.payload);
    let span = info_span!("wrangler", component = WRANGLER, run_id = %run_id);

    run_wrangler(services, &evt.payload)
        .instrument(span)
        .await
        .map_err(|e| {
            let ctx = ErrorContext::new(WRANGLER, &run_id, &evt.context.request_id);
            wrangler::fail(e, &ctx)
        })
}

async fn run_wrangler(services: Services<'_>, event: &Value) -> Result<WranglerResponse, IngestError> {
    info!("Starting {}", WRANGLER);
    let config = Config::load_from_env()?;
    let vars = WranglerVariables::from_event(event)?;
    info!("Validated parameters.");

    let plan = Plan {
        checkpoint: &config.checkpoint,
        method_name: &config.method_name,
        input_bucket: &config.takeon_bucket_name,
        results_bucket: &config.results_bucket_name,
        common: &vars.common,
        summary: "Take On data ingest successful.",
    };
    let response = wrangler::execute(services, plan, |data| vars.method_payload(data)).await?;

    info!("Successfully completed module: {}", WRANGLER);
    Ok(response)
}
