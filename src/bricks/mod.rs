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

pub const METHOD: &str = "Results Ingest - Brick Type - Method";
pub const WRANGLER: &str = "Results Ingest - Brick Type - Wrangler";

// brick type method handler
pub async fn method_handler(evt: LambdaEvent<Value>) -> Result<MethodResponse, Error> {
    Ok(run_method(&evt.payload, &evt.context.request_id))
}

pub fn run_method(event: &Value, request_id: &str) -> MethodResponse {
    let run_id = schema::run_id(event);
    let span = info_span!("method", component = METHOD, run_id = %run_id);
    let _guard = span.enter();
    info!("Starting {}", METHOD);

    let outcome = MethodRequest::from_event(event)
        .map_err(TransformError::from)
        .and_then(|request| transform::expand(&request.data, &request.parameters));

    method::respond(&ErrorContext::new(METHOD, &run_id, request_id), outcome)
}

// brick type wrangler handler
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
        input_bucket: &config.results_bucket_name,
        results_bucket: &config.results_bucket_name,
        common: &vars.common,
        summary: "Brick type ingest successful.",
    };
    let response = wrangler::execute(services, plan, |data| vars.method_payload(data)).await?;

    info!("Successfully completed module: {}", WRANGLER);
    Ok(response)
}
