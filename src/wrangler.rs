//! Steps shared by the wrangler functions: read the input blob, invoke the
//! method, persist its output and notify downstream.

use lambda_runtime::Error;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use crate::error::{ErrorContext, IngestError, LambdaFailure, ValidationError};
use crate::method::MethodResponse;
use crate::schema::{self, Field, FieldKind};
use crate::services::{MethodInvoker, ObjectStore, QueueSink, Services, TopicPublisher};

const COMMON_FIELDS: &[Field] = &[
    Field::new("run_id", FieldKind::Scalar),
    Field::new("in_file_name", FieldKind::Text),
    Field::new("out_file_name", FieldKind::Text),
    Field::new("outgoing_message_group_id", FieldKind::Text),
    Field::new("location", FieldKind::AnyText),
    Field::new("sns_topic_arn", FieldKind::Text),
    Field::new("queue_url", FieldKind::Text),
    Field::new("ingestion_parameters", FieldKind::Object),
];

/// Runtime variables every wrangler takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCommon {
    pub run_id: String,
    pub in_file_name: String,
    pub out_file_name: String,
    pub outgoing_message_group_id: String,
    pub location: String,
    pub sns_topic_arn: String,
    pub queue_url: String,
}

impl RuntimeCommon {
    pub fn from_variables(vars: &Map<String, Value>) -> Result<RuntimeCommon, ValidationError> {
        schema::validate(vars, None, COMMON_FIELDS)?;
        Ok(RuntimeCommon {
            run_id: schema::text(vars, None, "run_id")?,
            in_file_name: schema::extract(vars, None, "in_file_name")?,
            out_file_name: schema::extract(vars, None, "out_file_name")?,
            outgoing_message_group_id: schema::extract(vars, None, "outgoing_message_group_id")?,
            location: schema::extract(vars, None, "location")?,
            sns_topic_arn: schema::extract(vars, None, "sns_topic_arn")?,
            queue_url: schema::extract(vars, None, "queue_url")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WranglerResponse {
    pub success: bool,
    pub checkpoint: String,
}

/// Everything a wrangler run needs besides the collaborators.
#[derive(Debug, Clone, Copy)]
pub struct Plan<'a> {
    pub checkpoint: &'a str,
    pub method_name: &'a str,
    pub input_bucket: &'a str,
    pub results_bucket: &'a str,
    pub common: &'a RuntimeCommon,
    /// Sentence used in the completion notification.
    pub summary: &'a str,
}

pub async fn execute(
    services: Services<'_>,
    plan: Plan<'_>,
    build_payload: impl FnOnce(Value) -> Value,
) -> Result<WranglerResponse, IngestError> {
    let common = plan.common;

    let input = read_json(services.store, plan.input_bucket, &common.in_file_name).await?;
    info!("Read from S3.");

    let payload = build_payload(input);
    let data = invoke_method(services.invoker, plan.method_name, &payload).await?;
    info!("Successfully invoked method.");

    save_data(services.store, services.queue, plan.results_bucket, common, data).await?;
    info!("Data ready for Results pipeline. Written to S3.");

    send_completion(services.topic, &common.sns_topic_arn, plan.checkpoint, plan.summary).await?;

    Ok(WranglerResponse {
        success: true,
        checkpoint: plan.checkpoint.to_string(),
    })
}

pub async fn read_json(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<Value, IngestError> {
    let bytes = store.read_object(bucket, key).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Invoke the method synchronously and return the `data` it produced.
pub async fn invoke_method(
    invoker: &dyn MethodInvoker,
    method_name: &str,
    payload: &Value,
) -> Result<String, IngestError> {
    let invocation = invoker
        .invoke(method_name, serde_json::to_vec(payload)?)
        .await?;

    if let Some(function_error) = invocation.function_error {
        return Err(IngestError::MethodFailure(format!(
            "{} failed with {}: {}",
            method_name,
            function_error,
            String::from_utf8_lossy(&invocation.payload)
        )));
    }

    let response: MethodResponse = serde_json::from_slice(&invocation.payload).map_err(|e| {
        IngestError::IncompleteResponse(format!("unreadable response from {} - {}", method_name, e))
    })?;
    debug!("JSON extracted from method response.");

    if !response.success {
        return Err(IngestError::MethodFailure(
            response.error.unwrap_or_else(|| format!("{} reported failure", method_name)),
        ));
    }

    response.data.ok_or_else(|| {
        IngestError::IncompleteResponse(format!("{} reported success without data", method_name))
    })
}

pub fn output_key(location: &str, file_name: &str) -> String {
    let location = location.trim_end_matches('/');
    if location.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", location, file_name)
    }
}

/// FIFO deduplication id: content digest plus the send time, so a re-run with
/// identical output is still delivered.
pub fn deduplication_id(message: &str) -> String {
    let digest = md5::compute(message.as_bytes());
    format!(
        "{:x}-{}",
        digest,
        chrono::Utc::now().format("%Y%m%d%H%M%S%6f")
    )
}

/// Write `data` to the results bucket and queue a pointer to it.
pub async fn save_data(
    store: &dyn ObjectStore,
    queue: &dyn QueueSink,
    bucket: &str,
    common: &RuntimeCommon,
    data: String,
) -> Result<(), IngestError> {
    let key = output_key(&common.location, &common.out_file_name);
    store.write_object(bucket, &key, data.into_bytes()).await?;

    let message = json!({"bucket": bucket, "key": key}).to_string();
    let deduplication_id = deduplication_id(&message);
    queue
        .send_message(
            &common.queue_url,
            message,
            &common.outgoing_message_group_id,
            &deduplication_id,
        )
        .await
}

pub async fn send_completion(
    topic: &dyn TopicPublisher,
    topic_arn: &str,
    checkpoint: &str,
    summary: &str,
) -> Result<(), IngestError> {
    let message = json!({
        "success": true,
        "module": "Ingest.",
        "checkpoint": checkpoint,
        "message": summary,
    });
    topic.publish(topic_arn, message.to_string()).await
}

/// Log a failed run and convert it into the error handed back to the runtime.
pub fn fail(err: IngestError, ctx: &ErrorContext<'_>) -> Error {
    let message = err.report(ctx);
    error!(kind = %err.kind(), "{}", message);
    Box::new(LambdaFailure {
        kind: err.kind(),
        message,
    })
}
