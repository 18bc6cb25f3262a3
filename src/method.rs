use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ErrorContext, TransformError};

/// What a method function returns to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResponse {
    pub success: bool,
    /// JSON text of the output record array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MethodResponse {
    pub fn ok(data: String) -> Self {
        MethodResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        MethodResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Turn the outcome of a transform into a method response. Failures are
/// logged and reported in-band; the caller never sees a raw error.
pub fn respond<T: Serialize>(
    ctx: &ErrorContext<'_>,
    outcome: Result<Vec<T>, TransformError>,
) -> MethodResponse {
    let serialized = outcome.and_then(|records| {
        serde_json::to_string(&records)
            .map_err(|e| TransformError::General(format!("failed to serialize output - {}", e)))
    });

    match serialized {
        Ok(data) => {
            info!("Successfully completed: {}", ctx.component);
            MethodResponse::ok(data)
        }
        Err(err) => {
            let message = err.report(ctx);
            error!(kind = %err.kind(), "{}", message);
            MethodResponse::failed(message)
        }
    }
}
