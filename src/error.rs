use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use std::fmt;

/// Coarse classification of a failure, used by the wranglers to report what
/// kind of problem stopped a pipeline run.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorKind {
    Transient,
    Configuration,
    Data,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("field '{0}' must not be blank")]
    Blank(String),
    #[error("invalid value for '{field}' - {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised by the method functions while reshaping data.
#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("Error validating runtime params: {0}")]
    Validation(#[from] ValidationError),
    #[error("input data does not match the expected structure at {location} - {source}")]
    Malformed {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    MissingKey(String),
    #[error("brick type {0} has no entry in brick_questions")]
    MissingCategory(i64),
    #[error("record {index} has an invalid brick type value: {value}")]
    InvalidCategory { index: usize, value: String },
    #[error("{0}")]
    General(String),
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Validation(_) | TransformError::MissingCategory(_) => {
                ErrorKind::Configuration
            }
            TransformError::Malformed { .. }
            | TransformError::MissingKey(_)
            | TransformError::InvalidCategory { .. } => ErrorKind::Data,
            TransformError::General(_) => ErrorKind::Unknown,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TransformError::Validation(_) => "Validation Error",
            TransformError::Malformed { .. } | TransformError::MissingKey(_) => "Key Error",
            TransformError::MissingCategory(_) => "Configuration Error",
            TransformError::InvalidCategory { .. } => "Data Error",
            TransformError::General(_) => "General Error",
        }
    }

    pub fn report(&self, ctx: &ErrorContext<'_>) -> String {
        ctx.describe(self.label(), self)
    }
}

/// Errors raised by the wranglers while moving data between storage, the
/// method function and the notification channels.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("Error validating parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error("{service} request failed - {message}")]
    Aws {
        kind: ErrorKind,
        service: &'static str,
        message: String,
    },
    #[error("{0}")]
    IncompleteResponse(String),
    #[error("{0}")]
    MethodFailure(String),
    #[error("invalid JSON - {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Validation(_) => ErrorKind::Configuration,
            IngestError::Aws { kind, .. } => *kind,
            IngestError::IncompleteResponse(_) => ErrorKind::Transient,
            IngestError::MethodFailure(_) | IngestError::Serialization(_) => ErrorKind::Data,
        }
    }

    fn label(&self) -> String {
        match self {
            IngestError::Validation(_) => "Validation Error".to_string(),
            IngestError::Aws { kind, .. } => format!("AWS Error ({})", kind),
            IngestError::IncompleteResponse(_) => {
                "Incomplete Lambda response encountered".to_string()
            }
            IngestError::MethodFailure(_) => "Method Failure".to_string(),
            IngestError::Serialization(_) => "Data Error".to_string(),
        }
    }

    /// A method failure already carries the method's own formatted message,
    /// so it is passed through untouched.
    pub fn report(&self, ctx: &ErrorContext<'_>) -> String {
        match self {
            IngestError::MethodFailure(message) => message.clone(),
            _ => ctx.describe(&self.label(), self),
        }
    }
}

/// Translate an AWS SDK failure into an [`IngestError`] with a classified kind.
pub fn aws_error<E, R>(service: &'static str, err: SdkError<E, R>) -> IngestError
where
    E: std::error::Error + 'static,
    R: fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorKind::Transient
        }
        SdkError::ConstructionFailure(_) | SdkError::ServiceError(_) => ErrorKind::Configuration,
        _ => ErrorKind::Unknown,
    };

    IngestError::Aws {
        kind,
        service,
        message: DisplayErrorContext(&err).to_string(),
    }
}

/// Error surfaced to the Lambda runtime when a wrangler gives up on a run.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct LambdaFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Identifies the invocation an error message belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub component: &'a str,
    pub run_id: &'a str,
    pub request_id: &'a str,
}

impl<'a> ErrorContext<'a> {
    pub fn new(component: &'a str, run_id: &'a str, request_id: &'a str) -> Self {
        ErrorContext {
            component,
            run_id,
            request_id,
        }
    }

    pub fn describe(&self, label: &str, details: &dyn fmt::Display) -> String {
        format!(
            "{} in {} |- {} | Request ID: {} | Run_id: {}",
            label, self.component, details, self.request_id, self.run_id
        )
    }
}
