use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod bricks;
pub mod clients;
pub mod error;
pub mod method;
pub mod periods;
pub mod schema;
pub mod services;
pub mod takeon;
pub mod wrangler;

pub use clients::AwsClients;

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

/// Which of the ingest functions this deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    TakeonWrangler,
    TakeonMethod,
    BrickTypeWrangler,
    BrickTypeMethod,
}

impl FromStr for Function {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "TakeonWrangler" => Ok(Function::TakeonWrangler),
            "TakeonMethod" => Ok(Function::TakeonMethod),
            "BrickTypeWrangler" => Ok(Function::BrickTypeWrangler),
            "BrickTypeMethod" => Ok(Function::BrickTypeMethod),
            other => Err(format!("Invalid or Unsupported ingest function {}", other)),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Function {
    pub fn from_env() -> Result<Function, String> {
        env::var("INGEST_FUNCTION")
            .map_err(|e| format!("INGEST_FUNCTION not set - {}", e))
            .and_then(|s| s.parse::<Function>())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_function_from_env() {
        temp_env::with_var("INGEST_FUNCTION", Some("BrickTypeMethod"), || {
            assert_eq!(Function::from_env().unwrap(), Function::BrickTypeMethod);
        });
        temp_env::with_var("INGEST_FUNCTION", Some("Takeon"), || {
            assert!(Function::from_env().is_err());
        });
        temp_env::with_var_unset("INGEST_FUNCTION", || {
            assert!(Function::from_env()
                .unwrap_err()
                .starts_with("INGEST_FUNCTION not set"));
        });
    }

    #[test]
    fn test_function_round_trips_through_display() {
        for function in [
            Function::TakeonWrangler,
            Function::TakeonMethod,
            Function::BrickTypeWrangler,
            Function::BrickTypeMethod,
        ] {
            assert_eq!(function.to_string().parse::<Function>().unwrap(), function);
        }
    }
}
