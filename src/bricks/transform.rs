use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::TransformError;

/// A flat respondent record.
pub type Record = Map<String, Value>;

/// Configuration bundle for [`expand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickParameters {
    pub brick_types: Vec<i64>,
    pub brick_type_column: String,
    /// brick type -> shared question -> brick type specific column
    pub brick_questions: IndexMap<String, IndexMap<String, String>>,
}

type Categories<'a> = Vec<(i64, &'a IndexMap<String, String>)>;

impl BrickParameters {
    fn categories(&self) -> Result<Categories<'_>, TransformError> {
        self.brick_types
            .iter()
            .unique()
            .map(|category| {
                self.brick_questions
                    .get(&category.to_string())
                    .map(|questions| (*category, questions))
                    .ok_or(TransformError::MissingCategory(*category))
            })
            .collect()
    }
}

/// Split the shared question columns of each record into one set of columns
/// per brick type. Only the respondent's own brick type keeps its answers; the
/// others are zeroed and the shared columns are dropped.
pub fn expand(records: &[Record], params: &BrickParameters) -> Result<Vec<Record>, TransformError> {
    let categories = params.categories()?;
    let all_shared: Vec<&String> = categories
        .iter()
        .flat_map(|(_, questions)| questions.keys())
        .unique()
        .collect();

    let output = records
        .iter()
        .enumerate()
        .map(|(index, record)| expand_record(index, record, params, &categories, &all_shared))
        .collect::<Result<Vec<_>, _>>()?;

    info!("Successfully expanded brick data for {} records.", output.len());
    Ok(output)
}

fn expand_record(
    index: usize,
    record: &Record,
    params: &BrickParameters,
    categories: &Categories<'_>,
    all_shared: &[&String],
) -> Result<Record, TransformError> {
    let column = &params.brick_type_column;
    let value = record
        .get(column)
        .ok_or_else(|| TransformError::MissingKey(format!("record {} is missing '{}'", index, column)))?;
    let own = brick_type(value).ok_or_else(|| TransformError::InvalidCategory {
        index,
        value: value.to_string(),
    })?;

    let shared: Vec<&String> = match categories.iter().find(|(category, _)| *category == own) {
        Some((_, questions)) => questions.keys().collect(),
        None => {
            warn!(
                "record {} has unconfigured brick type {}, zeroing every brick type",
                index, own
            );
            all_shared.to_vec()
        }
    };

    let mut output: Record = record
        .iter()
        .filter(|(key, _)| !shared.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for (category, questions) in categories {
        for (question, target) in questions.iter() {
            let value = if *category == own {
                record.get(question).cloned().ok_or_else(|| {
                    TransformError::MissingKey(format!(
                        "record {} of brick type {} is missing '{}'",
                        index, own, question
                    ))
                })?
            } else {
                Value::from(0)
            };
            output.insert(target.clone(), value);
        }
    }

    Ok(output)
}

fn brick_type(value: &Value) -> Option<i64> {
    match value {
        // whole floats such as 3.0 count as integers
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
