//! Column-wise preprocessing artifact
//!
//! A [`Preprocessor`] is an ordered list of column transformers. Each one
//! reads a set of named columns from a [`Row`] and appends its encoded
//! values to the output vector:
//!
//! - `standard_scaler`: `(x - mean) / scale` per column
//! - `one_hot`: one indicator per known category per column
//! - `passthrough`: the numeric value unchanged
//! - `drop`: nothing
//!
//! # Example artifact
//! ```json
//! {
//!   "transformers": [
//!     { "name": "num", "columns": ["Weight_Kg", "Age_Months"],
//!       "kind": { "type": "standard_scaler", "mean": [2.0, 18.0], "scale": [1.5, 9.0] } },
//!     { "name": "cat", "columns": ["Plastic_Type"],
//!       "kind": { "type": "one_hot", "categories": [["HDPE", "PET"]], "handle_unknown": "ignore" } },
//!     { "name": "remainder", "columns": ["Condition"], "kind": { "type": "passthrough" } }
//!   ]
//! }
//! ```

use crate::error::PipelineError;
use crate::record::{Cell, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a one-hot encoder does with a category it has not seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Fail the transform.
    #[default]
    Error,
    /// Encode as all zeros.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformKind {
    StandardScaler {
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHot {
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: TransformKind,
}

/// Preprocessing artifact applied to an item row before inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub transformers: Vec<ColumnTransformer>,

    /// Prefix output names with the transformer name (`num__Weight_Kg`).
    #[serde(default = "default_verbose_names")]
    pub verbose_feature_names_out: bool,
}

fn default_verbose_names() -> bool {
    true
}

/// Output of [`Preprocessor::transform`]: one encoded row with column names.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

impl EncodedFeatures {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preprocessor {
    /// Check internal consistency. Returns a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.transformers.is_empty() {
            return Err("preprocessor has no transformers".into());
        }
        for t in &self.transformers {
            match &t.kind {
                TransformKind::StandardScaler { mean, scale } => {
                    if mean.len() != t.columns.len() || scale.len() != t.columns.len() {
                        return Err(format!(
                            "transformer '{}' has {} columns but {} means and {} scales",
                            t.name,
                            t.columns.len(),
                            mean.len(),
                            scale.len()
                        ));
                    }
                    if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                        return Err(format!(
                            "transformer '{}' has a zero or non-finite scale",
                            t.name
                        ));
                    }
                }
                TransformKind::OneHot { categories, .. } => {
                    if categories.len() != t.columns.len() {
                        return Err(format!(
                            "transformer '{}' has {} columns but {} category lists",
                            t.name,
                            t.columns.len(),
                            categories.len()
                        ));
                    }
                }
                TransformKind::Passthrough | TransformKind::Drop => {}
            }
        }
        Ok(())
    }

    /// Width of the encoded feature vector.
    pub fn n_features_out(&self) -> usize {
        self.transformers
            .iter()
            .map(|t| match &t.kind {
                TransformKind::StandardScaler { .. } | TransformKind::Passthrough => {
                    t.columns.len()
                }
                TransformKind::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
                TransformKind::Drop => 0,
            })
            .sum()
    }

    /// Output feature names, or `None` when they are not unique
    /// (possible with `verbose_feature_names_out: false`).
    pub fn feature_names_out(&self) -> Option<Vec<String>> {
        let mut names = Vec::with_capacity(self.n_features_out());
        for t in &self.transformers {
            let prefix = |base: String| {
                if self.verbose_feature_names_out {
                    format!("{}__{}", t.name, base)
                } else {
                    base
                }
            };
            match &t.kind {
                TransformKind::StandardScaler { .. } | TransformKind::Passthrough => {
                    names.extend(t.columns.iter().map(|c| prefix(c.clone())));
                }
                TransformKind::OneHot { categories, .. } => {
                    for (column, cats) in t.columns.iter().zip(categories) {
                        names.extend(cats.iter().map(|cat| prefix(format!("{column}_{cat}"))));
                    }
                }
                TransformKind::Drop => {}
            }
        }

        let mut seen = HashSet::with_capacity(names.len());
        if names.iter().all(|n| seen.insert(n.as_str())) {
            Some(names)
        } else {
            None
        }
    }

    /// Encode one row. Names fall back to `f0, f1, ...` when the artifact
    /// cannot provide unique ones.
    pub fn transform(&self, row: &Row) -> Result<EncodedFeatures, PipelineError> {
        let mut values = Vec::with_capacity(self.n_features_out());

        for t in &self.transformers {
            match &t.kind {
                TransformKind::StandardScaler { mean, scale } => {
                    for ((column, m), s) in t.columns.iter().zip(mean).zip(scale) {
                        let x = numeric_cell(row, column)?;
                        values.push((x - m) / s);
                    }
                }
                TransformKind::Passthrough => {
                    for column in &t.columns {
                        values.push(numeric_cell(row, column)?);
                    }
                }
                TransformKind::OneHot {
                    categories,
                    handle_unknown,
                } => {
                    for (column, cats) in t.columns.iter().zip(categories) {
                        let key = category_key(cell(row, column)?);
                        let hit = key
                            .as_deref()
                            .and_then(|k| cats.iter().position(|c| c == k));
                        if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                            return Err(PipelineError::UnknownCategory {
                                column: column.clone(),
                                value: key.unwrap_or_else(|| "None".to_string()),
                            });
                        }
                        values.extend(
                            (0..cats.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }),
                        );
                    }
                }
                TransformKind::Drop => {}
            }
        }

        let names = self
            .feature_names_out()
            .unwrap_or_else(|| (0..values.len()).map(|i| format!("f{i}")).collect());

        Ok(EncodedFeatures { names, values })
    }
}

fn cell<'a>(row: &'a Row, column: &str) -> Result<&'a Cell, PipelineError> {
    row.get(column)
        .ok_or_else(|| PipelineError::MissingColumn(column.to_string()))
}

fn numeric_cell(row: &Row, column: &str) -> Result<f64, PipelineError> {
    match cell(row, column)? {
        Cell::Number(x) => Ok(*x),
        Cell::Missing => Err(PipelineError::MissingValue {
            column: column.to_string(),
        }),
        Cell::Text(s) => Err(PipelineError::NotNumeric {
            column: column.to_string(),
            value: s.clone(),
        }),
    }
}

/// Category label of a cell. Whole numbers print without a fraction so an
/// ordinal like `3.0` matches the category `"3"`.
fn category_key(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Missing => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => Some(format!("{}", *x as i64)),
        Cell::Number(x) => Some(x.to_string()),
    }
}
