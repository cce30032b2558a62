//! Prediction pipeline
//!
//! [`Predictor`] has two modes, chosen by whether its [`ModelBundle`] is
//! loaded:
//!
//! - **model-backed**: map the condition to its ordinal, run the row through
//!   the preprocessor, then through each of the three regressors
//! - **fallback**: a closed-form heuristic over price, weight and age that
//!   never fails
//!
//! The mode never changes during a call.

use crate::artifacts::ModelBundle;
use crate::error::PipelineError;
use crate::record::{condition_ordinal, Cell, ItemRecord, CONDITION};
use crate::target::Target;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    ModelBacked,
    Fallback,
}

/// Scores for all three targets and the mode that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub scores: BTreeMap<Target, f64>,
    pub mode: PredictionMode,
}

impl Prediction {
    pub fn score(&self, target: Target) -> Option<f64> {
        self.scores.get(&target).copied()
    }

    pub fn models_loaded(&self) -> bool {
        self.mode == PredictionMode::ModelBacked
    }
}

/// Scores item records against a shared, read-only model bundle.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
}

impl Predictor {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn mode(&self) -> PredictionMode {
        if self.bundle.is_loaded() {
            PredictionMode::ModelBacked
        } else {
            PredictionMode::Fallback
        }
    }

    /// Score one record. Only the model-backed mode can fail.
    pub fn predict(&self, record: &ItemRecord) -> Result<Prediction, PipelineError> {
        let Some(artifacts) = self.bundle.artifacts() else {
            return Ok(Prediction {
                scores: fallback_scores(record),
                mode: PredictionMode::Fallback,
            });
        };

        let mut row = record.to_row();
        let ordinal = condition_ordinal(record.condition.as_deref());
        row.insert(CONDITION.to_string(), Cell::Number(f64::from(ordinal)));

        let encoded = artifacts.preprocessor.transform(&row)?;
        debug!(features = encoded.len(), "Encoded item row");

        let mut scores = BTreeMap::new();
        for (target, model) in &artifacts.models {
            let value = model
                .predict(&encoded)
                .map_err(|source| PipelineError::Inference {
                    target: *target,
                    source,
                })?;
            scores.insert(*target, value);
        }

        Ok(Prediction {
            scores,
            mode: PredictionMode::ModelBacked,
        })
    }
}

/// Heuristic scores used when no models are loaded. Missing inputs count as
/// zero and every score is clamped at zero and rounded to 2 decimals.
pub fn fallback_scores(record: &ItemRecord) -> BTreeMap<Target, f64> {
    let price = record.original_price.unwrap_or(0.0);
    let weight = record.weight_kg.unwrap_or(0.0);
    let age = record.age_months.unwrap_or(0.0);

    BTreeMap::from([
        (Target::ResaleValue, clamp_round(price * 0.2 - age * 0.1)),
        (Target::RecycleValue, clamp_round(weight * 12.0)),
        (Target::ReuseScore, clamp_round(100.0 - age)),
    ])
}

/// Clamp at zero (never `-0.0`) and round to 2 decimals.
fn clamp_round(x: f64) -> f64 {
    round2(x.max(0.0) + 0.0)
}

fn round2(x: f64) -> f64 {
    let scaled = x * 100.0;
    // Magnitudes this large carry no fractional part.
    if !scaled.is_finite() {
        return x;
    }
    scaled.round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{ColumnTransformer, HandleUnknown, Preprocessor, TransformKind};
    use crate::record::{PLASTIC_TYPE, WEIGHT_KG};
    use crate::regressor::{GradientBoostingRegressor, RegressionTree, TreeNode};

    fn record(price: Option<f64>, age: Option<f64>, weight: Option<f64>) -> ItemRecord {
        ItemRecord {
            original_price: price,
            age_months: age,
            weight_kg: weight,
            ..Default::default()
        }
    }

    fn fallback_predictor() -> Predictor {
        Predictor::new(Arc::new(ModelBundle::unloaded()))
    }

    #[test]
    fn test_fallback_reference_values() {
        let scores = fallback_scores(&record(Some(100.0), Some(10.0), Some(5.0)));
        assert_eq!(scores[&Target::ResaleValue], 19.0);
        assert_eq!(scores[&Target::RecycleValue], 60.0);
        assert_eq!(scores[&Target::ReuseScore], 90.0);
    }

    #[test]
    fn test_fallback_never_negative() {
        let scores = fallback_scores(&record(Some(-50.0), Some(200.0), Some(-3.0)));
        assert_eq!(scores[&Target::ResaleValue], 0.0);
        assert_eq!(scores[&Target::RecycleValue], 0.0);
        assert_eq!(scores[&Target::ReuseScore], 0.0);
    }

    #[test]
    fn test_fallback_rounds_to_two_decimals() {
        let scores = fallback_scores(&record(Some(33.333), Some(1.0), Some(0.1234)));
        assert_eq!(scores[&Target::ResaleValue], 6.57);
        assert_eq!(scores[&Target::RecycleValue], 1.48);
        assert_eq!(scores[&Target::ReuseScore], 99.0);
    }

    #[test]
    fn test_fallback_huge_inputs_stay_finite() {
        let scores = fallback_scores(&record(Some(1e308), None, Some(1e307)));
        assert_eq!(scores[&Target::ResaleValue], 1e308 * 0.2);
        assert_eq!(scores[&Target::RecycleValue], 1e307 * 12.0);
        assert!(scores.values().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fallback_negative_zero_is_positive() {
        let scores = fallback_scores(&record(Some(-0.0), None, Some(-0.0)));
        assert!(scores[&Target::RecycleValue].is_sign_positive());
        assert!(scores[&Target::ResaleValue].is_sign_positive());
    }

    #[test]
    fn test_fallback_missing_fields_are_zero() {
        let scores = fallback_scores(&ItemRecord::default());
        assert_eq!(scores[&Target::ResaleValue], 0.0);
        assert_eq!(scores[&Target::RecycleValue], 0.0);
        assert_eq!(scores[&Target::ReuseScore], 100.0);
    }

    #[test]
    fn test_unloaded_predict_never_fails() {
        let predictor = fallback_predictor();
        assert_eq!(predictor.mode(), PredictionMode::Fallback);
        for mask in 0u8..8 {
            let rec = record(
                (mask & 1 != 0).then_some(20.0),
                (mask & 2 != 0).then_some(6.0),
                (mask & 4 != 0).then_some(0.5),
            );
            let prediction = predictor.predict(&rec).unwrap();
            assert!(!prediction.models_loaded());
            assert_eq!(prediction.scores.len(), 3);
        }
    }

    fn constant_model(init: f64, n_features: usize) -> GradientBoostingRegressor {
        GradientBoostingRegressor {
            init,
            learning_rate: 1.0,
            n_features,
            feature_names: None,
            trees: vec![RegressionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 2,
                        threshold: 2.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 0.0 },
                    TreeNode::Leaf { value: 1.0 },
                ],
            }],
        }
    }

    fn loaded_predictor(handle_unknown: HandleUnknown) -> Predictor {
        let preprocessor = Preprocessor {
            transformers: vec![
                ColumnTransformer {
                    name: "cat".into(),
                    columns: vec![PLASTIC_TYPE.into()],
                    kind: TransformKind::OneHot {
                        categories: vec![vec!["PET".into()]],
                        handle_unknown,
                    },
                },
                ColumnTransformer {
                    name: "num".into(),
                    columns: vec![WEIGHT_KG.into()],
                    kind: TransformKind::Passthrough,
                },
                ColumnTransformer {
                    name: "ord".into(),
                    columns: vec![CONDITION.into()],
                    kind: TransformKind::Passthrough,
                },
            ],
            verbose_feature_names_out: true,
        };
        let models = BTreeMap::from([
            (Target::ResaleValue, constant_model(10.0, 3)),
            (Target::RecycleValue, constant_model(20.0, 3)),
            (Target::ReuseScore, constant_model(30.0, 3)),
        ]);
        Predictor::new(Arc::new(ModelBundle::from_parts(preprocessor, models).unwrap()))
    }

    #[test]
    fn test_model_backed_uses_condition_ordinal() {
        let predictor = loaded_predictor(HandleUnknown::Ignore);
        assert_eq!(predictor.mode(), PredictionMode::ModelBacked);

        let mut rec = ItemRecord {
            plastic_type: Some("PET".into()),
            condition: Some(" New ".into()),
            weight_kg: Some(1.0),
            ..Default::default()
        };
        // "new" -> 4, above the 2.5 split
        let prediction = predictor.predict(&rec).unwrap();
        assert!(prediction.models_loaded());
        assert_eq!(prediction.score(Target::ResaleValue), Some(11.0));
        assert_eq!(prediction.score(Target::RecycleValue), Some(21.0));
        assert_eq!(prediction.score(Target::ReuseScore), Some(31.0));

        // unrecognised condition -> 0, below the split
        rec.condition = Some("shattered".into());
        let prediction = predictor.predict(&rec).unwrap();
        assert_eq!(prediction.score(Target::ResaleValue), Some(10.0));
    }

    #[test]
    fn test_model_backed_failure_propagates() {
        let predictor = loaded_predictor(HandleUnknown::Error);
        let rec = ItemRecord {
            plastic_type: Some("PVC".into()),
            weight_kg: Some(1.0),
            ..Default::default()
        };
        let err = predictor.predict(&rec).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { .. }));
    }

    #[test]
    fn test_model_backed_missing_weight_fails() {
        let predictor = loaded_predictor(HandleUnknown::Ignore);
        let err = predictor.predict(&ItemRecord::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingValue {
                column: WEIGHT_KG.into()
            }
        );
    }
}
