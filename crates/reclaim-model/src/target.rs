//! The three predicted quantities.

use std::fmt;

/// A prediction target. Each one has its own regressor artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    ResaleValue,
    RecycleValue,
    ReuseScore,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::ResaleValue, Target::RecycleValue, Target::ReuseScore];

    /// Name used in artifact file names and logs.
    pub fn name(self) -> &'static str {
        match self {
            Target::ResaleValue => "Resale_Value",
            Target::RecycleValue => "Recycle_Value",
            Target::ReuseScore => "Reuse_Score",
        }
    }

    /// Key used in the `/predict` response body.
    pub fn response_key(self) -> &'static str {
        match self {
            Target::ResaleValue => "resale_value",
            Target::RecycleValue => "recycle_score",
            Target::ReuseScore => "reuse_score",
        }
    }

    pub fn artifact_file(self) -> String {
        format!("{}_GradientBoosting_Model.json", self.name())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
