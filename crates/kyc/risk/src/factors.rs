use kyc_types::RiskLevel;
use serde::{Deserialize, Serialize};

/// Which bucket a factor came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Geographic,
    Documents,
    Identity,
    Business,
    Sanctions,
    Behavioral,
    System,
}

/// Qualitative weight of a factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// One weighted risk signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: FactorCategory,
    /// Stable machine-readable code, e.g. `high_risk_country`.
    pub factor: String,
    pub impact: Impact,
    pub score: f64,
    pub description: String,
}

impl RiskFactor {
    pub fn new(
        category: FactorCategory,
        factor: impl Into<String>,
        impact: Impact,
        score: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            factor: factor.into(),
            impact,
            score,
            description: description.into(),
        }
    }
}

/// Output of one risk assessment run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Clamped to [0, 100].
    pub risk_score: f64,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
    pub requires_manual_review: bool,
}
