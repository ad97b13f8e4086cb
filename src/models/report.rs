use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A holding valued against the current market price.
///
/// When the price lookup fails `current_price` is `None` and the position is
/// carried as a zero-yield entry: `current_value == invested_value`,
/// `gain_loss == 0`. It still counts toward invested totals but is excluded
/// from percentage-based rankings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuedPosition {
    pub ticker: String,
    pub name: String,
    pub asset_type: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: Option<f64>,
    pub invested_value: f64,
    pub current_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percentage: f64,
    pub days_held: i64,
}

impl ValuedPosition {
    pub fn is_priced(&self) -> bool {
        self.current_price.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBucket {
    pub asset_type: String,
    pub total_value: f64,
    pub percentage: f64,
    pub position_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioStatus {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub total_value: f64,
    pub total_invested: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percentage: f64,
    pub total_positions: usize,
    pub status: PortfolioStatus,
    pub diversification_score: u8,
    pub risk_level: RiskLevel,
    pub max_concentration: f64,
    pub best_asset: String,
    pub worst_asset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub ticker: String,
    pub name: String,
    pub asset_type: String,
    pub gain_loss: f64,
    pub gain_loss_percentage: f64,
    pub current_value: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub winners_count: usize,
    pub losers_count: usize,
    pub winners_percentage: f64,
    pub average_gain: f64,
    pub best_gain_amount: f64,
    pub best_gain_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiversificationLevel {
    Low,
    Medium,
    Good,
    Excellent,
}

impl DiversificationLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => DiversificationLevel::Excellent,
            60..=79 => DiversificationLevel::Good,
            40..=59 => DiversificationLevel::Medium,
            _ => DiversificationLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiversificationLevel::Low => "Low",
            DiversificationLevel::Medium => "Medium",
            DiversificationLevel::Good => "Good",
            DiversificationLevel::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPositionByValue {
    pub ticker: String,
    pub name: String,
    pub percentage: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversificationAnalysis {
    pub score: u8,
    pub level: DiversificationLevel,
    pub top_positions: Vec<TopPositionByValue>,
    pub max_concentration: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => RiskLevel::VeryHigh,
            50..=69 => RiskLevel::High,
            30..=49 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl VolatilityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            VolatilityLevel::Low => "Low",
            VolatilityLevel::Medium => "Medium",
            VolatilityLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub score: u8,
    pub level: RiskLevel,
    pub volatility: VolatilityLevel,
    pub factors: Vec<String>,
    pub crypto_exposure: f64,
    pub warnings: Vec<String>,
}

/// Recommendation priority. Ordering is High < Medium < Low so a stable sort
/// by priority yields the High → Medium → Low output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub action: String,
    pub icon: String,
}

/// The compiled report. Built once per request, consumed by the renderer,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub user_email: String,
    pub generated_at: DateTime<Utc>,
    pub report_id: String,
    pub version: String,
    pub summary: ExecutiveSummary,
    pub distribution: Vec<DistributionBucket>,
    pub positions: Vec<ValuedPosition>,
    pub top_performers: Vec<TopPerformer>,
    pub bottom_performers: Vec<TopPerformer>,
    pub performance_stats: PerformanceStats,
    pub diversification: DiversificationAnalysis,
    pub risk: RiskAnalysis,
    pub recommendations: Vec<Recommendation>,
}
