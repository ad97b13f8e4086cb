mod holding;
mod report;
mod user;

pub use holding::Holding;
pub use report::{
    DistributionBucket, DiversificationAnalysis, DiversificationLevel, ExecutiveSummary,
    PerformanceStats, PortfolioStatus, Priority, Recommendation, ReportData, RiskAnalysis,
    RiskLevel, TopPerformer, TopPositionByValue, ValuedPosition, VolatilityLevel,
};
pub use user::User;
