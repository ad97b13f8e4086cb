use crate::db;
use crate::errors::AppError;
use crate::external::price_oracle::PriceOracle;
use crate::models::{
    DistributionBucket, DiversificationAnalysis, DiversificationLevel, ExecutiveSummary,
    PerformanceStats, PortfolioStatus, Priority, Recommendation, ReportData, RiskAnalysis,
    RiskLevel, TopPerformer, TopPositionByValue, ValuedPosition, VolatilityLevel,
};
use crate::services::valuation_service;
use chrono::Utc;
use sqlx::PgPool;
use std::cmp::Ordering;
use uuid::Uuid;

const REPORT_VERSION: &str = "2.0";

/// Runs the full analysis pipeline for one user and compiles the immutable
/// report payload. Refuses to compile an empty portfolio.
pub async fn generate_report_data(
    pool: &PgPool,
    oracle: &dyn PriceOracle,
    user_id: Uuid,
) -> Result<ReportData, AppError> {
    let holdings = db::holding_queries::fetch_for_user(pool, user_id).await?;
    if holdings.is_empty() {
        return Err(AppError::EmptyPortfolio);
    }

    let user = db::user_queries::fetch_user(pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let positions = valuation_service::value_holdings(&holdings, oracle).await;
    Ok(compile_report(user.email, user_id, positions))
}

/// Pure compilation step: everything after prices are resolved.
pub fn compile_report(
    user_email: String,
    user_id: Uuid,
    positions: Vec<ValuedPosition>,
) -> ReportData {
    let distribution = valuation_service::aggregate_distribution(&positions);
    let diversification = analyze_diversification(&positions);
    let risk = analyze_risk(&distribution, &diversification);
    let (top_performers, bottom_performers, performance_stats) = rank_performance(&positions);
    let summary = executive_summary(&positions, &diversification, &risk);
    let recommendations = generate_recommendations(&diversification, &risk, &positions);

    let generated_at = Utc::now();
    let user_fragment: String = user_id.simple().to_string().chars().take(8).collect();
    let report_id = format!("RPT-{}-{}", generated_at.timestamp_millis(), user_fragment);

    ReportData {
        user_email,
        generated_at,
        report_id,
        version: REPORT_VERSION.to_string(),
        summary,
        distribution,
        positions,
        top_performers,
        bottom_performers,
        performance_stats,
        diversification,
        risk,
        recommendations,
    }
}

fn total_current_value(positions: &[ValuedPosition]) -> f64 {
    positions.iter().map(|p| p.current_value).sum()
}

/// Largest single-position share of the portfolio, in percent.
fn max_concentration(positions: &[ValuedPosition]) -> f64 {
    let total = total_current_value(positions);
    if total <= 0.0 {
        return 0.0;
    }
    positions
        .iter()
        .map(|p| p.current_value / total * 100.0)
        .fold(0.0, f64::max)
}

fn distinct_asset_types(positions: &[ValuedPosition]) -> usize {
    let mut types: Vec<&str> = positions.iter().map(|p| p.asset_type.as_str()).collect();
    types.sort_unstable();
    types.dedup();
    types.len()
}

/// Diversification score out of 100, from three independently capped factors:
/// breadth (40), concentration tier (40) and asset-type diversity (20).
/// Tier boundaries are strict less-than.
pub fn diversification_score(positions: &[ValuedPosition]) -> u8 {
    let breadth = (positions.len() as f64 / 20.0 * 40.0).min(40.0);

    let concentration = max_concentration(positions);
    let concentration_points = if concentration < 10.0 {
        40.0
    } else if concentration < 20.0 {
        30.0
    } else if concentration < 30.0 {
        20.0
    } else {
        10.0
    };

    let type_points = (distinct_asset_types(positions) as f64 / 5.0 * 20.0).min(20.0);

    (breadth + concentration_points + type_points).round().min(100.0) as u8
}

pub fn analyze_diversification(positions: &[ValuedPosition]) -> DiversificationAnalysis {
    let score = diversification_score(positions);
    let level = DiversificationLevel::from_score(score);
    let total = total_current_value(positions);

    let mut by_value: Vec<&ValuedPosition> = positions.iter().collect();
    // Stable sort keeps original order between equal values.
    by_value.sort_by(|a, b| {
        b.current_value
            .partial_cmp(&a.current_value)
            .unwrap_or(Ordering::Equal)
    });

    let top_positions = by_value
        .iter()
        .take(10)
        .map(|p| TopPositionByValue {
            ticker: p.ticker.clone(),
            name: p.name.clone(),
            percentage: if total > 0.0 {
                p.current_value / total * 100.0
            } else {
                0.0
            },
            value: p.current_value,
        })
        .collect();

    let recommendation = match score {
        0..=39 => "Your portfolio has low diversification. Consider adding more positions across different sectors.",
        40..=59 => "Your diversification is moderate. You could improve it by adding positions of other sectors or asset types.",
        60..=79 => "Your portfolio is well diversified. Keep this level or improve it slightly.",
        _ => "Excellent diversification. Your portfolio is well balanced across assets.",
    }
    .to_string();

    DiversificationAnalysis {
        score,
        level,
        top_positions,
        max_concentration: max_concentration(positions),
        recommendation,
    }
}

/// Risk score from concentration (40), crypto exposure (30) and
/// diversification deficit (30). Factor and warning lists always carry at
/// least one entry so the renderer has a bullet to draw.
pub fn analyze_risk(
    distribution: &[DistributionBucket],
    diversification: &DiversificationAnalysis,
) -> RiskAnalysis {
    let mut score = 0u8;
    let mut factors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let concentration = diversification.max_concentration;
    if concentration > 30.0 {
        score += 40;
        factors.push("High concentration in a single position".to_string());
        warnings.push(format!(
            "One position represents {:.1}% of the portfolio",
            concentration
        ));
    } else if concentration > 20.0 {
        score += 25;
        factors.push("Moderate concentration".to_string());
    } else if concentration > 10.0 {
        score += 15;
    }

    let crypto_exposure = distribution
        .iter()
        .find(|b| b.asset_type.to_lowercase().contains("crypto"))
        .map(|b| b.percentage)
        .unwrap_or(0.0);

    if crypto_exposure > 50.0 {
        score += 30;
        factors.push("Very high crypto exposure".to_string());
        warnings.push(format!(
            "{:.1}% of the portfolio is in crypto (high volatility)",
            crypto_exposure
        ));
    } else if crypto_exposure > 30.0 {
        score += 20;
        factors.push("High crypto exposure".to_string());
    } else if crypto_exposure > 15.0 {
        score += 10;
        factors.push("Moderate crypto exposure".to_string());
    }

    if diversification.score < 40 {
        score += 30;
        factors.push("Low diversification".to_string());
        warnings.push("Insufficient diversification increases risk".to_string());
    } else if diversification.score < 60 {
        score += 15;
        factors.push("Limited diversification".to_string());
    }

    let volatility = if crypto_exposure > 40.0 || concentration > 40.0 {
        VolatilityLevel::High
    } else if crypto_exposure > 20.0 || concentration > 25.0 {
        VolatilityLevel::Medium
    } else {
        VolatilityLevel::Low
    };

    if factors.is_empty() {
        factors.push("Balanced portfolio".to_string());
    }
    if warnings.is_empty() {
        warnings.push("No significant warnings".to_string());
    }

    RiskAnalysis {
        score,
        level: RiskLevel::from_score(score),
        volatility,
        factors,
        crypto_exposure,
        warnings,
    }
}

/// Ranks positions by absolute gain. Unpriced positions carry no signal and
/// are left out of both lists, but still count toward the winner percentage
/// denominator.
pub fn rank_performance(
    positions: &[ValuedPosition],
) -> (Vec<TopPerformer>, Vec<TopPerformer>, PerformanceStats) {
    let mut priced: Vec<&ValuedPosition> = positions.iter().filter(|p| p.is_priced()).collect();
    priced.sort_by(|a, b| {
        b.gain_loss
            .partial_cmp(&a.gain_loss)
            .unwrap_or(Ordering::Equal)
    });

    let as_performer = |p: &&ValuedPosition| TopPerformer {
        ticker: p.ticker.clone(),
        name: p.name.clone(),
        asset_type: p.asset_type.clone(),
        gain_loss: p.gain_loss,
        gain_loss_percentage: p.gain_loss_percentage,
        current_value: p.current_value,
        quantity: p.quantity,
    };

    let top_performers: Vec<TopPerformer> = priced.iter().take(5).map(as_performer).collect();
    // Worst-first: walk the descending ranking from the tail.
    let bottom_performers: Vec<TopPerformer> =
        priced.iter().rev().take(5).map(as_performer).collect();

    let winners: Vec<&&ValuedPosition> = priced.iter().filter(|p| p.gain_loss > 0.0).collect();
    let losers_count = priced.iter().filter(|p| p.gain_loss < 0.0).count();

    let winners_percentage = if positions.is_empty() {
        0.0
    } else {
        winners.len() as f64 / positions.len() as f64 * 100.0
    };

    let average_gain = if winners.is_empty() {
        0.0
    } else {
        winners.iter().map(|p| p.gain_loss).sum::<f64>() / winners.len() as f64
    };

    let stats = PerformanceStats {
        winners_count: winners.len(),
        losers_count,
        winners_percentage,
        average_gain,
        // For an all-losing portfolio this is the least negative gain.
        best_gain_amount: priced
            .iter()
            .map(|p| p.gain_loss)
            .reduce(f64::max)
            .unwrap_or(0.0),
        best_gain_percentage: priced
            .iter()
            .map(|p| p.gain_loss_percentage)
            .reduce(f64::max)
            .unwrap_or(0.0),
    };

    (top_performers, bottom_performers, stats)
}

pub fn executive_summary(
    positions: &[ValuedPosition],
    diversification: &DiversificationAnalysis,
    risk: &RiskAnalysis,
) -> ExecutiveSummary {
    let total_value = total_current_value(positions);
    let total_invested: f64 = positions.iter().map(|p| p.invested_value).sum();
    let total_gain_loss = total_value - total_invested;
    let total_gain_loss_percentage = if total_invested > 0.0 {
        total_gain_loss / total_invested * 100.0
    } else {
        0.0
    };

    let mut by_percentage: Vec<&ValuedPosition> =
        positions.iter().filter(|p| p.is_priced()).collect();
    by_percentage.sort_by(|a, b| {
        b.gain_loss_percentage
            .partial_cmp(&a.gain_loss_percentage)
            .unwrap_or(Ordering::Equal)
    });

    let best_asset = by_percentage
        .first()
        .map(|p| format!("{} ({:+.1}%)", p.ticker, p.gain_loss_percentage))
        .unwrap_or_else(|| "N/A".to_string());
    let worst_asset = by_percentage
        .last()
        .map(|p| format!("{} ({:+.1}%)", p.ticker, p.gain_loss_percentage))
        .unwrap_or_else(|| "N/A".to_string());

    ExecutiveSummary {
        total_value,
        total_invested,
        total_gain_loss,
        total_gain_loss_percentage,
        total_positions: positions.len(),
        status: if total_gain_loss >= 0.0 {
            PortfolioStatus::Positive
        } else {
            PortfolioStatus::Negative
        },
        diversification_score: diversification.score,
        risk_level: risk.level,
        max_concentration: diversification.max_concentration,
        best_asset,
        worst_asset,
    }
}

/// Rule-based recommendations, sorted High → Medium → Low. The list is never
/// empty: when no rule fires a single "stay the course" entry is emitted.
pub fn generate_recommendations(
    diversification: &DiversificationAnalysis,
    risk: &RiskAnalysis,
    positions: &[ValuedPosition],
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = Vec::new();

    if diversification.max_concentration > 25.0 {
        if let Some(top) = diversification.top_positions.first() {
            recommendations.push(Recommendation {
                priority: Priority::High,
                title: "Reduce Concentration".to_string(),
                description: format!(
                    "Your largest position represents {:.1}% of the portfolio. This significantly increases risk.",
                    diversification.max_concentration
                ),
                action: format!(
                    "Consider selling 5-10% of {} and redistributing into 2-3 different positions. Aim for a maximum of 15% per position.",
                    top.ticker
                ),
                icon: "⚠️".to_string(),
            });
        }
    }

    let losing: Vec<&ValuedPosition> = positions
        .iter()
        .filter(|p| p.gain_loss_percentage < -10.0)
        .collect();
    if !losing.is_empty() {
        let worst = losing.iter().fold(losing[0], |acc, p| {
            if p.gain_loss_percentage < acc.gain_loss_percentage {
                p
            } else {
                acc
            }
        });
        recommendations.push(Recommendation {
            priority: if losing.len() > 2 {
                Priority::High
            } else {
                Priority::Medium
            },
            title: "Review Losing Positions".to_string(),
            description: format!(
                "You have {} position(s) down more than 10%. {} is at {:.1}%.",
                losing.len(),
                worst.ticker,
                worst.gain_loss_percentage
            ),
            action: format!(
                "Review why {} is falling. Consider a stop-loss at -20% or exiting if conditions do not improve.",
                worst.ticker
            ),
            icon: "📉".to_string(),
        });
    }

    if diversification.score < 60 {
        recommendations.push(Recommendation {
            priority: if diversification.score < 40 {
                Priority::High
            } else {
                Priority::Medium
            },
            title: "Increase Diversification".to_string(),
            description: format!(
                "Your diversification score is {}/100 ({}). This increases portfolio risk.",
                diversification.score,
                diversification.level.label()
            ),
            action: "Add 3-5 positions from different sectors. Consider bonds or ETFs for stability. Target a score of 70+.".to_string(),
            icon: "📊".to_string(),
        });
    }

    let type_count = distinct_asset_types(positions);
    if type_count < 3 {
        let present: Vec<String> = positions
            .iter()
            .map(|p| p.asset_type.to_lowercase())
            .collect();
        let missing: Vec<&str> = [("bond", "Bonds"), ("stock", "Stocks"), ("crypto", "Crypto (in moderation)")]
            .iter()
            .filter(|(needle, _)| !present.iter().any(|t| t.contains(needle)))
            .map(|(_, label)| *label)
            .collect();

        recommendations.push(Recommendation {
            priority: Priority::Medium,
            title: "Diversify by Asset Type".to_string(),
            description: format!(
                "You only hold {} asset type(s). Broader diversification reduces risk.",
                type_count
            ),
            action: format!(
                "Consider adding {} to balance the portfolio.",
                missing.join(", ")
            ),
            icon: "🎯".to_string(),
        });
    }

    if risk.crypto_exposure > 30.0 {
        recommendations.push(Recommendation {
            priority: Priority::High,
            title: "Reduce Crypto Exposure".to_string(),
            description: format!(
                "{:.1}% of the portfolio is in crypto. This drives high volatility.",
                risk.crypto_exposure
            ),
            action: "Reduce crypto exposure to 15-20% of the portfolio. Move part of the capital into more stable assets such as bonds or blue-chip stocks.".to_string(),
            icon: "⚠️".to_string(),
        });
    }

    let big_winners: Vec<&ValuedPosition> = positions
        .iter()
        .filter(|p| p.gain_loss_percentage > 50.0)
        .collect();
    if let Some(first) = big_winners.first() {
        recommendations.push(Recommendation {
            priority: Priority::Low,
            title: "Consider Taking Profits".to_string(),
            description: format!(
                "You have {} position(s) up more than 50%. {} is at {:+.1}%.",
                big_winners.len(),
                first.ticker,
                first.gain_loss_percentage
            ),
            action: format!(
                "Consider taking partial profits (20-30%) on {} to lock in gains and reinvest elsewhere.",
                first.ticker
            ),
            icon: "💰".to_string(),
        });
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            priority: Priority::Low,
            title: "Maintain Current Strategy".to_string(),
            description: "Your portfolio is well balanced with good diversification and controlled risk.".to_string(),
            action: "Keep monitoring regularly and rebalance quarterly to hold the target distribution.".to_string(),
            icon: "✅".to_string(),
        });
    }

    // Stable sort preserves rule-evaluation order within each tier.
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(ticker: &str, asset_type: &str, invested: f64, current: f64) -> ValuedPosition {
        ValuedPosition {
            ticker: ticker.to_string(),
            name: format!("{} Inc", ticker),
            asset_type: asset_type.to_string(),
            quantity: 1.0,
            purchase_price: invested,
            current_price: Some(current),
            invested_value: invested,
            current_value: current,
            gain_loss: current - invested,
            gain_loss_percentage: if invested > 0.0 {
                (current - invested) / invested * 100.0
            } else {
                0.0
            },
            days_held: 30,
        }
    }

    fn unpriced(ticker: &str, asset_type: &str, invested: f64) -> ValuedPosition {
        ValuedPosition {
            current_price: None,
            current_value: invested,
            gain_loss: 0.0,
            gain_loss_percentage: 0.0,
            ..position(ticker, asset_type, invested, invested)
        }
    }

    #[test]
    fn test_single_position_portfolio_scores_low() {
        // 100% concentration lands in the >30% tier (10 pts), breadth is
        // 1/20 of 40, one type gives 4 pts.
        let positions = vec![position("AAPL", "Stock", 1000.0, 1000.0)];
        let analysis = analyze_diversification(&positions);

        assert_eq!(analysis.score, 16);
        assert_eq!(analysis.level, DiversificationLevel::Low);
        assert!((analysis.max_concentration - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_five_equal_positions_across_five_types_score_50() {
        // 20% concentration is not < 20, so it falls to the < 30 tier (20),
        // breadth 5/20*40 = 10, types 5/5*20 = 20.
        let positions = vec![
            position("A", "Stock", 100.0, 100.0),
            position("B", "Crypto", 100.0, 100.0),
            position("C", "Bond", 100.0, 100.0),
            position("D", "Fund", 100.0, 100.0),
            position("E", "ETF", 100.0, 100.0),
        ];
        let analysis = analyze_diversification(&positions);

        assert_eq!(analysis.score, 50);
        assert_eq!(analysis.level, DiversificationLevel::Medium);
    }

    #[test]
    fn test_diversification_monotone_in_type_count() {
        let two_types = vec![
            position("A", "Stock", 100.0, 100.0),
            position("B", "Stock", 100.0, 100.0),
            position("C", "Crypto", 100.0, 100.0),
            position("D", "Crypto", 100.0, 100.0),
        ];
        let four_types = vec![
            position("A", "Stock", 100.0, 100.0),
            position("B", "Bond", 100.0, 100.0),
            position("C", "Crypto", 100.0, 100.0),
            position("D", "Fund", 100.0, 100.0),
        ];

        assert!(diversification_score(&four_types) >= diversification_score(&two_types));
    }

    #[test]
    fn test_risk_factors_and_warnings_never_empty() {
        // 10 small positions, all equity, well spread: no rule fires.
        let positions: Vec<ValuedPosition> = (0..12)
            .map(|i| {
                position(
                    &format!("T{}", i),
                    ["Stock", "Bond", "Fund", "ETF", "REIT"][i % 5],
                    100.0,
                    100.0,
                )
            })
            .collect();
        let distribution = valuation_service::aggregate_distribution(&positions);
        let diversification = analyze_diversification(&positions);
        let risk = analyze_risk(&distribution, &diversification);

        assert_eq!(risk.factors, vec!["Balanced portfolio".to_string()]);
        assert_eq!(risk.warnings, vec!["No significant warnings".to_string()]);
        assert_eq!(risk.level, RiskLevel::Low);
    }

    #[test]
    fn test_heavy_crypto_portfolio_triggers_warning_and_high_risk() {
        let positions = vec![
            position("BTC", "Cryptocurrency", 500.0, 600.0),
            position("AAPL", "Stock", 400.0, 400.0),
        ];
        let distribution = valuation_service::aggregate_distribution(&positions);
        let diversification = analyze_diversification(&positions);
        let risk = analyze_risk(&distribution, &diversification);

        assert!(risk.crypto_exposure > 50.0);
        assert!(risk
            .warnings
            .iter()
            .any(|w| w.contains("crypto")));
        assert!(matches!(risk.level, RiskLevel::High | RiskLevel::VeryHigh));
        assert_eq!(risk.volatility, VolatilityLevel::High);
    }

    #[test]
    fn test_rank_performance_orders_and_stats() {
        let positions = vec![
            position("WIN1", "Stock", 100.0, 200.0),  // +100
            position("LOSE", "Stock", 100.0, 50.0),   // -50
            position("WIN2", "Stock", 100.0, 130.0),  // +30
            position("FLAT", "Stock", 100.0, 100.0),  // 0
        ];
        let (top, bottom, stats) = rank_performance(&positions);

        assert_eq!(top[0].ticker, "WIN1");
        assert_eq!(bottom[0].ticker, "LOSE");
        assert_eq!(stats.winners_count, 2);
        assert_eq!(stats.losers_count, 1);
        assert!((stats.winners_percentage - 50.0).abs() < 1e-9);
        assert!((stats.average_gain - 65.0).abs() < 1e-9);
        assert_eq!(stats.best_gain_amount, 100.0);
    }

    #[test]
    fn test_all_losing_portfolio_reports_least_negative_best() {
        let positions = vec![
            position("BAD", "Stock", 100.0, 50.0),   // -50
            position("WORSE", "Stock", 100.0, 20.0), // -80
        ];
        let (_, _, stats) = rank_performance(&positions);

        assert_eq!(stats.winners_count, 0);
        assert_eq!(stats.best_gain_amount, -50.0);
        assert!((stats.best_gain_percentage - -50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unpriced_positions_excluded_from_rankings() {
        let positions = vec![
            position("AAPL", "Stock", 100.0, 150.0),
            unpriced("DARK", "Stock", 500.0),
        ];
        let (top, bottom, _) = rank_performance(&positions);

        assert!(top.iter().all(|p| p.ticker != "DARK"));
        assert!(bottom.iter().all(|p| p.ticker != "DARK"));
    }

    #[test]
    fn test_recommendations_never_empty_and_priority_sorted() {
        // Balanced portfolio: only the fallback entry.
        let balanced: Vec<ValuedPosition> = (0..12)
            .map(|i| {
                position(
                    &format!("T{}", i),
                    ["Stock", "Bond", "Fund", "ETF", "REIT"][i % 5],
                    100.0,
                    100.0,
                )
            })
            .collect();
        let distribution = valuation_service::aggregate_distribution(&balanced);
        let diversification = analyze_diversification(&balanced);
        let risk = analyze_risk(&distribution, &diversification);
        let recs = generate_recommendations(&diversification, &risk, &balanced);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Maintain Current Strategy");

        // Risky portfolio: multiple rules fire, output stays sorted.
        let risky = vec![
            position("BTC", "Crypto", 1000.0, 2000.0),
            position("DOGE", "Crypto", 500.0, 100.0),
        ];
        let distribution = valuation_service::aggregate_distribution(&risky);
        let diversification = analyze_diversification(&risky);
        let risk = analyze_risk(&distribution, &diversification);
        let recs = generate_recommendations(&diversification, &risk, &risky);

        assert!(!recs.is_empty());
        for pair in recs.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
    }

    #[test]
    fn test_concentration_rule_names_top_ticker() {
        let positions = vec![
            position("NVDA", "Stock", 1000.0, 5000.0),
            position("AAPL", "Stock", 1000.0, 1000.0),
        ];
        let diversification = analyze_diversification(&positions);
        let distribution = valuation_service::aggregate_distribution(&positions);
        let risk = analyze_risk(&distribution, &diversification);
        let recs = generate_recommendations(&diversification, &risk, &positions);

        let concentration = recs
            .iter()
            .find(|r| r.title == "Reduce Concentration")
            .expect("concentration rule should fire");
        assert_eq!(concentration.priority, Priority::High);
        assert!(concentration.action.contains("NVDA"));
    }

    #[test]
    fn test_executive_summary_totals() {
        let positions = vec![
            position("A", "Stock", 100.0, 150.0),
            position("B", "Stock", 100.0, 50.0),
        ];
        let diversification = analyze_diversification(&positions);
        let distribution = valuation_service::aggregate_distribution(&positions);
        let risk = analyze_risk(&distribution, &diversification);
        let summary = executive_summary(&positions, &diversification, &risk);

        assert_eq!(summary.total_invested, 200.0);
        assert_eq!(summary.total_value, 200.0);
        assert_eq!(summary.total_gain_loss, 0.0);
        assert_eq!(summary.status, PortfolioStatus::Positive);
        assert!(summary.best_asset.starts_with("A "));
        assert!(summary.worst_asset.starts_with("B "));
    }

    #[test]
    fn test_compile_report_stamps_id_with_user_fragment() {
        let user_id = Uuid::new_v4();
        let report = compile_report(
            "user@example.com".to_string(),
            user_id,
            vec![position("AAPL", "Stock", 100.0, 120.0)],
        );

        let fragment: String = user_id.simple().to_string().chars().take(8).collect();
        assert!(report.report_id.starts_with("RPT-"));
        assert!(report.report_id.ends_with(&fragment));
        assert_eq!(report.version, "2.0");
        assert_eq!(report.positions.len(), 1);
    }
}
