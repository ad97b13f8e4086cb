use crate::db;
use crate::errors::AppError;
use crate::external::price_oracle::PriceOracle;
use crate::models::{PortfolioStatus, ReportData};
use crate::services::{email_service, report_analysis_service};
use sqlx::PgPool;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub sent: i32,
    pub failed: i32,
}

/// Builds and emails the daily summary to every opted-in recipient. One bad
/// portfolio (or mailbox) must not sink the rest of the batch, so per-user
/// failures are logged and counted rather than propagated.
pub async fn send_daily_reports(
    pool: &PgPool,
    oracle: &dyn PriceOracle,
) -> Result<BatchOutcome, AppError> {
    let recipients = db::user_queries::fetch_daily_report_recipients(pool).await?;
    info!("📬 Sending daily reports to {} recipients", recipients.len());

    let smtp = email_service::SmtpConfig::from_env();
    let mut outcome = BatchOutcome::default();

    for user in recipients {
        let result = async {
            let data =
                report_analysis_service::generate_report_data(pool, oracle, user.id).await?;
            let subject = format!(
                "Your portfolio report - {}",
                data.generated_at.format("%B %e, %Y")
            );
            email_service::send_html_email(&smtp, &user.email, &subject, build_summary_html(&data))
                .await
        }
        .await;

        match result {
            Ok(()) => outcome.sent += 1,
            Err(e) => {
                outcome.failed += 1;
                error!("❌ Daily report for {} failed: {}", user.email, e);
            }
        }
    }

    info!(
        "✅ Daily report batch done (sent: {}, failed: {})",
        outcome.sent, outcome.failed
    );
    Ok(outcome)
}

/// Styled HTML rendition of the report headline numbers. Served by the
/// summary endpoint and embedded in the daily email.
pub fn build_summary_html(data: &ReportData) -> String {
    let summary = &data.summary;
    let (status_label, status_color) = match summary.status {
        PortfolioStatus::Positive => ("POSITIVE", "#10b981"),
        PortfolioStatus::Negative => ("NEGATIVE", "#ef4444"),
    };
    let gain_color = if summary.total_gain_loss >= 0.0 {
        "#10b981"
    } else {
        "#ef4444"
    };

    let performer_rows: String = data
        .top_performers
        .iter()
        .take(3)
        .map(|p| {
            format!(
                "<tr><td>{}</td><td>{}</td><td style=\"color: {};\">{:+.1}%</td></tr>",
                p.ticker,
                p.name,
                if p.gain_loss >= 0.0 { "#10b981" } else { "#ef4444" },
                p.gain_loss_percentage
            )
        })
        .collect();

    let recommendation_items: String = data
        .recommendations
        .iter()
        .take(3)
        .map(|r| {
            format!(
                "<li><strong>[{}]</strong> {}</li>",
                r.priority.label(),
                r.title
            )
        })
        .collect();

    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; padding: 0; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #2563eb; color: white; padding: 20px; border-radius: 5px 5px 0 0; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border: 1px solid #ddd; border-top: none; }}
        .footer {{ padding: 10px; text-align: center; color: #666; font-size: 12px; }}
        .status-badge {{ display: inline-block; padding: 4px 12px; border-radius: 12px; color: white; background-color: {status_color}; font-weight: bold; }}
        table {{ width: 100%; margin: 15px 0; border-collapse: collapse; }}
        td {{ padding: 8px; border-bottom: 1px solid #eee; }}
        .label {{ font-weight: bold; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Portfolio Report</h1>
            <p>{generated_at}</p>
        </div>
        <div class="content">
            <p>Status: <span class="status-badge">{status_label}</span></p>
            <table>
                <tr><td class="label">Total Value:</td><td>${total_value:.2}</td></tr>
                <tr><td class="label">Total Invested:</td><td>${total_invested:.2}</td></tr>
                <tr><td class="label">Gain/Loss:</td><td style="color: {gain_color}; font-weight: bold;">${gain:.2} ({gain_pct:.2}%)</td></tr>
                <tr><td class="label">Positions:</td><td>{positions}</td></tr>
                <tr><td class="label">Diversification:</td><td>{div_score}/100</td></tr>
                <tr><td class="label">Risk Level:</td><td>{risk_level}</td></tr>
            </table>
            <h3>Top performers</h3>
            <table>{performer_rows}</table>
            <h3>Recommendations</h3>
            <ul>{recommendation_items}</ul>
        </div>
        <div class="footer">
            <p>Report ID: {report_id} | FINANCEPR {version}</p>
            <p>You're receiving this because daily reports are enabled in your settings.</p>
        </div>
    </div>
</body>
</html>
"#,
        status_color = status_color,
        generated_at = data.generated_at.format("%B %e, %Y %H:%M UTC"),
        status_label = status_label,
        total_value = summary.total_value,
        total_invested = summary.total_invested,
        gain_color = gain_color,
        gain = summary.total_gain_loss,
        gain_pct = summary.total_gain_loss_percentage,
        positions = summary.total_positions,
        div_score = summary.diversification_score,
        risk_level = summary.risk_level.label(),
        performer_rows = performer_rows,
        recommendation_items = recommendation_items,
        report_id = data.report_id,
        version = data.version,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValuedPosition;
    use crate::services::report_analysis_service::compile_report;
    use uuid::Uuid;

    fn sample_report() -> ReportData {
        let positions = vec![
            ValuedPosition {
                ticker: "AAPL".to_string(),
                name: "Apple".to_string(),
                asset_type: "Stock".to_string(),
                quantity: 10.0,
                purchase_price: 100.0,
                current_price: Some(150.0),
                invested_value: 1000.0,
                current_value: 1500.0,
                gain_loss: 500.0,
                gain_loss_percentage: 50.0,
                days_held: 100,
            },
            ValuedPosition {
                ticker: "MSFT".to_string(),
                name: "Microsoft".to_string(),
                asset_type: "Stock".to_string(),
                quantity: 5.0,
                purchase_price: 200.0,
                current_price: Some(180.0),
                invested_value: 1000.0,
                current_value: 900.0,
                gain_loss: -100.0,
                gain_loss_percentage: -10.0,
                days_held: 40,
            },
        ];
        compile_report("reader@example.com".to_string(), Uuid::nil(), positions)
    }

    #[test]
    fn test_summary_html_contains_headline_numbers() {
        let data = sample_report();
        let html = build_summary_html(&data);

        assert!(html.contains(&data.report_id));
        assert!(html.contains("POSITIVE"));
        assert!(html.contains("AAPL"));
        assert!(html.contains("/100"));
    }

    #[test]
    fn test_summary_html_marks_losing_portfolio_negative() {
        let mut data = sample_report();
        data.summary.status = PortfolioStatus::Negative;
        data.summary.total_gain_loss = -400.0;

        let html = build_summary_html(&data);
        assert!(html.contains("NEGATIVE"));
        assert!(html.contains("#ef4444"));
    }
}
