use crate::external::price_oracle::PriceOracle;
use crate::models::{DistributionBucket, Holding, ValuedPosition};
use bigdecimal::ToPrimitive;
use chrono::Utc;
use tracing::warn;

/// Values every holding against the oracle. Lookups are independent I/O, so
/// they are fanned out concurrently and the results joined; a failed lookup
/// degrades that one position instead of failing the batch.
pub async fn value_holdings(
    holdings: &[Holding],
    oracle: &dyn PriceOracle,
) -> Vec<ValuedPosition> {
    let lookups = holdings.iter().map(|h| async {
        match oracle.get_current_price(&h.ticker, &h.asset_type).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("price unavailable for {} ({}): {}", h.ticker, h.asset_type, e);
                None
            }
        }
    });

    let prices = futures::future::join_all(lookups).await;

    holdings
        .iter()
        .zip(prices)
        .map(|(holding, price)| value_holding(holding, price))
        .collect()
}

/// Converts one holding plus an optional current price into a valued
/// position. Without a price the entry is zero-yield: it keeps its invested
/// value as current value so portfolio totals stay honest, and reports no
/// gain. A zero invested value never produces NaN percentages.
pub fn value_holding(holding: &Holding, current_price: Option<f64>) -> ValuedPosition {
    let quantity = holding.quantity.to_f64().unwrap_or(0.0);
    let purchase_price = holding.purchase_price.to_f64().unwrap_or(0.0);
    let invested_value = purchase_price * quantity;

    let (current_value, gain_loss) = match current_price {
        Some(price) => {
            let current = price * quantity;
            (current, current - invested_value)
        }
        None => (invested_value, 0.0),
    };

    let gain_loss_percentage = if invested_value > 0.0 {
        gain_loss / invested_value * 100.0
    } else {
        0.0
    };

    let days_held = (Utc::now().date_naive() - holding.purchase_date)
        .num_days()
        .max(0);

    ValuedPosition {
        ticker: holding.ticker.clone(),
        name: holding.name.clone(),
        asset_type: holding.asset_type.clone(),
        quantity,
        purchase_price,
        current_price,
        invested_value,
        current_value,
        gain_loss,
        gain_loss_percentage,
        days_held,
    }
}

/// Groups positions by asset type (exact, case-sensitive match) into
/// percentage buckets. Bucket order follows first appearance so repeated
/// runs over the same positions produce identical output.
pub fn aggregate_distribution(positions: &[ValuedPosition]) -> Vec<DistributionBucket> {
    let mut buckets: Vec<DistributionBucket> = Vec::new();

    for position in positions {
        match buckets
            .iter_mut()
            .find(|b| b.asset_type == position.asset_type)
        {
            Some(bucket) => {
                bucket.total_value += position.current_value;
                bucket.position_count += 1;
            }
            None => buckets.push(DistributionBucket {
                asset_type: position.asset_type.clone(),
                total_value: position.current_value,
                percentage: 0.0,
                position_count: 1,
            }),
        }
    }

    let total: f64 = buckets.iter().map(|b| b.total_value).sum();
    if total > 0.0 {
        for bucket in &mut buckets {
            bucket.percentage = bucket.total_value / total * 100.0;
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn holding(ticker: &str, asset_type: &str, quantity: &str, price: &str) -> Holding {
        Holding {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            ticker: ticker.to_string(),
            name: format!("{} Inc", ticker),
            asset_type: asset_type.to_string(),
            quantity: BigDecimal::from_str(quantity).unwrap(),
            purchase_price: BigDecimal::from_str(price).unwrap(),
            purchase_date: chrono::Utc::now().date_naive(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_priced_position_math() {
        let h = holding("AAPL", "Stock", "10", "100");
        let p = value_holding(&h, Some(150.0));

        assert_eq!(p.invested_value, 1000.0);
        assert_eq!(p.current_value, 1500.0);
        assert_eq!(p.gain_loss, 500.0);
        assert!((p.gain_loss_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unpriced_position_is_zero_yield() {
        let h = holding("OBSCURE", "Stock", "5", "20");
        let p = value_holding(&h, None);

        assert!(p.current_price.is_none());
        assert_eq!(p.invested_value, 100.0);
        assert_eq!(p.current_value, 100.0);
        assert_eq!(p.gain_loss, 0.0);
        assert_eq!(p.gain_loss_percentage, 0.0);
    }

    #[test]
    fn test_zero_invested_never_yields_nan() {
        let h = holding("FREE", "Stock", "3", "0");
        let p = value_holding(&h, Some(10.0));

        assert_eq!(p.invested_value, 0.0);
        assert_eq!(p.gain_loss_percentage, 0.0);
        assert!(p.gain_loss_percentage.is_finite());
    }

    #[test]
    fn test_distribution_percentages_sum_to_100() {
        let positions = vec![
            value_holding(&holding("AAPL", "Stock", "1", "300"), Some(300.0)),
            value_holding(&holding("BTC", "Crypto", "1", "500"), Some(500.0)),
            value_holding(&holding("MSFT", "Stock", "1", "200"), Some(200.0)),
        ];

        let buckets = aggregate_distribution(&positions);
        assert_eq!(buckets.len(), 2);

        let total_pct: f64 = buckets.iter().map(|b| b.percentage).sum();
        assert!((total_pct - 100.0).abs() < 0.01);

        let stocks = buckets.iter().find(|b| b.asset_type == "Stock").unwrap();
        assert_eq!(stocks.position_count, 2);
        assert_eq!(stocks.total_value, 500.0);
    }

    #[test]
    fn test_distribution_of_empty_positions_is_empty() {
        assert!(aggregate_distribution(&[]).is_empty());
    }

    #[test]
    fn test_asset_type_grouping_is_case_sensitive() {
        let positions = vec![
            value_holding(&holding("A", "Stock", "1", "100"), Some(100.0)),
            value_holding(&holding("B", "stock", "1", "100"), Some(100.0)),
        ];

        assert_eq!(aggregate_distribution(&positions).len(), 2);
    }
}
