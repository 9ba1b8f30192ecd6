use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::models::dto::{HoldingView, QuoteSnapshot};
use crate::models::portfolio_holdings;

pub struct PortfolioService;

impl PortfolioService {
    /// Enrichit un holding des champs dérivés, recalculés à chaque lecture:
    ///   value = shares * currentPrice
    ///   gain  = value - shares * avgPrice
    /// Arithmétique Decimal exacte, jamais stockée en base.
    /// Sans quote disponible, le prix de revient sert de prix courant et la
    /// ligne est marquée sample.
    pub fn enrich(holding: &portfolio_holdings::Model, quote: Option<&QuoteSnapshot>) -> HoldingView {
        let (current_price, is_sample) = match quote {
            Some(q) => (
                Decimal::from_f64(q.price).unwrap_or(holding.avg_price),
                q.is_sample,
            ),
            None => (holding.avg_price, true),
        };

        let value = holding.shares * current_price;
        let cost = holding.shares * holding.avg_price;
        let gain = value - cost;
        let gain_percent = if cost > Decimal::ZERO {
            gain / cost * Decimal::from(100)
        } else {
            Decimal::ZERO
        };

        HoldingView {
            id: holding.id,
            symbol: holding.symbol.clone(),
            name: holding.name.clone(),
            shares: holding.shares,
            avg_price: holding.avg_price,
            current_price,
            value,
            gain,
            gain_percent,
            is_sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn holding(shares: &str, avg_price: &str) -> portfolio_holdings::Model {
        portfolio_holdings::Model {
            id: 1,
            user_id: 42,
            symbol: "AAPL".to_string(),
            name: Some("Apple Inc".to_string()),
            shares: dec(shares),
            avg_price: dec(avg_price),
            created_at: Utc::now(),
        }
    }

    fn quote(price: f64) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: "AAPL".to_string(),
            price,
            change: 0.0,
            change_percent: 0.0,
            volume: 0,
            category: None,
            is_sample: false,
        }
    }

    #[test]
    fn test_value_and_gain_are_exact() {
        let h = holding("3", "150.25");
        let q = quote(187.5);

        let view = PortfolioService::enrich(&h, Some(&q));

        // value == shares * currentPrice, gain == value - shares * avgPrice, exactement
        assert_eq!(view.value, dec("562.5"));
        assert_eq!(view.gain, dec("562.5") - dec("450.75"));
        assert_eq!(view.value, view.shares * view.current_price);
        assert_eq!(view.gain, view.value - view.shares * view.avg_price);
        assert!(!view.is_sample);
    }

    #[test]
    fn test_fractional_shares_stay_exact() {
        let h = holding("2.5", "100.25");
        let q = quote(100.25);

        let view = PortfolioService::enrich(&h, Some(&q));
        assert_eq!(view.gain, Decimal::ZERO);
        assert_eq!(view.gain_percent, Decimal::ZERO);
    }

    #[test]
    fn test_missing_quote_falls_back_to_cost_basis() {
        let h = holding("10", "50");

        let view = PortfolioService::enrich(&h, None);
        assert_eq!(view.current_price, dec("50"));
        assert_eq!(view.gain, Decimal::ZERO);
        assert!(view.is_sample);
    }

    #[test]
    fn test_zero_cost_basis_has_zero_gain_percent() {
        let h = holding("5", "0");
        let q = quote(10.0);

        let view = PortfolioService::enrich(&h, Some(&q));
        assert_eq!(view.value, dec("50"));
        assert_eq!(view.gain_percent, Decimal::ZERO);
    }
}
