use crate::adjustment::{ExcessPayment, RateChange};
use crate::error::{LoanError, LoanResult};

// "(period,value)(period,value)..." with whitespace ignored; "" gives no pairs
pub fn parse_pairs(text: &str) -> LoanResult<Vec<(u32, f64)>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pairs = Vec::new();
    let mut rest = compact.as_str();

    while !rest.is_empty() {
        let body = rest
            .strip_prefix('(')
            .ok_or_else(|| LoanError::parse(text, format!("expected '(' at '{}'", rest)))?;
        let close = body
            .find(')')
            .ok_or_else(|| LoanError::parse(text, "missing ')'"))?;
        let (period, value) = body[..close]
            .split_once(',')
            .ok_or_else(|| LoanError::parse(text, format!("expected 'period,value' in '{}'", &body[..close])))?;

        let period = period
            .parse::<u32>()
            .map_err(|e| LoanError::parse(text, format!("bad period '{}': {}", period, e)))?;
        let value = value
            .parse::<f64>()
            .map_err(|e| LoanError::parse(text, format!("bad value '{}': {}", value, e)))?;
        if !value.is_finite() {
            return Err(LoanError::parse(text, format!("value {} is not finite", value)));
        }

        pairs.push((period, value));
        rest = &body[close + 1..];
    }
    Ok(pairs)
}

pub fn parse_excess_payments(text: &str) -> LoanResult<Vec<ExcessPayment>> {
    parse_pairs(text)?
        .into_iter()
        .map(|(period, amount)| {
            if period == 0 {
                Err(LoanError::parse(text, "periods are counted from 1"))
            } else if amount <= 0. {
                Err(LoanError::parse(text, format!("excess payment {} must be positive", amount)))
            } else {
                Ok(ExcessPayment::new(period, amount))
            }
        })
        .collect()
}

pub fn parse_rate_changes(text: &str) -> LoanResult<Vec<RateChange>> {
    parse_pairs(text)?
        .into_iter()
        .map(|(period, rate)| {
            if period == 0 {
                Err(LoanError::parse(text, "periods are counted from 1"))
            } else {
                Ok(RateChange { period, rate })
            }
        })
        .collect()
}
