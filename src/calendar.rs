use crate::error::{LoanError, LoanResult};
use chrono::{Months, NaiveDate};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PaymentCalendar {
    first_payment: NaiveDate,
    months_per_period: u32,
}

impl PaymentCalendar {
    pub fn new(first_payment: NaiveDate, periods_per_year: u32) -> LoanResult<Self> {
        if periods_per_year == 0 {
            return Err(LoanError::InvalidPeriodsPerYear);
        }
        if 12 % periods_per_year != 0 {
            return Err(LoanError::UnsupportedFrequency(periods_per_year));
        }
        Ok(Self {
            first_payment,
            months_per_period: 12 / periods_per_year,
        })
    }

    /// Date of the 0-based `period`; days past the end of a shorter month
    /// fall on its last day.
    pub fn date_of(&self, period: usize) -> Option<NaiveDate> {
        let months = u32::try_from(period).ok()?.checked_mul(self.months_per_period)?;
        self.first_payment.checked_add_months(Months::new(months))
    }
}

#[cfg(test)]
mod tests {
    use super::PaymentCalendar;
    use crate::error::LoanError;
    use chrono::NaiveDate;
    use test_log::test;

    #[test]
    fn test_date_of() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let monthly = PaymentCalendar::new(first, 12).unwrap();
        assert_eq!(monthly.date_of(0), Some(first));
        assert_eq!(monthly.date_of(1), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(monthly.date_of(12), NaiveDate::from_ymd_opt(2025, 1, 31));

        let quarterly = PaymentCalendar::new(first, 4).unwrap();
        assert_eq!(quarterly.date_of(1), NaiveDate::from_ymd_opt(2024, 4, 30));

        let annually = PaymentCalendar::new(first, 1).unwrap();
        assert_eq!(annually.date_of(30), NaiveDate::from_ymd_opt(2054, 1, 31));
    }

    #[test]
    fn test_unsupported_frequency() {
        let first = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(
            PaymentCalendar::new(first, 52),
            Err(LoanError::UnsupportedFrequency(52))
        );
        assert_eq!(
            PaymentCalendar::new(first, 0),
            Err(LoanError::InvalidPeriodsPerYear)
        );
    }
}
