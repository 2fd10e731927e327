use crate::adjustment::{AdjustmentProvider, Adjustments};
use crate::error::{LoanError, LoanResult};
use log::{debug, trace};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmortizationPolicy {
    Annuity,
    Decreasing,
}

impl fmt::Display for AmortizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmortizationPolicy::Annuity => write!(f, "annuity"),
            AmortizationPolicy::Decreasing => write!(f, "decreasing"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoanTerms {
    principal: f64,
    annual_rate: f64,
    term: u32,
    periods_per_year: u32,
    commission: f64,
}

impl LoanTerms {
    pub const DEFAULT_PERIODS_PER_YEAR: u32 = 12;

    pub fn new(principal: f64, annual_rate: f64, term: u32, commission: f64) -> LoanResult<Self> {
        let terms = Self {
            principal,
            annual_rate,
            term,
            periods_per_year: Self::DEFAULT_PERIODS_PER_YEAR,
            commission,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn with_periods_per_year(mut self, periods_per_year: u32) -> LoanResult<Self> {
        self.periods_per_year = periods_per_year;
        self.validate()?;
        Ok(self)
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn term(&self) -> u32 {
        self.term
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    fn validate(&self) -> LoanResult<()> {
        if self.term == 0 {
            return Err(LoanError::InvalidTerm);
        }
        if self.periods_per_year == 0 {
            return Err(LoanError::InvalidPeriodsPerYear);
        }
        Ok(())
    }
}

// `principal` already contains `excess`
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleEntry {
    pub installment: f64,
    pub interest: f64,
    pub principal: f64,
    pub excess: f64,
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "installment: {:.2}, interest: {:.2}, capital: {:.2}, excess: {:.2}",
            self.installment, self.interest, self.principal, self.excess
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleResult {
    entries: Vec<ScheduleEntry>,
    // interest and principal over all entries plus the commission
    pub total_cost: f64,
}

impl ScheduleResult {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_interest(&self) -> f64 {
        self.entries.iter().map(|entry| entry.interest).sum()
    }

    pub fn total_excess(&self) -> f64 {
        self.entries.iter().map(|entry| entry.excess).sum()
    }

    pub fn years(&self, periods_per_year: u32) -> f64 {
        self.len() as f64 / periods_per_year as f64
    }
}

// ends early, with fewer than `terms.term()` entries, once the balance is paid off
pub fn compute_schedule(
    terms: &LoanTerms,
    adjustments: &Adjustments,
    policy: AmortizationPolicy,
) -> LoanResult<ScheduleResult> {
    terms.validate()?;
    let mut provider = adjustments.provider();
    let (entries, summary_cost) = match policy {
        AmortizationPolicy::Annuity => annuity_schedule(terms, &mut provider),
        AmortizationPolicy::Decreasing => decreasing_schedule(terms, &mut provider),
    };
    debug!(
        "{} schedule: {} of {} periods, total cost {:.2}",
        policy,
        entries.len(),
        terms.term,
        summary_cost + terms.commission
    );
    Ok(ScheduleResult {
        entries,
        total_cost: summary_cost + terms.commission,
    })
}

// level payment that repays `balance` over `periods` at `annual_rate`
fn get_installment_amount(balance: f64, periods: u32, annual_rate: f64, periods_per_year: u32) -> f64 {
    let period_rate = annual_rate / periods_per_year as f64;
    let annuity_factor: f64 = (1..=periods)
        .map(|i| (1. + period_rate).powf(-f64::from(i)))
        .sum();
    balance / annuity_factor
}

// periods strictly after `period`, never below one
fn remaining_periods(term: u32, period: usize) -> u32 {
    (term as usize).saturating_sub(period + 1).max(1) as u32
}

fn annuity_schedule(terms: &LoanTerms, provider: &mut AdjustmentProvider) -> (Vec<ScheduleEntry>, f64) {
    let periods_per_year = terms.periods_per_year as f64;
    let mut rate = terms.annual_rate;
    let mut balance = terms.principal;
    let mut installment = get_installment_amount(balance, terms.term, rate, terms.periods_per_year);
    let mut entries = Vec::new();
    let mut summary_cost = 0.;

    for period in 0..terms.term as usize {
        let interest = balance * rate / periods_per_year;
        let mut principal = installment - interest;

        let adjustment = provider.adjust(period, balance, rate);
        principal += adjustment.excess;
        rate = adjustment.rate;

        entries.push(ScheduleEntry {
            installment,
            interest,
            principal,
            excess: adjustment.excess,
        });
        summary_cost += principal + interest;
        balance -= principal;
        trace!(
            "period {}, installment {}, interest {}, principal {}, balance {}",
            period + 1,
            installment,
            interest,
            principal,
            balance
        );

        if balance <= 0. {
            debug!("loan repaid after {} periods", period + 1);
            break;
        }
        installment = get_installment_amount(
            balance,
            remaining_periods(terms.term, period),
            rate,
            terms.periods_per_year,
        );
    }
    (entries, summary_cost)
}

fn decreasing_schedule(terms: &LoanTerms, provider: &mut AdjustmentProvider) -> (Vec<ScheduleEntry>, f64) {
    let periods_per_year = terms.periods_per_year as f64;
    let mut rate = terms.annual_rate;
    let mut balance = terms.principal;
    let mut principal_chunk = balance / terms.term as f64;
    let mut entries = Vec::new();
    let mut summary_cost = 0.;

    for period in 0..terms.term as usize {
        let interest = balance * rate / periods_per_year;
        let installment = principal_chunk + interest;
        let mut principal = principal_chunk;

        let adjustment = provider.adjust(period, balance, rate);
        principal += adjustment.excess;
        rate = adjustment.rate;

        entries.push(ScheduleEntry {
            installment,
            interest,
            principal,
            excess: adjustment.excess,
        });
        summary_cost += principal + interest;
        balance -= principal;
        trace!(
            "period {}, installment {}, interest {}, principal {}, balance {}",
            period + 1,
            installment,
            interest,
            principal,
            balance
        );

        if adjustment.excess > 0. {
            principal_chunk = balance / remaining_periods(terms.term, period) as f64;
            debug!("principal portion recomputed to {} after excess payment", principal_chunk);
        }
        if balance <= 0. {
            debug!("loan repaid after {} periods", period + 1);
            break;
        }
    }
    (entries, summary_cost)
}
