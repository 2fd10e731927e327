use log::trace;
use std::{collections::VecDeque, fmt};

// extra principal paid at the end of the 1-based `period`
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExcessPayment {
    pub period: u32,
    pub amount: f64,
}

impl ExcessPayment {
    pub fn new(period: u32, amount: f64) -> Self {
        Self { period, amount }
    }
}

impl fmt::Display for ExcessPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "period={} amount={:.2}", self.period, self.amount)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PeriodAdjustment {
    pub excess: f64,
    pub rate: f64,
}

impl PeriodAdjustment {
    pub fn new(excess: f64, rate: f64) -> Self {
        Self { excess, rate }
    }

    pub fn unchanged(rate: f64) -> Self {
        Self { excess: 0., rate }
    }
}

/// Consulted once per period, before the excess payment queue. `period` is
/// 0-based and `balance` is the outstanding principal at its start.
pub trait RateUpdate {
    fn on_installment(&self, period: usize, balance: f64, rate: f64) -> PeriodAdjustment;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoChange;

impl RateUpdate for NoChange {
    fn on_installment(&self, _period: usize, _balance: f64, rate: f64) -> PeriodAdjustment {
        PeriodAdjustment::unchanged(rate)
    }
}

impl<F> RateUpdate for F
where
    F: Fn(usize, f64, f64) -> PeriodAdjustment,
{
    fn on_installment(&self, period: usize, balance: f64, rate: f64) -> PeriodAdjustment {
        self(period, balance, rate)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateChange {
    pub period: u32,
    pub rate: f64,
}

// a change at period p is returned while p is processed, so p itself still
// pays interest at the old rate
#[derive(Clone, Debug, Default)]
pub struct RateSchedule {
    changes: Vec<RateChange>,
}

impl RateSchedule {
    pub fn new(changes: &[RateChange]) -> Self {
        Self {
            changes: changes.to_vec(),
        }
    }
}

impl RateUpdate for RateSchedule {
    fn on_installment(&self, period: usize, _balance: f64, rate: f64) -> PeriodAdjustment {
        // last one wins if the same period was given twice
        let new_rate = self
            .changes
            .iter()
            .rev()
            .find(|change| change.period as usize == period + 1)
            .map_or(rate, |change| change.rate);
        PeriodAdjustment::unchanged(new_rate)
    }
}

pub struct Adjustments {
    excess_payments: Vec<ExcessPayment>,
    rate_update: Box<dyn RateUpdate>,
}

impl Adjustments {
    // stable sort on a copy, the caller's slice is never touched
    pub fn new(excess_payments: &[ExcessPayment]) -> Self {
        let mut excess_payments = excess_payments.to_vec();
        excess_payments.sort_by_key(|payment| payment.period);
        Self {
            excess_payments,
            rate_update: Box::new(NoChange),
        }
    }

    pub fn with_rate_update(mut self, rate_update: impl RateUpdate + 'static) -> Self {
        self.rate_update = Box::new(rate_update);
        self
    }

    pub fn excess_payments(&self) -> &[ExcessPayment] {
        &self.excess_payments
    }

    /// Fresh queue for a single schedule computation.
    pub fn provider(&self) -> AdjustmentProvider<'_> {
        AdjustmentProvider {
            queue: self.excess_payments.iter().copied().collect(),
            rate_update: self.rate_update.as_ref(),
        }
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl fmt::Debug for Adjustments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adjustments")
            .field("excess_payments", &self.excess_payments)
            .finish_non_exhaustive()
    }
}

pub struct AdjustmentProvider<'a> {
    queue: VecDeque<ExcessPayment>,
    rate_update: &'a dyn RateUpdate,
}

impl AdjustmentProvider<'_> {
    pub fn adjust(&mut self, period: usize, balance: f64, rate: f64) -> PeriodAdjustment {
        let mut adjustment = self.rate_update.on_installment(period, balance, rate);
        adjustment.excess += self.pop_excess(period);
        adjustment
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    // Entries whose period has passed (a duplicate after its period was
    // consumed, or period 0) are dropped silently instead of blocking the
    // payments queued behind them.
    fn pop_excess(&mut self, period: usize) -> f64 {
        while let Some(front) = self.queue.front() {
            let due = (front.period as usize).checked_sub(1);
            match due {
                Some(due) if due == period => {
                    return self.queue.pop_front().map_or(0., |payment| payment.amount);
                }
                Some(due) if due > period => return 0.,
                _ => {
                    trace!("dropping stale excess payment {}", front);
                    self.queue.pop_front();
                }
            }
        }
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::{Adjustments, ExcessPayment, NoChange, PeriodAdjustment, RateChange, RateSchedule, RateUpdate};
    use test_log::test;

    #[test]
    fn test_no_change() {
        assert_eq!(
            NoChange.on_installment(3, 1000., 0.05),
            PeriodAdjustment::unchanged(0.05)
        );
    }

    #[test]
    fn test_queue_is_sorted_without_touching_input() {
        let payments = vec![
            ExcessPayment::new(4, 20000.),
            ExcessPayment::new(2, 10000.),
        ];
        let adjustments = Adjustments::new(&payments);

        assert_eq!(payments[0].period, 4);
        assert_eq!(
            adjustments.excess_payments(),
            &[ExcessPayment::new(2, 10000.), ExcessPayment::new(4, 20000.)]
        );
    }

    #[test]
    fn test_excess_matches_one_based_period() {
        let adjustments = Adjustments::new(&[
            ExcessPayment::new(4, 20000.),
            ExcessPayment::new(2, 10000.),
        ]);
        let mut provider = adjustments.provider();

        let excess: Vec<f64> = (0..5)
            .map(|i| provider.adjust(i, 100000., 0.04).excess)
            .collect();
        assert_eq!(excess, vec![0., 10000., 0., 20000., 0.]);
        assert_eq!(provider.pending(), 0);
    }

    #[test]
    fn test_each_provider_gets_its_own_queue() {
        let adjustments = Adjustments::new(&[ExcessPayment::new(1, 500.)]);

        let mut first = adjustments.provider();
        assert_eq!(first.adjust(0, 1000., 0.04).excess, 500.);
        assert_eq!(first.pending(), 0);

        let mut second = adjustments.provider();
        assert_eq!(second.pending(), 1);
        assert_eq!(second.adjust(0, 1000., 0.04).excess, 500.);
    }

    #[test]
    fn test_duplicate_period_is_ignored_and_does_not_block() {
        let adjustments = Adjustments::new(&[
            ExcessPayment::new(3, 100.),
            ExcessPayment::new(3, 200.),
            ExcessPayment::new(5, 300.),
        ]);
        let mut provider = adjustments.provider();

        let excess: Vec<f64> = (0..6)
            .map(|i| provider.adjust(i, 1000., 0.04).excess)
            .collect();
        // the second (3, 200) is dropped, (5, 300) still applies
        assert_eq!(excess, vec![0., 0., 100., 0., 300., 0.]);
        assert_eq!(provider.pending(), 0);
    }

    #[test]
    fn test_period_zero_is_skipped() {
        let adjustments = Adjustments::new(&[
            ExcessPayment::new(0, 50.),
            ExcessPayment::new(1, 75.),
        ]);
        let mut provider = adjustments.provider();

        assert_eq!(provider.adjust(0, 1000., 0.04).excess, 75.);
        assert_eq!(provider.pending(), 0);
    }

    #[test]
    fn test_strategy_excess_adds_to_queue() {
        let adjustments = Adjustments::new(&[ExcessPayment::new(2, 1000.)])
            .with_rate_update(|_period: usize, _balance: f64, _rate: f64| {
                PeriodAdjustment::new(50., 0.06)
            });
        let mut provider = adjustments.provider();

        assert_eq!(
            provider.adjust(0, 10000., 0.04),
            PeriodAdjustment::new(50., 0.06)
        );
        assert_eq!(
            provider.adjust(1, 10000., 0.06),
            PeriodAdjustment::new(1050., 0.06)
        );
    }

    #[test]
    fn test_queue_never_changes_rate() {
        let adjustments = Adjustments::new(&[ExcessPayment::new(1, 1000.)]);
        let mut provider = adjustments.provider();

        assert_eq!(provider.adjust(0, 5000., 0.03).rate, 0.03);
    }

    #[test]
    fn test_rate_schedule() {
        let schedule = RateSchedule::new(&[
            RateChange { period: 5, rate: 0.07 },
            RateChange { period: 10, rate: 0.05 },
        ]);

        assert_eq!(schedule.on_installment(3, 1000., 0.04).rate, 0.04);
        assert_eq!(schedule.on_installment(4, 1000., 0.04).rate, 0.07);
        assert_eq!(schedule.on_installment(5, 1000., 0.07).rate, 0.07);
        assert_eq!(schedule.on_installment(9, 1000., 0.07).rate, 0.05);
        assert_eq!(schedule.on_installment(9, 1000., 0.07).excess, 0.);
    }
}
