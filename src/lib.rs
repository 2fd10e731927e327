pub mod adjustment;
pub mod calendar;
pub mod error;
pub mod input;
pub mod loan;

pub use adjustment::{
    AdjustmentProvider, Adjustments, ExcessPayment, NoChange, PeriodAdjustment, RateChange,
    RateSchedule, RateUpdate,
};
pub use error::{LoanError, LoanResult};
pub use loan::{compute_schedule, AmortizationPolicy, LoanTerms, ScheduleEntry, ScheduleResult};
