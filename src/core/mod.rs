mod advice;
mod calendar;
mod diff;
mod engine;
mod policy;
mod schedule;
mod types;

pub use advice::money;
pub use diff::{Impact, ModelDiffPoint, model_diff_points};
pub use engine::{chart_points, compare, resolve_timeline, simulate};
pub use schedule::{CardId, ScheduledItem, ScheduledKind, expand};
pub use types::{
    CardCycle, ConfigError, EventKind, Kpis, Policy, PolicyParams, SalaryDay, SavingsConfig,
    StrategyComparison, TimelineEvent, TimelinePoint, TimelineSimulation, TimelineSource,
    parse_clock_time,
};
