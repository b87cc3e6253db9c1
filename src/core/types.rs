use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Conventional,
    Reasoning,
}

impl Policy {
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Conventional => "conventional",
            Policy::Reasoning => "reasoning",
        }
    }
}

/// Serialized as `"last-business-day"` or a bare day number, the form the
/// portal posts and the form overrides accept back.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SalaryDay {
    LastBusinessDay,
    DayOfMonth(u32),
}

const LAST_BUSINESS_DAY: &str = "last-business-day";

impl FromStr for SalaryDay {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            LAST_BUSINESS_DAY | "lastbusinessday" | "last" => Ok(SalaryDay::LastBusinessDay),
            _ => normalized
                .parse::<u32>()
                .map(SalaryDay::DayOfMonth)
                .map_err(|_| ConfigError::InvalidSalaryDay(raw.to_string())),
        }
    }
}

impl Serialize for SalaryDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SalaryDay::LastBusinessDay => serializer.serialize_str(LAST_BUSINESS_DAY),
            SalaryDay::DayOfMonth(day) => serializer.serialize_u32(*day),
        }
    }
}

impl<'de> Deserialize<'de> for SalaryDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Day(u32),
            Named(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Day(day) => Ok(SalaryDay::DayOfMonth(day)),
            Raw::Named(raw) => raw.parse::<SalaryDay>().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCycle {
    /// Statement closing day.
    pub cut_day: u32,
    pub due_day: u32,
    /// New charges booked on every statement.
    pub balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyParams {
    pub conventional_save_rate: f64,
    pub card_minimum_rate: f64,
    pub gig_savings_share: f64,
    pub buffer_horizon_days: u32,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            conventional_save_rate: 0.15,
            card_minimum_rate: 0.10,
            gig_savings_share: 0.5,
            buffer_horizon_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsConfig {
    pub persona: String,
    pub goal: f64,
    pub currency: String,
    pub timeline_start: NaiveDate,
    pub timeline_end: NaiveDate,
    pub current_savings: f64,
    pub months_elapsed: u32,
    /// Checking balance at `timeline_start`; `None` means the previous
    /// payday has just cleared on top of the target buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<f64>,
    pub rent_due_day: u32,
    pub rent_amount: f64,
    pub utilities_due_day: u32,
    #[serde(with = "clock_time")]
    pub utilities_time: NaiveTime,
    pub utilities_amount: f64,
    pub salary_day: SalaryDay,
    pub salary_amount: f64,
    pub friday_gig_income: f64,
    pub bnpl_due_day: u32,
    pub bnpl_amount: f64,
    pub card_a: CardCycle,
    pub card_b: CardCycle,
    pub gym_membership: f64,
    #[serde(default = "default_gym_due_day")]
    pub gym_due_day: u32,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    pub target_buffer: f64,
    #[serde(default)]
    pub params: PolicyParams,
}

const MIN_SUPPORTED_YEAR: i32 = 1900;
const MAX_SUPPORTED_YEAR: i32 = 9999;

fn default_gym_due_day() -> u32 {
    1
}

impl SavingsConfig {
    /// The İstanbul savings-coach scenario used by the demo portal.
    pub fn emre() -> Self {
        Self {
            persona: "Emre (İstanbul)".to_string(),
            goal: 60_000.0,
            currency: "₺".to_string(),
            timeline_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            timeline_end: NaiveDate::from_ymd_opt(2026, 4, 30).unwrap_or_default(),
            current_savings: 12_000.0,
            months_elapsed: 6,
            opening_balance: None,
            rent_due_day: 10,
            rent_amount: 8_500.0,
            utilities_due_day: 10,
            utilities_time: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or_default(),
            utilities_amount: 850.0,
            salary_day: SalaryDay::LastBusinessDay,
            salary_amount: 28_000.0,
            friday_gig_income: 2_500.0,
            bnpl_due_day: 15,
            bnpl_amount: 1_200.0,
            card_a: CardCycle {
                cut_day: 20,
                due_day: 1,
                balance: 6_500.0,
            },
            card_b: CardCycle {
                cut_day: 25,
                due_day: 5,
                balance: 4_200.0,
            },
            gym_membership: 450.0,
            gym_due_day: default_gym_due_day(),
            holidays: Vec::new(),
            target_buffer: 3_000.0,
            params: PolicyParams::default(),
        }
    }

    pub fn opening_balance(&self) -> f64 {
        self.opening_balance
            .unwrap_or(self.target_buffer + self.salary_amount)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, date) in [
            ("timelineStart", self.timeline_start),
            ("timelineEnd", self.timeline_end),
        ] {
            if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&date.year()) {
                return Err(ConfigError::DateOutOfRange { field, date });
            }
        }

        if self.timeline_start > self.timeline_end {
            return Err(ConfigError::InvertedRange {
                start: self.timeline_start,
                end: self.timeline_end,
            });
        }

        if !self.goal.is_finite() || self.goal <= 0.0 {
            return Err(ConfigError::NonPositive { field: "goal" });
        }

        for (field, amount) in [
            ("currentSavings", self.current_savings),
            ("rentAmount", self.rent_amount),
            ("utilitiesAmount", self.utilities_amount),
            ("salaryAmount", self.salary_amount),
            ("fridayGigIncome", self.friday_gig_income),
            ("bnplAmount", self.bnpl_amount),
            ("cardA.balance", self.card_a.balance),
            ("cardB.balance", self.card_b.balance),
            ("gymMembership", self.gym_membership),
            ("targetBuffer", self.target_buffer),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ConfigError::NegativeAmount { field });
            }
        }

        if let Some(opening) = self.opening_balance {
            if !opening.is_finite() {
                return Err(ConfigError::NegativeAmount {
                    field: "openingBalance",
                });
            }
        }

        let mut days = vec![
            ("rentDueDay", self.rent_due_day),
            ("utilitiesDueDay", self.utilities_due_day),
            ("bnplDueDay", self.bnpl_due_day),
            ("gymDueDay", self.gym_due_day),
            ("cardA.cutDay", self.card_a.cut_day),
            ("cardA.dueDay", self.card_a.due_day),
            ("cardB.cutDay", self.card_b.cut_day),
            ("cardB.dueDay", self.card_b.due_day),
        ];
        if let SalaryDay::DayOfMonth(day) = self.salary_day {
            days.push(("salaryDay", day));
        }
        for (field, value) in days {
            if !(1..=31).contains(&value) {
                return Err(ConfigError::DayOutOfRange { field, value });
            }
        }

        for (field, rate) in [
            ("conventionalSaveRate", self.params.conventional_save_rate),
            ("cardMinimumRate", self.params.card_minimum_rate),
            ("gigSavingsShare", self.params.gig_savings_share),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::RateOutOfRange { field });
            }
        }

        if !(1..=366).contains(&self.params.buffer_horizon_days) {
            return Err(ConfigError::HorizonOutOfRange(
                self.params.buffer_horizon_days,
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must fall between years 1900 and 9999, got {date}")]
    DateOutOfRange { field: &'static str, date: NaiveDate },
    #[error("timelineStart {start} must not be after timelineEnd {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("{field} must be > 0")]
    NonPositive { field: &'static str },
    #[error("{field} must be a finite amount >= 0")]
    NegativeAmount { field: &'static str },
    #[error("{field} must be a day of month between 1 and 31, got {value}")]
    DayOutOfRange { field: &'static str, value: u32 },
    #[error("{field} must be between 0 and 1")]
    RateOutOfRange { field: &'static str },
    #[error("bufferHorizonDays must be between 1 and 366, got {0}")]
    HorizonOutOfRange(u32),
    #[error("utilitiesTime must look like HH:MM, got {0:?}")]
    InvalidTime(String),
    #[error("salaryDay must be \"last-business-day\" or a day of month, got {0:?}")]
    InvalidSalaryDay(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Income,
    Expense,
    Transfer,
    Overdraft,
    Buffer,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Income => "income",
            EventKind::Expense => "expense",
            EventKind::Transfer => "transfer",
            EventKind::Overdraft => "overdraft",
            EventKind::Buffer => "buffer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_clock_time"
    )]
    pub time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub description: String,
    pub amount: f64,
    pub balance: f64,
    /// Balance minus debits due within the buffer horizon.
    pub available_buffer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub overdrafts: u32,
    pub autosave_completion: f64,
    /// Deterministic projected goal date; labelled P50 by the portal.
    pub goal_p50_date: Option<NaiveDate>,
    pub buffer_range: [f64; 2],
    pub savings_transferred: f64,
    pub ending_balance: f64,
    pub revolving_card_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSimulation {
    pub policy: Policy,
    pub events: Vec<TimelineEvent>,
    pub kpis: Kpis,
    pub advice: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: String,
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSource {
    Computed,
    External,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub conventional: TimelineSimulation,
    pub reasoning: TimelineSimulation,
    pub overdrafts_avoided: i64,
    pub completion_gain: f64,
    /// Positive when the reasoning policy reaches the goal sooner.
    pub goal_days_earlier: Option<i64>,
}

const CLOCK_FORMAT: &str = "%H:%M";

pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), CLOCK_FORMAT)
        .map_err(|_| ConfigError::InvalidTime(raw.to_string()))
}

mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(super::CLOCK_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).map_err(serde::de::Error::custom)
    }
}

mod optional_clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::clock_time::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| super::parse_clock_time(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
