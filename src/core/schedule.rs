use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

use super::calendar::{
    clamped_date, first_weekday_on_or_after, last_business_day, months_spanning,
    next_business_day, previous_month,
};
use super::types::{CardCycle, SalaryDay, SavingsConfig};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CardId {
    A,
    B,
}

impl CardId {
    pub fn label(self) -> &'static str {
        match self {
            CardId::A => "Card A",
            CardId::B => "Card B",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScheduledKind {
    Salary,
    Gig,
    Utilities,
    Rent,
    Bnpl,
    CardPayment(CardId),
    Gym,
    /// Statement close; moves no cash.
    CardCutoff(CardId),
}

impl ScheduledKind {
    pub fn is_credit(self) -> bool {
        matches!(self, ScheduledKind::Salary | ScheduledKind::Gig)
    }

    pub fn is_debit(self) -> bool {
        !self.is_credit() && !matches!(self, ScheduledKind::CardCutoff(_))
    }

    /// Settlement slot for items without a configured time: payroll clears at
    /// 09:00, untimed debits go out at 10:30, statements close at end of day.
    fn default_slot(self) -> NaiveTime {
        let (hour, minute) = match self {
            ScheduledKind::Salary | ScheduledKind::Gig => (9, 0),
            ScheduledKind::CardCutoff(_) => (23, 59),
            _ => (10, 30),
        };
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }

    fn rank(self) -> u8 {
        match self {
            ScheduledKind::Salary => 0,
            ScheduledKind::Gig => 1,
            ScheduledKind::Utilities => 2,
            ScheduledKind::Rent => 3,
            ScheduledKind::Bnpl => 4,
            ScheduledKind::CardPayment(CardId::A) => 5,
            ScheduledKind::CardPayment(CardId::B) => 6,
            ScheduledKind::Gym => 7,
            ScheduledKind::CardCutoff(CardId::A) => 8,
            ScheduledKind::CardCutoff(CardId::B) => 9,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledItem {
    pub date: NaiveDate,
    pub nominal_date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub kind: ScheduledKind,
    /// Unsigned magnitude; the kind decides the direction.
    pub amount: f64,
    pub description: String,
}

impl ScheduledItem {
    pub fn settle_time(&self) -> NaiveTime {
        self.time.unwrap_or_else(|| self.kind.default_slot())
    }

    pub fn was_shifted(&self) -> bool {
        self.date != self.nominal_date
    }
}

/// Expands every recurring obligation and income of `config` into dated
/// occurrences inside `[timeline_start, timeline_end]`, in settlement order.
pub fn expand(config: &SavingsConfig) -> Vec<ScheduledItem> {
    let start = config.timeline_start;
    let end = config.timeline_end;
    let holidays = config.holidays.as_slice();
    let mut items = Vec::new();

    // Start one month early so a due date rolled over a month boundary still lands in range.
    let (prev_year, prev_month) = previous_month(start.year(), start.month());
    let mut months = vec![(prev_year, prev_month)];
    months.extend(months_spanning(start, end));

    for (year, month) in months {
        let salary_date = match config.salary_day {
            SalaryDay::LastBusinessDay => last_business_day(year, month, holidays),
            SalaryDay::DayOfMonth(day) => {
                clamped_date(year, month, day).map(|d| next_business_day(d, holidays))
            }
        };
        if let Some(date) = salary_date {
            push_cash_item(
                &mut items,
                date,
                date,
                None,
                ScheduledKind::Salary,
                config.salary_amount,
                "Salary deposit",
            );
        }

        let monthly = [
            (
                ScheduledKind::Utilities,
                config.utilities_due_day,
                Some(config.utilities_time),
                config.utilities_amount,
                "Utilities debit",
            ),
            (
                ScheduledKind::Rent,
                config.rent_due_day,
                None,
                config.rent_amount,
                "Rent",
            ),
            (
                ScheduledKind::Bnpl,
                config.bnpl_due_day,
                None,
                config.bnpl_amount,
                "BNPL installment",
            ),
            (
                ScheduledKind::Gym,
                config.gym_due_day,
                None,
                config.gym_membership,
                "Gym membership",
            ),
        ];
        for (kind, day, time, amount, label) in monthly {
            if let Some(nominal) = clamped_date(year, month, day) {
                let date = next_business_day(nominal, holidays);
                push_cash_item(&mut items, date, nominal, time, kind, amount, label);
            }
        }

        for (card, cycle) in [(CardId::A, &config.card_a), (CardId::B, &config.card_b)] {
            push_card_items(&mut items, year, month, card, cycle, holidays);
        }
    }

    if config.friday_gig_income > 0.0 {
        let mut friday = first_weekday_on_or_after(start, Weekday::Fri);
        while let Some(date) = friday.filter(|date| *date <= end) {
            push_cash_item(
                &mut items,
                date,
                date,
                None,
                ScheduledKind::Gig,
                config.friday_gig_income,
                "Friday gig income",
            );
            friday = date.checked_add_signed(Duration::days(7));
        }
    }

    items.retain(|item| item.date >= start && item.date <= end);
    items.sort_by(|a, b| {
        (a.date, a.settle_time(), a.kind.rank()).cmp(&(b.date, b.settle_time(), b.kind.rank()))
    });
    items
}

fn push_cash_item(
    items: &mut Vec<ScheduledItem>,
    date: NaiveDate,
    nominal_date: NaiveDate,
    time: Option<NaiveTime>,
    kind: ScheduledKind,
    amount: f64,
    label: &str,
) {
    if amount <= 0.0 {
        return;
    }
    items.push(ScheduledItem {
        date,
        nominal_date,
        time,
        kind,
        amount,
        description: describe(label, date, nominal_date, time),
    });
}

fn push_card_items(
    items: &mut Vec<ScheduledItem>,
    year: i32,
    month: u32,
    card: CardId,
    cycle: &CardCycle,
    holidays: &[NaiveDate],
) {
    if let Some(nominal) = clamped_date(year, month, cycle.due_day) {
        let date = next_business_day(nominal, holidays);
        let label = format!("{} payment", card.label());
        items.push(ScheduledItem {
            date,
            nominal_date: nominal,
            time: None,
            kind: ScheduledKind::CardPayment(card),
            amount: cycle.balance,
            description: describe(&label, date, nominal, None),
        });
    }
    if let Some(cut) = clamped_date(year, month, cycle.cut_day) {
        items.push(ScheduledItem {
            date: cut,
            nominal_date: cut,
            time: None,
            kind: ScheduledKind::CardCutoff(card),
            amount: cycle.balance,
            description: format!("{} statement cut-off", card.label()),
        });
    }
}

fn describe(
    label: &str,
    date: NaiveDate,
    nominal_date: NaiveDate,
    time: Option<NaiveTime>,
) -> String {
    let mut text = label.to_string();
    if let Some(time) = time {
        text.push_str(&format!(" at {}", time.format("%H:%M")));
    }
    if date != nominal_date {
        text.push_str(&format!(
            " (moved from {} to next business day)",
            nominal_date.format("%a %d %b")
        ));
    }
    text
}
