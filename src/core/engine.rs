use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;

use super::advice::{build_advice, money};
use super::calendar::month_end;
use super::policy::{card_payment, gig_split, month_end_sweep, salary_transfer};
use super::schedule::{CardId, ScheduledItem, ScheduledKind, expand};
use super::types::{
    EventKind, Kpis, Policy, SavingsConfig, StrategyComparison, TimelineEvent, TimelinePoint,
    TimelineSimulation, TimelineSource,
};

const AVG_DAYS_PER_MONTH: f64 = 30.4375;
const MAX_PROJECTION_DAYS: f64 = 365.0 * 100.0;

#[derive(Debug, Clone, Copy, Default)]
struct CardState {
    charges: f64,
    statement: f64,
    carried: f64,
}

impl CardState {
    fn close_statement(&mut self) {
        self.statement += self.carried + self.charges;
        self.carried = 0.0;
    }

    fn settle(&mut self, paid: f64) {
        self.carried += (self.statement - paid).max(0.0);
        self.statement = 0.0;
    }

    fn projected_due(&self) -> f64 {
        if self.statement > 0.0 {
            self.statement
        } else {
            self.carried + self.charges
        }
    }
}

struct Run<'a> {
    config: &'a SavingsConfig,
    policy: Policy,
    items: &'a [ScheduledItem],
    cards: [CardState; 2],
    balance: f64,
    events: Vec<TimelineEvent>,
    overdrafts: u32,
    savings_transferred: f64,
    goal_reached_on: Option<NaiveDate>,
    buffer_low: f64,
    buffer_high: f64,
    pending_month_end: Option<NaiveDate>,
}

pub fn simulate(config: &SavingsConfig, policy: Policy) -> TimelineSimulation {
    let items = expand(config);
    let mut run = Run::new(config, policy, &items);

    for (index, item) in items.iter().enumerate() {
        run.sweep_month_ends_before(Some(item.date), index);
        run.apply(index);
    }
    run.sweep_month_ends_before(None, items.len());

    run.finish()
}

pub fn compare(config: &SavingsConfig) -> StrategyComparison {
    let conventional = simulate(config, Policy::Conventional);
    let reasoning = simulate(config, Policy::Reasoning);

    let overdrafts_avoided =
        conventional.kpis.overdrafts as i64 - reasoning.kpis.overdrafts as i64;
    let completion_gain =
        reasoning.kpis.autosave_completion - conventional.kpis.autosave_completion;
    let goal_days_earlier = match (
        conventional.kpis.goal_p50_date,
        reasoning.kpis.goal_p50_date,
    ) {
        (Some(slow), Some(fast)) => Some((slow - fast).num_days()),
        _ => None,
    };

    StrategyComparison {
        conventional,
        reasoning,
        overdrafts_avoided,
        completion_gain,
        goal_days_earlier,
    }
}

/// Samples every `stride`-th event into chart points labelled `MM/DD`.
pub fn chart_points(simulation: &TimelineSimulation, stride: usize) -> Vec<TimelinePoint> {
    simulation
        .events
        .iter()
        .step_by(stride.max(1))
        .map(|event| TimelinePoint {
            date: event.date.format("%m/%d").to_string(),
            balance: event.balance,
            label: Some(event.kind.as_str().to_string()),
        })
        .collect()
}

/// An externally supplied timeline, when non-empty, replaces the computed points.
pub fn resolve_timeline(
    simulation: &TimelineSimulation,
    external: &[TimelinePoint],
    stride: usize,
) -> (TimelineSource, Vec<TimelinePoint>) {
    if external.is_empty() {
        (TimelineSource::Computed, chart_points(simulation, stride))
    } else {
        (TimelineSource::External, external.to_vec())
    }
}

impl<'a> Run<'a> {
    fn new(config: &'a SavingsConfig, policy: Policy, items: &'a [ScheduledItem]) -> Self {
        let mut run = Self {
            config,
            policy,
            items,
            cards: [
                opening_card_state(items, CardId::A, config.card_a.balance),
                opening_card_state(items, CardId::B, config.card_b.balance),
            ],
            balance: config.opening_balance(),
            events: Vec::new(),
            overdrafts: 0,
            savings_transferred: 0.0,
            goal_reached_on: None,
            buffer_low: 0.0,
            buffer_high: 0.0,
            pending_month_end: month_end(config.timeline_start),
        };
        let opening_buffer = run.available_buffer(config.timeline_start, 0);
        run.buffer_low = opening_buffer;
        run.buffer_high = opening_buffer;
        run
    }

    fn card(&self, id: CardId) -> &CardState {
        match id {
            CardId::A => &self.cards[0],
            CardId::B => &self.cards[1],
        }
    }

    fn card_mut(&mut self, id: CardId) -> &mut CardState {
        match id {
            CardId::A => &mut self.cards[0],
            CardId::B => &mut self.cards[1],
        }
    }

    fn horizon(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_signed(Duration::days(self.config.params.buffer_horizon_days as i64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Known debits among `items[next..]` dated on or before `through`.
    fn upcoming_debits(&self, next: usize, through: NaiveDate) -> f64 {
        self.items[next.min(self.items.len())..]
            .iter()
            .take_while(|item| item.date <= through)
            .map(|item| match item.kind {
                ScheduledKind::CardPayment(card) => self.card(card).projected_due(),
                kind if kind.is_debit() => item.amount,
                _ => 0.0,
            })
            .sum()
    }

    fn next_salary_date(&self, next: usize) -> Option<NaiveDate> {
        self.items[next.min(self.items.len())..]
            .iter()
            .find(|item| item.kind == ScheduledKind::Salary)
            .map(|item| item.date)
    }

    fn reserve(&self, today: NaiveDate, next: usize) -> f64 {
        let horizon = self.horizon(today);
        let through = self
            .next_salary_date(next)
            .map_or(horizon, |payday| payday.max(horizon));
        self.config.target_buffer + self.upcoming_debits(next, through)
    }

    fn available_buffer(&self, today: NaiveDate, next: usize) -> f64 {
        self.balance - self.upcoming_debits(next, self.horizon(today))
    }

    fn apply(&mut self, index: usize) {
        let items = self.items;
        let item = &items[index];
        let next = index + 1;
        let params = self.config.params;

        match item.kind {
            ScheduledKind::Salary => {
                self.post(
                    next,
                    item.date,
                    item.time,
                    EventKind::Income,
                    item.description.clone(),
                    item.amount,
                );
                let reserve = self.reserve(item.date, next);
                let amount =
                    salary_transfer(self.policy, &params, item.amount, self.balance, reserve);
                let description = match self.policy {
                    Policy::Conventional => format!(
                        "Auto-save {:.0}% of salary",
                        params.conventional_save_rate * 100.0
                    ),
                    Policy::Reasoning => "Savings transfer above reserve".to_string(),
                };
                self.transfer_to_savings(next, item.date, amount, description);
                if self.policy == Policy::Reasoning {
                    let through = self
                        .next_salary_date(next)
                        .map_or(self.horizon(item.date), |payday| {
                            payday.max(self.horizon(item.date))
                        });
                    self.note(
                        next,
                        item.date,
                        format!(
                            "Holding {} for obligations through {}",
                            money(&self.config.currency, reserve),
                            through.format("%d %b")
                        ),
                    );
                }
            }
            ScheduledKind::Gig => {
                self.post(
                    next,
                    item.date,
                    item.time,
                    EventKind::Income,
                    item.description.clone(),
                    item.amount,
                );
                let reserve = self.reserve(item.date, next);
                let (to_savings, kept) =
                    gig_split(self.policy, &params, item.amount, self.balance, reserve);
                self.transfer_to_savings(
                    next,
                    item.date,
                    to_savings,
                    "Gig income split to savings".to_string(),
                );
                if kept > 0.0 {
                    self.note(
                        next,
                        item.date,
                        format!(
                            "Kept {} of gig income as buffer",
                            money(&self.config.currency, kept)
                        ),
                    );
                }
            }
            ScheduledKind::Utilities
            | ScheduledKind::Rent
            | ScheduledKind::Bnpl
            | ScheduledKind::Gym => {
                self.post(
                    next,
                    item.date,
                    item.time,
                    EventKind::Expense,
                    item.description.clone(),
                    -item.amount,
                );
            }
            ScheduledKind::CardPayment(card) => {
                let statement = self.card(card).statement;
                if statement <= 0.0 {
                    return;
                }
                let reserve = self.reserve(item.date, next);
                let paid = card_payment(self.policy, &params, statement, self.balance, reserve);
                self.card_mut(card).settle(paid);
                if paid <= 0.0 {
                    return;
                }
                let note = if paid >= statement {
                    "paid in full".to_string()
                } else {
                    format!(
                        "paid {} of {} statement",
                        money(&self.config.currency, paid),
                        money(&self.config.currency, statement)
                    )
                };
                self.post(
                    next,
                    item.date,
                    item.time,
                    EventKind::Expense,
                    format!("{} ({note})", item.description),
                    -paid,
                );
            }
            ScheduledKind::CardCutoff(card) => self.card_mut(card).close_statement(),
        }
    }

    /// Sweeps pending month ends dated before `limit`; `None` drains the
    /// rest of the window.
    fn sweep_month_ends_before(&mut self, limit: Option<NaiveDate>, next: usize) {
        while let Some(boundary) = self.pending_month_end {
            if limit.is_some_and(|limit| boundary >= limit) {
                break;
            }
            let reserve = self.reserve(boundary, next);
            let amount = month_end_sweep(self.policy, self.balance, reserve);
            self.transfer_to_savings(
                next,
                boundary,
                amount,
                "Month-end sweep of surplus buffer".to_string(),
            );
            self.pending_month_end = boundary
                .succ_opt()
                .and_then(month_end)
                .filter(|candidate| *candidate <= self.config.timeline_end);
        }
    }

    fn transfer_to_savings(
        &mut self,
        next: usize,
        date: NaiveDate,
        amount: f64,
        description: String,
    ) {
        if amount <= 0.0 {
            return;
        }
        self.post(next, date, None, EventKind::Transfer, description, -amount);
        self.savings_transferred += amount;
        if self.goal_reached_on.is_none()
            && self.config.current_savings + self.savings_transferred >= self.config.goal
        {
            self.goal_reached_on = Some(date);
        }
    }

    /// Books a cash movement. Zero-amount markers never count as overdrafts;
    /// an overdrawn cash event is followed by exactly one `Overdraft` marker.
    fn post(
        &mut self,
        next: usize,
        date: NaiveDate,
        time: Option<NaiveTime>,
        kind: EventKind,
        description: String,
        amount: f64,
    ) {
        self.balance += amount;
        let available = self.available_buffer(date, next);
        self.buffer_low = self.buffer_low.min(available);
        self.buffer_high = self.buffer_high.max(available);
        let overdrawn = self.balance < 0.0 && amount != 0.0;

        self.events.push(TimelineEvent {
            date,
            time,
            kind,
            description,
            amount,
            balance: self.balance,
            available_buffer: available,
        });

        if overdrawn {
            self.overdrafts += 1;
            self.events.push(TimelineEvent {
                date,
                time,
                kind: EventKind::Overdraft,
                description: format!(
                    "Overdraft: balance {}",
                    money(&self.config.currency, self.balance)
                ),
                amount: 0.0,
                balance: self.balance,
                available_buffer: available,
            });
        }
    }

    /// Buffer note; omitted while overdrawn, where the overdraft marker
    /// already describes the balance.
    fn note(&mut self, next: usize, date: NaiveDate, description: String) {
        if self.balance < 0.0 {
            return;
        }
        self.post(next, date, None, EventKind::Buffer, description, 0.0);
    }

    fn finish(self) -> TimelineSimulation {
        let config = self.config;
        let autosave_completion =
            ((config.current_savings + self.savings_transferred) / config.goal * 100.0)
                .clamp(0.0, 100.0);
        let kpis = Kpis {
            overdrafts: self.overdrafts,
            autosave_completion,
            goal_p50_date: projected_goal_date(
                config,
                self.savings_transferred,
                self.goal_reached_on,
            ),
            buffer_range: [self.buffer_low, self.buffer_high],
            savings_transferred: self.savings_transferred,
            ending_balance: self.balance,
            revolving_card_debt: self.cards.iter().map(|card| card.carried).sum(),
        };
        let advice = build_advice(config, self.policy, &kpis);

        debug!(
            policy = self.policy.as_str(),
            events = self.events.len(),
            overdrafts = kpis.overdrafts,
            completion = kpis.autosave_completion,
            "timeline simulated"
        );

        TimelineSimulation {
            policy: self.policy,
            events: self.events,
            kpis,
            advice,
        }
    }
}

/// A statement is already open at the start only when the card's first due
/// date comes before its first cut-off inside the window.
fn opening_card_state(items: &[ScheduledItem], card: CardId, charges: f64) -> CardState {
    let first = items.iter().find(|item| {
        item.kind == ScheduledKind::CardPayment(card)
            || item.kind == ScheduledKind::CardCutoff(card)
    });
    let statement = match first {
        Some(item) if item.kind == ScheduledKind::CardPayment(card) => charges,
        _ => 0.0,
    };
    CardState {
        charges,
        statement,
        carried: 0.0,
    }
}

fn projected_goal_date(
    config: &SavingsConfig,
    transferred: f64,
    reached_on: Option<NaiveDate>,
) -> Option<NaiveDate> {
    if reached_on.is_some() {
        return reached_on;
    }
    let remaining = config.goal - (config.current_savings + transferred);
    if remaining <= 0.0 {
        return Some(config.timeline_start);
    }

    let window_days = (config.timeline_end - config.timeline_start).num_days() + 1;
    let mut daily_rate = transferred / window_days as f64;
    if daily_rate <= 0.0 && config.months_elapsed > 0 {
        daily_rate =
            config.current_savings / (config.months_elapsed as f64 * AVG_DAYS_PER_MONTH);
    }
    if daily_rate <= 0.0 {
        return None;
    }

    let days = (remaining / daily_rate).ceil();
    if !days.is_finite() || days > MAX_PROJECTION_DAYS {
        return None;
    }
    config
        .timeline_end
        .checked_add_signed(Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SalaryDay;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_config() -> SavingsConfig {
        SavingsConfig::emre()
    }

    /// Only Friday gig income moves cash: March and April 2025, opening at
    /// the target buffer.
    fn gig_only_config() -> SavingsConfig {
        let mut config = sample_config();
        config.timeline_start = date(2025, 3, 1);
        config.timeline_end = date(2025, 4, 30);
        config.opening_balance = Some(3_000.0);
        config.target_buffer = 3_000.0;
        config.friday_gig_income = 1_000.0;
        config.salary_amount = 0.0;
        config.rent_amount = 0.0;
        config.utilities_amount = 0.0;
        config.bnpl_amount = 0.0;
        config.gym_membership = 0.0;
        config.card_a.balance = 0.0;
        config.card_b.balance = 0.0;
        config
    }

    fn is_cash_event(event: &TimelineEvent) -> bool {
        !matches!(event.kind, EventKind::Overdraft | EventKind::Buffer)
    }

    fn assert_ledger_invariants(config: &SavingsConfig, simulation: &TimelineSimulation) {
        let mut running = config.opening_balance();
        let mut previous_date = config.timeline_start;
        for event in &simulation.events {
            assert!(event.date >= previous_date, "events out of order");
            assert!(event.date <= config.timeline_end);
            previous_date = event.date;
            running += event.amount;
            assert_approx(event.balance, running);
        }
    }

    #[test]
    fn emre_reasoning_run_never_overdraws() {
        let config = sample_config();
        let simulation = simulate(&config, Policy::Reasoning);

        assert_ledger_invariants(&config, &simulation);
        assert_eq!(simulation.kpis.overdrafts, 0);
        assert!(simulation.kpis.buffer_range[0] >= config.target_buffer - EPS);
        assert_approx(simulation.kpis.autosave_completion, 100.0);
        assert_approx(simulation.kpis.revolving_card_debt, 0.0);
        assert!(!simulation.advice.is_empty());
    }

    #[test]
    fn emre_reasoning_sweeps_only_on_month_ends() {
        let config = sample_config();
        let simulation = simulate(&config, Policy::Reasoning);
        let sweeps: Vec<_> = simulation
            .events
            .iter()
            .filter(|event| event.description == "Month-end sweep of surplus buffer")
            .collect();

        assert!(!sweeps.is_empty());
        for sweep in sweeps {
            assert_eq!(sweep.kind, EventKind::Transfer);
            assert_eq!(month_end(sweep.date), Some(sweep.date));
            assert!(sweep.amount < 0.0);
            assert!(sweep.balance >= config.target_buffer - EPS);
        }
    }

    #[test]
    fn gig_income_is_split_then_month_ends_sweep_the_kept_half() {
        let config = gig_only_config();
        let simulation = simulate(&config, Policy::Reasoning);
        assert_ledger_invariants(&config, &simulation);
        let events = &simulation.events;

        // 2025-03-07 is the first Friday in the window.
        assert_eq!(events[0].date, date(2025, 3, 7));
        assert_eq!(events[0].kind, EventKind::Income);
        assert_approx(events[0].amount, 1_000.0);
        assert_eq!(events[1].kind, EventKind::Transfer);
        assert_eq!(events[1].description, "Gig income split to savings");
        assert_approx(events[1].amount, -500.0);
        assert_eq!(events[2].kind, EventKind::Buffer);
        assert_eq!(events[2].description, "Kept ₺500 of gig income as buffer");
        assert_approx(events[2].amount, 0.0);

        let sweeps: Vec<_> = events
            .iter()
            .filter(|event| event.description == "Month-end sweep of surplus buffer")
            .collect();
        assert_eq!(sweeps.len(), 2);
        // Four Fridays each leave 500 above the 3,000 reserve.
        assert_eq!(sweeps[0].date, date(2025, 3, 31));
        assert_approx(sweeps[0].amount, -2_000.0);
        assert_approx(sweeps[0].balance, 3_000.0);
        // The last month end is swept after the final scheduled item.
        assert_eq!(sweeps[1].date, date(2025, 4, 30));
        assert_approx(sweeps[1].amount, -2_000.0);
        assert_eq!(events.last(), Some(*sweeps.last().expect("april sweep")));

        assert_eq!(events.len(), 8 * 3 + 2);
        assert_approx(simulation.kpis.savings_transferred, 8_000.0);
        assert_approx(simulation.kpis.ending_balance, 3_000.0);

        let conventional = simulate(&config, Policy::Conventional);
        assert_eq!(conventional.events.len(), 8);
        assert_approx(conventional.kpis.ending_balance, 11_000.0);
    }

    #[test]
    fn buffer_notes_are_omitted_while_overdrawn() {
        let mut config = sample_config();
        config.timeline_end = date(2025, 6, 30);
        config.opening_balance = Some(-100_000.0);
        let simulation = simulate(&config, Policy::Reasoning);
        assert_ledger_invariants(&config, &simulation);

        let overdrawn: Vec<_> = simulation
            .events
            .iter()
            .filter(|event| event.balance < 0.0)
            .collect();
        assert!(!overdrawn.is_empty());
        assert!(overdrawn.iter().all(|event| event.kind != EventKind::Buffer));

        let cash = overdrawn.iter().filter(|event| is_cash_event(event)).count();
        let markers = overdrawn
            .iter()
            .filter(|event| event.kind == EventKind::Overdraft)
            .count();
        assert_eq!(cash, simulation.kpis.overdrafts as usize);
        assert_eq!(markers, cash);
    }

    #[test]
    fn window_at_the_calendar_edge_does_not_panic() {
        let mut config = sample_config();
        config.timeline_end = NaiveDate::MAX;
        config.timeline_start = NaiveDate::MAX - Duration::days(20);
        config.opening_balance = Some(0.0);
        assert!(config.validate().is_err());

        for policy in [Policy::Conventional, Policy::Reasoning] {
            let simulation = simulate(&config, policy);
            assert_ledger_invariants(&config, &simulation);
            assert!(!simulation.events.is_empty());
        }
    }

    #[test]
    fn emre_reasoning_reaches_goal_before_conventional() {
        let comparison = compare(&sample_config());
        let reasoning = comparison.reasoning.kpis.goal_p50_date.expect("reasoning goal date");
        let conventional = comparison
            .conventional
            .kpis
            .goal_p50_date
            .expect("conventional goal date");

        assert!(reasoning < conventional);
        assert!(comparison.goal_days_earlier.unwrap_or_default() > 0);
        assert!(comparison.completion_gain >= 0.0);
        assert!(comparison.conventional.kpis.revolving_card_debt > 0.0);
    }

    #[test]
    fn conventional_saves_fifteen_percent_of_each_salary() {
        let config = sample_config();
        let simulation = simulate(&config, Policy::Conventional);
        let salaries = simulation
            .events
            .iter()
            .filter(|event| event.description == "Salary deposit")
            .count();
        let transfers: Vec<_> = simulation
            .events
            .iter()
            .filter(|event| event.kind == EventKind::Transfer)
            .collect();

        assert_eq!(salaries, 16);
        assert_eq!(transfers.len(), salaries);
        for transfer in transfers {
            assert_approx(transfer.amount, -4_200.0);
        }
        assert!(
            !simulation
                .events
                .iter()
                .any(|event| event.kind == EventKind::Buffer)
        );
    }

    #[test]
    fn sunday_rent_posts_monday_after_same_day_salary() {
        let mut config = sample_config();
        config.timeline_start = date(2025, 8, 1);
        config.timeline_end = date(2025, 8, 31);
        config.salary_day = SalaryDay::DayOfMonth(11);

        for policy in [Policy::Conventional, Policy::Reasoning] {
            let simulation = simulate(&config, policy);
            let salary = simulation
                .events
                .iter()
                .position(|event| event.description == "Salary deposit")
                .expect("salary event");
            let rent = simulation
                .events
                .iter()
                .position(|event| event.description.starts_with("Rent"))
                .expect("rent event");

            assert_eq!(simulation.events[salary].date, date(2025, 8, 11));
            assert_eq!(simulation.events[rent].date, date(2025, 8, 11));
            assert!(salary < rent);
        }
    }

    #[test]
    fn early_utilities_debit_overdraws_before_payroll_clears() {
        let mut config = sample_config();
        config.timeline_start = date(2025, 8, 11);
        config.timeline_end = date(2025, 8, 11);
        config.salary_day = SalaryDay::DayOfMonth(11);
        config.opening_balance = Some(0.0);

        let simulation = simulate(&config, Policy::Conventional);
        let kinds: Vec<_> = simulation.events.iter().map(|event| event.kind).collect();

        assert_eq!(simulation.kpis.overdrafts, 1);
        assert_eq!(kinds[0], EventKind::Expense);
        assert_eq!(
            simulation.events[0].time,
            Some(NaiveTime::from_hms_opt(5, 0, 0).unwrap())
        );
        assert_eq!(kinds[1], EventKind::Overdraft);
        assert_eq!(kinds[2], EventKind::Income);
        assert_eq!(kinds[3], EventKind::Transfer);
        assert_approx(simulation.kpis.ending_balance, -850.0 + 28_000.0 - 4_200.0 - 8_500.0);
    }

    #[test]
    fn minimum_card_payments_roll_into_next_statement() {
        let mut config = sample_config();
        config.timeline_start = date(2025, 1, 1);
        config.timeline_end = date(2025, 2, 28);
        let simulation = simulate(&config, Policy::Conventional);

        let card_a: Vec<_> = simulation
            .events
            .iter()
            .filter(|event| event.description.starts_with("Card A payment"))
            .collect();
        assert_eq!(card_a.len(), 2);
        assert_approx(card_a[0].amount, -650.0);
        // 5,850 carried + 6,500 new charges closed on Jan 20.
        assert_approx(card_a[1].amount, -1_235.0);
        assert_eq!(card_a[1].date, date(2025, 2, 3));
    }

    #[test]
    fn goal_date_projects_past_window_when_not_reached() {
        let mut config = sample_config();
        config.timeline_end = date(2025, 3, 31);
        let simulation = simulate(&config, Policy::Conventional);

        let projected = simulation.kpis.goal_p50_date.expect("projected date");
        assert!(projected > config.timeline_end);
        assert!(simulation.kpis.autosave_completion < 100.0);
    }

    #[test]
    fn goal_date_falls_back_to_history_without_transfers() {
        let mut config = sample_config();
        config.params.conventional_save_rate = 0.0;
        config.timeline_end = date(2025, 1, 31);
        let simulation = simulate(&config, Policy::Conventional);

        // 12,000 over six months leaves 48,000 at roughly 2,000 a month.
        let projected = simulation.kpis.goal_p50_date.expect("projected date");
        let years = (projected - config.timeline_end).num_days() as f64 / 365.25;
        assert!((1.9..2.1).contains(&years), "got {years} years");

        config.months_elapsed = 0;
        let simulation = simulate(&config, Policy::Conventional);
        assert_eq!(simulation.kpis.goal_p50_date, None);
    }

    #[test]
    fn chart_points_sample_every_stride_and_external_timeline_wins() {
        let simulation = simulate(&sample_config(), Policy::Reasoning);
        let points = chart_points(&simulation, 7);
        assert_eq!(points.len(), simulation.events.len().div_ceil(7));
        assert_eq!(points[0].date, "01/01");

        let external = vec![TimelinePoint {
            date: "2025-02-01".to_string(),
            balance: 1.0,
            label: Some("checkpoint".to_string()),
        }];
        let (source, resolved) = resolve_timeline(&simulation, &external, 7);
        assert_eq!(source, TimelineSource::External);
        assert_eq!(resolved, external);

        let (source, resolved) = resolve_timeline(&simulation, &[], 7);
        assert_eq!(source, TimelineSource::Computed);
        assert_eq!(resolved, points);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_ledger_is_ordered_and_balances_accumulate(
            reasoning in any::<bool>(),
            start_offset in 0i64..500,
            span in 0i64..200,
            opening in -5_000i32..40_000,
            rent_day in 1u32..=31,
            utilities_day in 1u32..=31,
            salary in 0u32..40_000,
            gig in 0u32..4_000,
            buffer in 0u32..8_000,
            card_a_cut in 1u32..=28,
            card_a_due in 1u32..=28
        ) {
            let mut config = sample_config();
            config.timeline_start = date(2025, 1, 1) + Duration::days(start_offset);
            config.timeline_end = config.timeline_start + Duration::days(span);
            config.opening_balance = Some(opening as f64);
            config.rent_due_day = rent_day;
            config.utilities_due_day = utilities_day;
            config.salary_amount = salary as f64;
            config.friday_gig_income = gig as f64;
            config.target_buffer = buffer as f64;
            config.card_a.cut_day = card_a_cut;
            config.card_a.due_day = card_a_due;
            let policy = if reasoning { Policy::Reasoning } else { Policy::Conventional };

            let simulation = simulate(&config, policy);

            let mut running = config.opening_balance();
            let mut previous_date = config.timeline_start;
            for event in &simulation.events {
                prop_assert!(event.date >= previous_date);
                previous_date = event.date;
                running += event.amount;
                prop_assert!((event.balance - running).abs() <= EPS);
                prop_assert!(simulation.kpis.buffer_range[0] <= event.available_buffer + EPS);
                prop_assert!(simulation.kpis.buffer_range[1] >= event.available_buffer - EPS);
            }

            let negative_cash_events = simulation
                .events
                .iter()
                .filter(|event| is_cash_event(event) && event.balance < 0.0)
                .count();
            let markers = simulation
                .events
                .iter()
                .filter(|event| event.kind == EventKind::Overdraft)
                .count();
            prop_assert_eq!(simulation.kpis.overdrafts as usize, negative_cash_events);
            prop_assert_eq!(markers, negative_cash_events);
            for (index, event) in simulation.events.iter().enumerate() {
                if is_cash_event(event) && event.balance < 0.0 {
                    prop_assert_eq!(simulation.events[index + 1].kind, EventKind::Overdraft);
                }
            }

            prop_assert!((0.0..=100.0).contains(&simulation.kpis.autosave_completion));
            prop_assert!(!simulation.advice.is_empty());
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_conventional_salary_is_followed_by_fixed_transfer(
            start_offset in 0i64..500,
            span in 20i64..200,
            opening in -20_000i32..20_000,
            salary in 1_000u32..60_000,
            rate_pct in 1u32..=40
        ) {
            let mut config = sample_config();
            config.timeline_start = date(2025, 1, 1) + Duration::days(start_offset);
            config.timeline_end = config.timeline_start + Duration::days(span);
            config.opening_balance = Some(opening as f64);
            config.salary_amount = salary as f64;
            config.params.conventional_save_rate = rate_pct as f64 / 100.0;

            let simulation = simulate(&config, Policy::Conventional);
            let expected =
                ((salary as f64 * config.params.conventional_save_rate) * 100.0).round() / 100.0;
            for (index, event) in simulation.events.iter().enumerate() {
                if event.description != "Salary deposit" {
                    continue;
                }
                let follower = simulation.events[index + 1..]
                    .iter()
                    .find(|next| next.kind != EventKind::Overdraft);
                let follower = follower.expect("transfer after salary");
                prop_assert_eq!(follower.kind, EventKind::Transfer);
                prop_assert_eq!(follower.date, event.date);
                prop_assert!((follower.amount + expected).abs() <= EPS);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_reasoning_transfers_keep_target_buffer(
            start_offset in 0i64..500,
            span in 0i64..240,
            opening in -5_000i32..60_000,
            buffer in 0u32..10_000,
            horizon in 1u32..21,
            gig in 0u32..5_000
        ) {
            let mut config = sample_config();
            config.timeline_start = date(2025, 1, 1) + Duration::days(start_offset);
            config.timeline_end = config.timeline_start + Duration::days(span);
            config.opening_balance = Some(opening as f64);
            config.target_buffer = buffer as f64;
            config.params.buffer_horizon_days = horizon;
            config.friday_gig_income = gig as f64;

            let simulation = simulate(&config, Policy::Reasoning);
            for event in simulation.events.iter().filter(|event| event.kind == EventKind::Transfer) {
                prop_assert!(event.amount < 0.0);
                prop_assert!(event.available_buffer >= config.target_buffer - EPS);
                prop_assert!(event.balance >= config.target_buffer - EPS);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(16))]

        #[test]
        fn prop_simulate_is_idempotent(
            reasoning in any::<bool>(),
            start_offset in 0i64..400,
            span in 0i64..400
        ) {
            let mut config = sample_config();
            config.timeline_start = date(2025, 1, 1) + Duration::days(start_offset);
            config.timeline_end = config.timeline_start + Duration::days(span);
            let policy = if reasoning { Policy::Reasoning } else { Policy::Conventional };

            let first = serde_json::to_string(&simulate(&config, policy)).expect("serialize");
            let second = serde_json::to_string(&simulate(&config, policy)).expect("serialize");
            prop_assert_eq!(first, second);
        }
    }
}
