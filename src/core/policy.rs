//! Allocation decisions for the two savings policies.
//!
//! Both policies walk the same expanded calendar; they only differ in the
//! handful of pure functions below. `reserve` is the cash the reasoning
//! policy keeps back: the target buffer plus known debits inside the
//! buffer horizon (extended to the next payday).

use super::types::{Policy, PolicyParams};

pub fn salary_transfer(
    policy: Policy,
    params: &PolicyParams,
    salary: f64,
    balance: f64,
    reserve: f64,
) -> f64 {
    match policy {
        Policy::Conventional => round_cents(salary * params.conventional_save_rate),
        Policy::Reasoning => surplus(balance, reserve),
    }
}

/// Returns `(to_savings, kept_as_buffer)`.
pub fn gig_split(
    policy: Policy,
    params: &PolicyParams,
    gig: f64,
    balance: f64,
    reserve: f64,
) -> (f64, f64) {
    match policy {
        Policy::Conventional => (0.0, 0.0),
        Policy::Reasoning => {
            let to_savings =
                floor_cents(gig * params.gig_savings_share).min(surplus(balance, reserve));
            (to_savings, gig - to_savings)
        }
    }
}

pub fn card_payment(
    policy: Policy,
    params: &PolicyParams,
    statement: f64,
    balance: f64,
    reserve: f64,
) -> f64 {
    if statement <= 0.0 {
        return 0.0;
    }
    let minimum = round_cents(statement * params.card_minimum_rate);
    match policy {
        Policy::Conventional => minimum,
        Policy::Reasoning => {
            if balance - statement >= reserve {
                statement
            } else {
                surplus(balance, reserve).max(minimum).min(statement)
            }
        }
    }
}

pub fn month_end_sweep(policy: Policy, balance: f64, reserve: f64) -> f64 {
    match policy {
        Policy::Conventional => 0.0,
        Policy::Reasoning => surplus(balance, reserve),
    }
}

fn surplus(balance: f64, reserve: f64) -> f64 {
    floor_cents((balance - reserve).max(0.0))
}

fn floor_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
