use super::types::{Kpis, Policy, SavingsConfig};

pub fn build_advice(config: &SavingsConfig, policy: Policy, kpis: &Kpis) -> Vec<String> {
    let currency = config.currency.as_str();
    let mut advice = Vec::new();

    match (policy, kpis.overdrafts) {
        (Policy::Conventional, 0) => advice.push(
            "No overdrafts this time, but the fixed auto-save never checks upcoming debits."
                .to_string(),
        ),
        (Policy::Conventional, n) => advice.push(format!(
            "{n} overdraft{} hit because the {:.0}% auto-save ignores debits due before the next payday.",
            plural(n),
            config.params.conventional_save_rate * 100.0
        )),
        (Policy::Reasoning, 0) => advice.push(format!(
            "No overdrafts: every savings transfer left {} plus upcoming debits in checking.",
            money(currency, config.target_buffer)
        )),
        (Policy::Reasoning, n) => advice.push(format!(
            "{n} overdraft{} could not be avoided: obligations exceed the cash on hand before income arrives.",
            plural(n)
        )),
    }

    let [low, high] = kpis.buffer_range;
    if low < config.target_buffer {
        advice.push(format!(
            "Available buffer dipped to {}, below the {} target.",
            money(currency, low),
            money(currency, config.target_buffer)
        ));
    } else {
        advice.push(format!(
            "Available buffer stayed between {} and {}.",
            money(currency, low),
            money(currency, high)
        ));
    }

    if config.friday_gig_income > 0.0 {
        advice.push(match policy {
            Policy::Conventional => {
                "Friday gig income is not allocated; a fixed share could go to savings.".to_string()
            }
            Policy::Reasoning => format!(
                "Friday gig income goes {:.0}% to savings and the rest to buffer.",
                config.params.gig_savings_share * 100.0
            ),
        });
    }

    if kpis.revolving_card_debt > 0.0 {
        advice.push(format!(
            "{} of card balances is revolving; paying statements in full removes the carry.",
            money(currency, kpis.revolving_card_debt)
        ));
    } else if policy == Policy::Reasoning {
        advice.push("Card statements are paid in full when the reserve allows.".to_string());
    }

    let goal = money(currency, config.goal);
    match kpis.goal_p50_date {
        Some(date) if kpis.autosave_completion >= 100.0 => {
            advice.push(format!("Goal of {goal} reached by {}.", date.format("%d %b %Y")));
        }
        Some(date) => advice.push(format!(
            "At this pace the {goal} goal lands around {} ({:.0}% complete).",
            date.format("%b %Y"),
            kpis.autosave_completion
        )),
        None => advice.push(format!(
            "No savings pace yet to project the {goal} goal."
        )),
    }

    if policy == Policy::Reasoning && config.gym_membership > 0.0 {
        advice.push(format!(
            "Gym membership ({}) stays in the plan as a fixed obligation.",
            money(currency, config.gym_membership)
        ));
    }

    advice
}

fn plural(n: u32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Whole-unit amount with thousands separators, e.g. `₺60,000`.
pub fn money(currency: &str, amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let whole = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}{currency}{grouped}")
}
