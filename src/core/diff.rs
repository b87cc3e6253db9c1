use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    High,
    Medium,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDiffPoint {
    pub category: &'static str,
    pub conventional: &'static str,
    pub reasoning: &'static str,
    pub impact: Impact,
}

/// How the two policies differ, one entry per rule the engine applies.
pub fn model_diff_points() -> Vec<ModelDiffPoint> {
    vec![
        ModelDiffPoint {
            category: "Calendar Rules",
            conventional: "Ignores the 05:00 utilities debit on the 10th, so same-day rent can overdraw",
            reasoning: "Orders the 05:00 debit first and settles rent at 10:30 after payroll clears",
            impact: Impact::Critical,
        },
        ModelDiffPoint {
            category: "Weekend Handling",
            conventional: "Treats a weekend due date as if the bank were open",
            reasoning: "Moves weekend and holiday due dates to the next business day, after a same-day salary",
            impact: Impact::Critical,
        },
        ModelDiffPoint {
            category: "Buffer Management",
            conventional: "Saves a fixed percentage regardless of upcoming obligations",
            reasoning: "Holds the target buffer plus debits due within the horizon before saving",
            impact: Impact::High,
        },
        ModelDiffPoint {
            category: "Income Allocation",
            conventional: "Auto-saves 15% of every salary immediately",
            reasoning: "Funds the reserve first and saves only the surplus above it",
            impact: Impact::High,
        },
        ModelDiffPoint {
            category: "Gig Income Strategy",
            conventional: "Treats Friday gig income as ordinary spending money",
            reasoning: "Splits gig income 50/50 between savings and buffer",
            impact: Impact::Medium,
        },
        ModelDiffPoint {
            category: "Credit Card Optimization",
            conventional: "Always pays the 10% minimum and carries the rest",
            reasoning: "Pays statements in full whenever the reserve allows",
            impact: Impact::High,
        },
        ModelDiffPoint {
            category: "Month-end Sweep",
            conventional: "Leaves excess buffer idle in checking",
            reasoning: "Sweeps the surplus above the reserve to savings at month end",
            impact: Impact::Medium,
        },
        ModelDiffPoint {
            category: "Adherence to Values",
            conventional: "May suggest cutting the gym membership to save more",
            reasoning: "Keeps the gym membership as a fixed obligation and plans around it",
            impact: Impact::High,
        },
    ]
}
