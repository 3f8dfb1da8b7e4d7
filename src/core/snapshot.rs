use serde::Serialize;

use super::advice::{self, IdealBenchmark, Recommendation};
use super::config::PlannerConfig;
use super::engine::Simulator;
use super::types::PlanInputs;

/// Where the household stands against its retirement goal at one age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Outlook {
    /// Saving less per year than the goal requires.
    Shortfall {
        annual_gap: f64,
        monthly_adjustment: f64,
    },
    OnTrack {
        annual_surplus: f64,
    },
    /// Retired: what the assets can sustainably pay out.
    Drawdown {
        sustainable_annual: f64,
        sustainable_monthly: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeSnapshot {
    pub age: u32,
    pub assets: f64,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub annual_balance: f64,
    pub recommended_annual_saving: f64,
    pub outlook: Outlook,
    pub ideal: IdealBenchmark,
    pub recommendations: Vec<Recommendation>,
}

/// Replays the projection up to `target_age`. Ages outside the projected
/// range are clamped into it.
pub fn snapshot(inputs: &PlanInputs, config: &PlannerConfig, target_age: u32) -> AgeSnapshot {
    let mut simulator = Simulator::new(inputs, config);
    let retire_age = simulator.retire_age();
    let record = simulator.advance_to(target_age);

    let age = record.age;
    let assets = record.cumulative_assets;
    let annual_balance = (record.monthly_income - record.monthly_expense) * 12.0;

    let (recommended_annual_saving, outlook) = if age < retire_age {
        let years_to_retire = (retire_age - age).max(1) as f64;
        let required = (config.retirement_asset_goal - assets).max(0.0) / years_to_retire;
        let outlook = if annual_balance < required {
            let annual_gap = required - annual_balance;
            Outlook::Shortfall {
                annual_gap,
                monthly_adjustment: annual_gap / 12.0,
            }
        } else {
            Outlook::OnTrack {
                annual_surplus: annual_balance - required,
            }
        };
        (required, outlook)
    } else {
        let sustainable_annual = assets * config.safe_withdrawal_rate;
        (
            0.0,
            Outlook::Drawdown {
                sustainable_annual,
                sustainable_monthly: sustainable_annual / 12.0,
            },
        )
    };

    let has_children = !inputs.family_plan.children.is_empty();
    AgeSnapshot {
        age,
        assets,
        monthly_income: record.monthly_income,
        monthly_expense: record.monthly_expense,
        annual_balance,
        recommended_annual_saving,
        outlook,
        ideal: advice::ideal_benchmark(config, age, retire_age),
        recommendations: advice::recommendations(age, retire_age, annual_balance, has_children),
    }
}
