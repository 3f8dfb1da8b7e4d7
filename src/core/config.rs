use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::error::{PlanError, PlanResult};
use super::types::EducationType;

/// Annual salary statistics for one representative age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryBucket {
    pub average: f64,
    pub median: f64,
    pub deviation: f64,
}

/// Monthly school costs per stage plus the total university tuition for one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationTrackCosts {
    pub elementary_monthly: f64,
    pub middle_monthly: f64,
    pub high_monthly: f64,
    pub university_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationCosts {
    pub public: EducationTrackCosts,
    pub private: EducationTrackCosts,
    pub mixed: EducationTrackCosts,
}

impl EducationCosts {
    pub fn track(&self, education: EducationType) -> &EducationTrackCosts {
        match education {
            EducationType::Public => &self.public,
            EducationType::Private => &self.private,
            EducationType::Mixed => &self.mixed,
        }
    }
}

impl Default for EducationCosts {
    fn default() -> Self {
        Self {
            public: EducationTrackCosts {
                elementary_monthly: 15_000.0,
                middle_monthly: 20_000.0,
                high_monthly: 25_000.0,
                university_total: 4_000_000.0,
            },
            private: EducationTrackCosts {
                elementary_monthly: 60_000.0,
                middle_monthly: 80_000.0,
                high_monthly: 100_000.0,
                university_total: 5_000_000.0,
            },
            mixed: EducationTrackCosts {
                elementary_monthly: 60_000.0,
                middle_monthly: 80_000.0,
                high_monthly: 100_000.0,
                university_total: 4_500_000.0,
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanCategory {
    Housing,
    Car,
}

/// A purchasable asset financed by an amortizing loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPreset {
    pub id: String,
    pub name: String,
    pub category: LoanCategory,
    pub principal: f64,
    pub term_years: u32,
    pub annual_rate_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationMultipliers {
    pub high_school: f64,
    pub university: f64,
    pub graduate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerMultipliers {
    pub public_service: f64,
    pub large_company: f64,
    pub medium_company: f64,
    pub small_company: f64,
    pub startup: f64,
    pub freelance: f64,
}

/// National annual income breakpoints, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileBreakpoints {
    pub top1: f64,
    pub top5: f64,
    pub top10: f64,
    pub top25: f64,
    pub top50: f64,
    pub bottom25: f64,
    pub bottom10: f64,
}

/// Every table and constant the engine reads. Injected by callers so tests can
/// swap in alternative tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    pub salary_by_age: BTreeMap<u32, SalaryBucket>,
    pub education_multipliers: EducationMultipliers,
    pub career_multipliers: CareerMultipliers,
    pub percentiles: PercentileBreakpoints,
    pub education_costs: EducationCosts,
    pub loan_presets: Vec<LoanPreset>,
    pub marriage_expense_delta: f64,
    pub marriage_ceremony_cost: f64,
    pub childbirth_cost: f64,
    pub infant_monthly_cost: f64,
    pub retirement_income_ratio: f64,
    pub retirement_expense_factor: f64,
    pub retirement_asset_goal: f64,
    pub safe_withdrawal_rate: f64,
    pub loan_limit_ratio: f64,
    pub after_tax_rate: f64,
    pub basic_living_cost: f64,
    pub earning_growth_rate: f64,
    pub peak_earning_age: u32,
    pub fallback_annual_income: f64,
    pub default_end_age: u32,
    /// Upper bound for every age in a plan, including the projection end.
    pub max_end_age: u32,
    pub max_loan_term_years: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let salary_by_age = [
            (20, 2_780_000.0, 2_500_000.0, 600_000.0),
            (25, 3_420_000.0, 3_200_000.0, 700_000.0),
            (30, 4_090_000.0, 3_800_000.0, 850_000.0),
            (35, 4_680_000.0, 4_300_000.0, 950_000.0),
            (40, 5_140_000.0, 4_700_000.0, 1_100_000.0),
            (45, 5_480_000.0, 5_000_000.0, 1_200_000.0),
            (50, 5_760_000.0, 5_200_000.0, 1_300_000.0),
            (55, 5_820_000.0, 5_250_000.0, 1_350_000.0),
            (60, 4_950_000.0, 4_500_000.0, 1_200_000.0),
        ]
        .into_iter()
        .map(|(age, average, median, deviation)| {
            (
                age,
                SalaryBucket {
                    average,
                    median,
                    deviation,
                },
            )
        })
        .collect();

        Self {
            salary_by_age,
            education_multipliers: EducationMultipliers {
                high_school: 0.85,
                university: 1.0,
                graduate: 1.25,
            },
            career_multipliers: CareerMultipliers {
                public_service: 0.95,
                large_company: 1.15,
                medium_company: 0.95,
                small_company: 0.80,
                startup: 0.90,
                freelance: 0.85,
            },
            percentiles: PercentileBreakpoints {
                top1: 20_000_000.0,
                top5: 12_000_000.0,
                top10: 8_500_000.0,
                top25: 6_000_000.0,
                top50: 4_330_000.0,
                bottom25: 3_200_000.0,
                bottom10: 2_500_000.0,
            },
            education_costs: EducationCosts::default(),
            loan_presets: default_loan_presets(),
            marriage_expense_delta: 50_000.0,
            marriage_ceremony_cost: 3_000_000.0,
            childbirth_cost: 500_000.0,
            infant_monthly_cost: 30_000.0,
            retirement_income_ratio: 0.6,
            retirement_expense_factor: 0.8,
            retirement_asset_goal: 30_000_000.0,
            safe_withdrawal_rate: 0.04,
            loan_limit_ratio: 5.0,
            after_tax_rate: 0.8,
            basic_living_cost: 250_000.0,
            earning_growth_rate: 0.03,
            peak_earning_age: 50,
            fallback_annual_income: 4_000_000.0,
            default_end_age: 80,
            max_end_age: 120,
            max_loan_term_years: 50,
        }
    }
}

impl PlannerConfig {
    /// Loads a config document. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> PlanResult<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.default_end_age > self.max_end_age {
            return Err(PlanError::InvalidInput(format!(
                "defaultEndAge must be <= maxEndAge ({})",
                self.max_end_age
            )));
        }
        for preset in &self.loan_presets {
            let rate = preset.annual_rate_percent;
            if !preset.principal.is_finite()
                || preset.principal <= 0.0
                || preset.term_years == 0
                || preset.term_years > self.max_loan_term_years
                || !rate.is_finite()
                || rate < 0.0
            {
                return Err(PlanError::InvalidInput(format!(
                    "loan preset '{}' needs principal > 0, termYears in 1..={} and a non-negative rate",
                    preset.id, self.max_loan_term_years
                )));
            }
        }
        Ok(())
    }

    pub fn loan_preset(&self, id: &str) -> Option<&LoanPreset> {
        self.loan_presets.iter().find(|p| p.id == id)
    }
}

fn default_loan_presets() -> Vec<LoanPreset> {
    [
        ("tokyo-center", "Home in central Tokyo", LoanCategory::Housing, 80_000_000.0, 35, 0.5),
        ("tokyo-premium", "Home in a premium metro area", LoanCategory::Housing, 120_000_000.0, 35, 0.5),
        ("tokyo-suburbs", "Home in the suburbs", LoanCategory::Housing, 50_000_000.0, 35, 0.5),
        ("tokyo-distant", "Home further out", LoanCategory::Housing, 35_000_000.0, 35, 0.5),
        ("car-new", "New car", LoanCategory::Car, 3_000_000.0, 7, 3.0),
        ("car-premium", "Premium car", LoanCategory::Car, 6_000_000.0, 7, 3.0),
        ("car-luxury", "Luxury car", LoanCategory::Car, 12_000_000.0, 5, 3.5),
    ]
    .into_iter()
    .map(|(id, name, category, principal, term_years, annual_rate_percent)| LoanPreset {
        id: id.to_string(),
        name: name.to_string(),
        category,
        principal,
        term_years,
        annual_rate_percent,
    })
    .collect()
}
