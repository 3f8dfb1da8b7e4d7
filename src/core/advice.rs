use serde::Serialize;

use super::config::PlannerConfig;
use super::salary::{self, NationalBracket, SalaryScore};
use super::schedule::{LifeEvent, Schedule};
use super::types::{CashflowKind, PlanInputs, Projection, UserType};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineKind {
    Graduation,
    Marriage,
    Childbirth,
    Loan,
    Goal,
    Cashflow,
    Retirement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub age: u32,
    pub kind: TimelineKind,
    pub label: String,
    /// Up-front cost of the event, zero when it has none.
    pub cost: f64,
}

/// Milestones of the plan ordered by age. Same-age entries keep declaration order.
pub fn timeline(inputs: &PlanInputs, config: &PlannerConfig) -> Vec<TimelineEntry> {
    let inputs = inputs.sanitized();
    let schedule = Schedule::build(&inputs, config);
    let mut entries: Vec<TimelineEntry> = schedule
        .events()
        .iter()
        .filter_map(|event| timeline_entry(event, config))
        .collect();
    entries.sort_by_key(|entry| entry.age);
    entries
}

fn timeline_entry(event: &LifeEvent, config: &PlannerConfig) -> Option<TimelineEntry> {
    let entry = match event {
        LifeEvent::Graduation { age, .. } => TimelineEntry {
            age: *age,
            kind: TimelineKind::Graduation,
            label: "Start first job".to_string(),
            cost: 0.0,
        },
        LifeEvent::ScholarshipRepayment { .. } => return None,
        LifeEvent::Marriage { age, .. } => TimelineEntry {
            age: *age,
            kind: TimelineKind::Marriage,
            label: "Marriage".to_string(),
            cost: config.marriage_ceremony_cost,
        },
        LifeEvent::Childbirth { index, child } => TimelineEntry {
            age: child.birth_age,
            kind: TimelineKind::Childbirth,
            label: format!("Child {} born", index + 1),
            cost: config.childbirth_cost,
        },
        LifeEvent::Loan(loan) => TimelineEntry {
            age: loan.age,
            kind: TimelineKind::Loan,
            label: loan.name.clone(),
            cost: loan.principal,
        },
        LifeEvent::Goal { goal, age } => {
            if goal.recurring {
                return None;
            }
            TimelineEntry {
                age: *age,
                kind: TimelineKind::Goal,
                label: goal
                    .label
                    .clone()
                    .unwrap_or_else(|| goal_label(&goal.id).to_string()),
                cost: goal.cost,
            }
        }
        LifeEvent::Cashflow(event) => {
            let cost = match event.kind {
                CashflowKind::OneTimeExpense => event.amount,
                CashflowKind::OneTimeIncome => 0.0,
                CashflowKind::IncomeChange | CashflowKind::ExpenseChange => return None,
            };
            TimelineEntry {
                age: event.age,
                kind: TimelineKind::Cashflow,
                label: event.description.clone(),
                cost,
            }
        }
        LifeEvent::Retirement { age, .. } => TimelineEntry {
            age: *age,
            kind: TimelineKind::Retirement,
            label: "Retirement".to_string(),
            cost: 0.0,
        },
    };
    Some(entry)
}

/// Display names for the built-in goal catalogue. Unknown ids are shown as-is.
pub fn goal_label(id: &str) -> &str {
    match id {
        "tokyo-center" => "Buy a home in central Tokyo",
        "tokyo-premium" => "Buy a home in a premium metro area",
        "tokyo-suburbs" => "Buy a home in the suburbs",
        "tokyo-distant" => "Buy a home further out",
        "renovation" => "Home renovation",
        "car-new" => "Buy a new car",
        "car-premium" => "Buy a premium car",
        "car-luxury" => "Buy a luxury car",
        "car-replacement" => "Regular car replacement",
        "world-trip" => "Trip around the world",
        "annual-travel-basic" => "Yearly domestic travel",
        "annual-travel-premium" => "Yearly overseas travel",
        "luxury-travel" => "Anniversary luxury trip",
        "mba-domestic" => "Domestic MBA",
        "mba-overseas" => "Overseas MBA",
        "language-study" => "Language study abroad",
        "skill-investment" => "Ongoing skill investment",
        "startup-small" => "Start a small business",
        "startup-large" => "Start a large venture",
        other => other,
    }
}

/// How demanding a monthly income target is.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeTier {
    /// Above 1,000,000 a month: revisit goals, spouse income or schooling choices.
    Stretch,
    /// Above 500,000 a month: reachable with steady career growth.
    Attainable,
    Comfortable,
}

pub fn income_tier(monthly_income: f64) -> IncomeTier {
    if monthly_income > 1_000_000.0 {
        IncomeTier::Stretch
    } else if monthly_income > 500_000.0 {
        IncomeTier::Attainable
    } else {
        IncomeTier::Comfortable
    }
}

/// Job-hunting effort a student needs to land a given annual salary.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudentEffortLevel {
    Standard,
    Ambitious,
    Demanding,
    Exceptional,
    Legendary,
}

pub fn student_effort_level(annual_income: f64) -> StudentEffortLevel {
    if annual_income <= 3_000_000.0 {
        StudentEffortLevel::Standard
    } else if annual_income <= 5_000_000.0 {
        StudentEffortLevel::Ambitious
    } else if annual_income <= 7_000_000.0 {
        StudentEffortLevel::Demanding
    } else if annual_income <= 10_000_000.0 {
        StudentEffortLevel::Exceptional
    } else {
        StudentEffortLevel::Legendary
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    BuildInvestmentHabit,
    TrimSpendingOrAddSideIncome,
    BuildEmergencyFund,
    PlanMarriageAndHousing,
    StartEducationFund,
    UseTaxAdvantagedAccounts,
    PrepareForEducationPeak,
    DesignRetirementLife,
    InvestSurplus,
    CheckPensionEstimate,
    EstimateRetirementSpending,
    PlanMortgagePayoff,
    PlanDrawdown,
    ReserveCareCosts,
}

pub fn recommendations(
    age: u32,
    retire_age: u32,
    annual_balance: f64,
    has_children: bool,
) -> Vec<Recommendation> {
    use Recommendation::*;

    let mut out = Vec::new();
    if age < 30 {
        out.push(BuildInvestmentHabit);
        if annual_balance < 500_000.0 {
            out.push(TrimSpendingOrAddSideIncome);
        }
        out.push(BuildEmergencyFund);
    } else if age < 40 {
        out.push(PlanMarriageAndHousing);
        if has_children {
            out.push(StartEducationFund);
        }
        out.push(UseTaxAdvantagedAccounts);
    } else if age < 50 {
        out.push(PrepareForEducationPeak);
        out.push(DesignRetirementLife);
        if annual_balance > 1_000_000.0 {
            out.push(InvestSurplus);
        }
    } else if age < retire_age {
        out.extend([CheckPensionEstimate, EstimateRetirementSpending, PlanMortgagePayoff]);
    } else {
        out.extend([PlanDrawdown, ReserveCareCosts]);
    }
    out
}

/// Typical income and savings for someone of this age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealBenchmark {
    pub ideal_annual_income: f64,
    pub ideal_monthly_income: f64,
    pub ideal_total_savings: f64,
}

pub fn ideal_benchmark(config: &PlannerConfig, age: u32, retire_age: u32) -> IdealBenchmark {
    let annual = salary::reference_annual_income(config, age);
    let ideal_total_savings = if age < 30 {
        annual
    } else if age < 40 {
        annual * 2.5
    } else if age < 50 {
        annual * 4.0
    } else if age < retire_age {
        annual * 6.0
    } else {
        config.retirement_asset_goal
    };
    IdealBenchmark {
        ideal_annual_income: annual,
        ideal_monthly_income: annual / 12.0,
        ideal_total_savings,
    }
}

/// Headline assessment of the income a plan asks for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAdvice {
    pub monthly_income_target: f64,
    pub salary_score: SalaryScore,
    pub national_bracket: NationalBracket,
    pub income_tier: IncomeTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_effort: Option<StudentEffortLevel>,
}

/// Uses the first year of required income in required-income mode and the
/// current monthly income otherwise.
pub fn advise(inputs: &PlanInputs, config: &PlannerConfig, projection: &Projection) -> PlanAdvice {
    let monthly_income_target = if projection.mode.is_required_income() {
        projection
            .records
            .iter()
            .filter_map(|r| r.required_annual_income)
            .find(|annual| *annual > 0.0)
            .map(|annual| annual / 12.0)
            .unwrap_or(0.0)
    } else {
        inputs.basic_info.monthly_income
    };
    let annual = monthly_income_target * 12.0;
    let student_effort = (inputs.basic_info.user_type == UserType::Student)
        .then(|| student_effort_level(annual));

    PlanAdvice {
        monthly_income_target,
        salary_score: projection.salary_score,
        national_bracket: salary::national_bracket(config, annual),
        income_tier: income_tier(monthly_income_target),
        student_effort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::project;
    use crate::core::types::{CashflowEvent, Child, LifeGoal, ProjectionMode};

    fn goal(id: &str, age: u32, cost: f64) -> LifeGoal {
        LifeGoal {
            id: id.to_string(),
            cost,
            age: Some(age),
            ..LifeGoal::default()
        }
    }

    #[test]
    fn timeline_is_sorted_by_age_and_stable_for_ties() {
        let config = PlannerConfig::default();
        let mut inputs = PlanInputs::default();
        inputs.basic_info.current_age = 25;
        inputs.family_plan.marriage_age = Some(30);
        inputs.family_plan.children.push(Child {
            birth_age: 30,
            ..Child::default()
        });
        inputs.life_goals.push(goal("world-trip", 28, 2_000_000.0));
        inputs.life_goals.push(goal("mba-overseas", 30, 15_000_000.0));

        let entries = timeline(&inputs, &config);
        let ages: Vec<u32> = entries.iter().map(|e| e.age).collect();
        assert_eq!(ages, vec![28, 30, 30, 30, 65]);

        assert_eq!(entries[0].label, "Trip around the world");
        assert_eq!(entries[1].kind, TimelineKind::Marriage);
        assert_eq!(entries[1].cost, 3_000_000.0);
        assert_eq!(entries[2].label, "Child 1 born");
        assert_eq!(entries[2].cost, 500_000.0);
        assert_eq!(entries[3].label, "Overseas MBA");
        assert_eq!(entries[4].kind, TimelineKind::Retirement);
    }

    #[test]
    fn timeline_skips_recurring_goals_and_rate_changes() {
        let config = PlannerConfig::default();
        let mut inputs = PlanInputs::default();
        inputs.life_goals.push(LifeGoal {
            id: "annual-travel-premium".to_string(),
            cost: 600_000.0,
            recurring: true,
            ..LifeGoal::default()
        });
        inputs.life_events.push(CashflowEvent {
            id: 1,
            age: 30,
            kind: CashflowKind::IncomeChange,
            amount: 50_000.0,
            description: "promotion".to_string(),
        });
        inputs.life_events.push(CashflowEvent {
            id: 2,
            age: 31,
            kind: CashflowKind::OneTimeExpense,
            amount: 800_000.0,
            description: "wedding gift".to_string(),
        });

        let entries = timeline(&inputs, &config);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "wedding gift");
        assert_eq!(entries[0].cost, 800_000.0);
        assert_eq!(entries[1].kind, TimelineKind::Retirement);
    }

    #[test]
    fn custom_goal_label_wins_over_catalogue() {
        let config = PlannerConfig::default();
        let mut inputs = PlanInputs::default();
        let mut custom = goal("world-trip", 40, 1.0);
        custom.label = Some("Sabbatical".to_string());
        inputs.life_goals.push(custom);
        inputs.life_goals.push(goal("boat", 41, 1.0));

        let entries = timeline(&inputs, &config);
        assert_eq!(entries[0].label, "Sabbatical");
        assert_eq!(entries[1].label, "boat");
    }

    #[test]
    fn income_tiers_use_strict_thresholds() {
        assert_eq!(income_tier(1_000_001.0), IncomeTier::Stretch);
        assert_eq!(income_tier(1_000_000.0), IncomeTier::Attainable);
        assert_eq!(income_tier(500_000.0), IncomeTier::Comfortable);
    }

    #[test]
    fn student_effort_thresholds_are_inclusive() {
        assert_eq!(student_effort_level(3_000_000.0), StudentEffortLevel::Standard);
        assert_eq!(student_effort_level(3_000_001.0), StudentEffortLevel::Ambitious);
        assert_eq!(student_effort_level(7_000_000.0), StudentEffortLevel::Demanding);
        assert_eq!(student_effort_level(10_000_000.0), StudentEffortLevel::Exceptional);
        assert_eq!(student_effort_level(50_000_000.0), StudentEffortLevel::Legendary);
    }

    #[test]
    fn recommendations_follow_life_decade() {
        use Recommendation::*;
        assert_eq!(
            recommendations(25, 65, 100_000.0, false),
            vec![BuildInvestmentHabit, TrimSpendingOrAddSideIncome, BuildEmergencyFund]
        );
        assert_eq!(
            recommendations(35, 65, 0.0, true),
            vec![PlanMarriageAndHousing, StartEducationFund, UseTaxAdvantagedAccounts]
        );
        assert_eq!(
            recommendations(45, 65, 2_000_000.0, false),
            vec![PrepareForEducationPeak, DesignRetirementLife, InvestSurplus]
        );
        assert_eq!(recommendations(55, 65, 0.0, false).len(), 3);
        assert_eq!(
            recommendations(55, 55, 0.0, false),
            vec![PlanDrawdown, ReserveCareCosts]
        );
    }

    #[test]
    fn ideal_savings_scale_with_age() {
        let config = PlannerConfig::default();
        assert_eq!(ideal_benchmark(&config, 25, 65).ideal_total_savings, 3_420_000.0);
        assert_eq!(ideal_benchmark(&config, 35, 65).ideal_total_savings, 4_680_000.0 * 2.5);
        assert_eq!(ideal_benchmark(&config, 45, 65).ideal_total_savings, 5_480_000.0 * 4.0);
        assert_eq!(ideal_benchmark(&config, 55, 65).ideal_total_savings, 5_820_000.0 * 6.0);
        assert_eq!(ideal_benchmark(&config, 70, 65).ideal_total_savings, 30_000_000.0);
        assert_eq!(ideal_benchmark(&config, 30, 65).ideal_monthly_income, 4_090_000.0 / 12.0);
    }

    #[test]
    fn student_advice_in_required_mode_scores_the_solved_income() {
        let config = PlannerConfig::default();
        let mut inputs = PlanInputs::default();
        inputs.basic_info.user_type = UserType::Student;
        inputs.settings.mode = ProjectionMode::RequiredFlat;
        let projection = project(&inputs, &config);
        let advice = advise(&inputs, &config, &projection);

        let first_required = projection
            .record_at(22)
            .and_then(|r| r.required_annual_income)
            .unwrap_or_default();
        assert!(first_required > 0.0);
        assert_eq!(advice.monthly_income_target, first_required / 12.0);
        assert_eq!(advice.student_effort, Some(student_effort_level(first_required)));
    }

    #[test]
    fn forward_advice_for_working_user_has_no_effort_level() {
        let config = PlannerConfig::default();
        let inputs = PlanInputs::default();
        let projection = project(&inputs, &config);
        let advice = advise(&inputs, &config, &projection);

        assert_eq!(advice.monthly_income_target, 80_000.0);
        assert_eq!(advice.income_tier, IncomeTier::Comfortable);
        assert!(advice.student_effort.is_none());
    }
}
