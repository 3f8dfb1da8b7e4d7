use super::config::PlannerConfig;
use super::salary::{self, SalaryScore};
use super::schedule::{LifeEvent, Schedule, StageDelta};
use super::types::{
    ExpenseBreakdown, LoanEvent, PlanInputs, Projection, ProjectionMode, ProjectionRecord,
};

#[derive(Debug, Clone)]
struct StageState {
    own_income: f64,
    other_income: f64,
    expenses: ExpenseBreakdown,
    assets: f64,
    retired: bool,
}

impl StageState {
    fn new(inputs: &PlanInputs, config: &PlannerConfig) -> Self {
        let info = &inputs.basic_info;
        let living = if inputs.settings.mode.is_required_income() {
            config.basic_living_cost
        } else {
            info.monthly_expense
        };
        Self {
            own_income: info.monthly_income,
            other_income: 0.0,
            expenses: ExpenseBreakdown {
                living,
                ..ExpenseBreakdown::default()
            },
            assets: info.current_savings,
            retired: false,
        }
    }

    fn advance(&mut self, schedule: &Schedule<'_>, age: u32, retirement_expense_factor: f64) {
        for delta in schedule.deltas_at(age) {
            self.apply(delta, retirement_expense_factor);
        }
    }

    fn apply(&mut self, delta: StageDelta, retirement_expense_factor: f64) {
        match delta {
            StageDelta::SetOwnIncome(monthly) => {
                if !self.retired {
                    self.own_income = monthly;
                }
            }
            StageDelta::OtherIncome(monthly) => {
                if !self.retired {
                    self.other_income += monthly;
                }
            }
            StageDelta::Expense { category, monthly } => {
                let monthly = if self.retired && !category.is_debt_service() {
                    monthly * retirement_expense_factor
                } else {
                    monthly
                };
                *self.expenses.get_mut(category) += monthly;
            }
            StageDelta::Asset { amount, .. } => self.assets += amount,
            StageDelta::Retire { pension_monthly } => {
                if !self.retired {
                    self.own_income = pension_monthly;
                    self.other_income = 0.0;
                    self.expenses.scale_living_costs(retirement_expense_factor);
                    self.retired = true;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct RequiredIncomePlan {
    first_age: u32,
    annual_by_age: Vec<f64>,
    lifetime_total: f64,
    allowances: ExpenseBreakdown,
    peak_loan: Option<LoanEvent>,
}

impl RequiredIncomePlan {
    fn annual_at(&self, age: u32) -> f64 {
        age.checked_sub(self.first_age)
            .and_then(|offset| self.annual_by_age.get(offset as usize))
            .copied()
            .unwrap_or(0.0)
    }
}

// Shared by `project` and `snapshot`.
pub(crate) struct Simulator<'a> {
    config: &'a PlannerConfig,
    schedule: Schedule<'a>,
    state: StageState,
    plan: Option<RequiredIncomePlan>,
    first_age: u32,
    end_age: u32,
    career_start_age: u32,
    next_age: u32,
}

impl<'a> Simulator<'a> {
    pub(crate) fn new(inputs: &PlanInputs, config: &'a PlannerConfig) -> Self {
        let inputs = inputs.sanitized();
        let schedule = Schedule::build(&inputs, config);
        let first_age = inputs.basic_info.current_age;
        let end_age = inputs.end_age(config);
        let plan = inputs
            .settings
            .mode
            .is_required_income()
            .then(|| solve_required_income(&inputs, config, &schedule, end_age));

        Self {
            config,
            state: StageState::new(&inputs, config),
            schedule,
            plan,
            first_age,
            end_age,
            career_start_age: inputs.career_start_age(),
            next_age: first_age,
        }
    }

    pub(crate) fn first_age(&self) -> u32 {
        self.first_age
    }

    pub(crate) fn end_age(&self) -> u32 {
        self.end_age
    }

    pub(crate) fn retire_age(&self) -> u32 {
        self.schedule.retire_age()
    }

    pub(crate) fn step(&mut self) -> Option<ProjectionRecord> {
        (self.next_age <= self.end_age).then(|| self.emit())
    }

    /// Steps until `age` (clamped to the end age) has been emitted and returns that record.
    /// At least one age is always emitted.
    pub(crate) fn advance_to(&mut self, age: u32) -> ProjectionRecord {
        let mut record = self.emit();
        while record.age < age && self.next_age <= self.end_age {
            record = self.emit();
        }
        record
    }

    fn emit(&mut self) -> ProjectionRecord {
        let age = self.next_age;
        self.next_age += 1;

        let factor = self.config.retirement_expense_factor;
        self.state.advance(&self.schedule, age, factor);

        let retire_age = self.retire_age();
        let working = (self.career_start_age..retire_age).contains(&age);
        let mut own_income = self.state.own_income;
        let mut breakdown = self.state.expenses;
        let mut required_annual_income = None;

        if let Some(plan) = &self.plan {
            let annual = plan.annual_at(age);
            required_annual_income = Some(annual);
            if working {
                own_income = annual / 12.0 * self.config.after_tax_rate;
                breakdown = breakdown.combined(&plan.allowances);
            }
        }

        let monthly_income = own_income + self.state.other_income;
        let recommended_monthly_saving = if age < retire_age {
            self.config.retirement_asset_goal / ((retire_age - age) as f64 * 12.0)
        } else {
            0.0
        };

        let record = ProjectionRecord {
            age,
            monthly_income,
            monthly_expense: breakdown.total(),
            cumulative_assets: self.state.assets.max(0.0),
            required_annual_income,
            reference_monthly_income: salary::reference_monthly_income(self.config, age),
            recommended_monthly_saving,
            expense_breakdown: breakdown,
        };

        // Savings allowances are not spent, so only real outlays leave the balance.
        self.state.assets += (monthly_income - self.state.expenses.total()) * 12.0;
        record
    }

    fn into_parts(self) -> (u32, Option<RequiredIncomePlan>) {
        (self.retire_age(), self.plan)
    }
}

pub fn project(inputs: &PlanInputs, config: &PlannerConfig) -> Projection {
    let mode = inputs.settings.mode;
    let mut simulator = Simulator::new(inputs, config);
    let mut records = Vec::with_capacity((simulator.end_age() - simulator.first_age() + 1) as usize);
    while let Some(record) = simulator.step() {
        records.push(record);
    }
    let career_start_age = simulator.career_start_age;
    let (retire_age, plan) = simulator.into_parts();

    let salary_score = score_projection(config, &records, career_start_age, plan.is_some());
    let (peak_loan, lifetime_required_income) = match plan {
        Some(plan) => (plan.peak_loan, Some(plan.lifetime_total)),
        None => (None, None),
    };

    if let Some(last) = records.last() {
        log::debug!(
            "projected {} ages in {:?} mode, assets at {} = {:.0}",
            records.len(),
            mode,
            last.age,
            last.cumulative_assets
        );
    }

    Projection {
        mode,
        retire_age,
        records,
        peak_loan,
        lifetime_required_income,
        salary_score,
    }
}

fn score_projection(
    config: &PlannerConfig,
    records: &[ProjectionRecord],
    career_start_age: u32,
    required_mode: bool,
) -> SalaryScore {
    let first = records.first();
    let current_age = first.map(|r| r.age).unwrap_or(career_start_age);
    if required_mode {
        let at_career_start = records
            .iter()
            .find(|r| r.age >= career_start_age && r.required_annual_income.unwrap_or(0.0) > 0.0);
        if let Some(record) = at_career_start {
            return salary::score(
                config,
                record.required_annual_income.unwrap_or(0.0),
                record.age,
            );
        }
        return salary::score(config, 0.0, current_age);
    }
    let annual_income = first.map(|r| r.monthly_income * 12.0).unwrap_or(0.0);
    salary::score(config, annual_income, current_age)
}

/// Two-pass solve: state evolution does not depend on income, so the first
/// pass walks the schedule once to size each working year's need.
fn solve_required_income(
    inputs: &PlanInputs,
    config: &PlannerConfig,
    schedule: &Schedule<'_>,
    end_age: u32,
) -> RequiredIncomePlan {
    let first_age = inputs.basic_info.current_age;
    let career_start_age = inputs.career_start_age();
    let retire_age = schedule.retire_age();
    let working_months = retire_age.saturating_sub(career_start_age).max(1) as f64 * 12.0;
    let after_tax_rate = if config.after_tax_rate > 0.0 {
        config.after_tax_rate
    } else {
        1.0
    };

    let mut allowances = schedule
        .one_off_costs(first_age, end_age)
        .scaled(1.0 / working_months);
    allowances.retirement_saving =
        (config.retirement_asset_goal - inputs.basic_info.current_savings).max(0.0)
            / working_months;
    allowances.discretionary += inputs.settings.target_monthly_surplus.max(0.0);

    let peak_loan = peak_loan(schedule);
    let loan_floor = match &peak_loan {
        Some(loan) if config.loan_limit_ratio > 0.0 => loan.principal / config.loan_limit_ratio,
        _ => 0.0,
    };

    let mut state = StageState::new(inputs, config);
    let mut per_year = Vec::with_capacity((end_age - first_age + 1) as usize);
    for age in first_age..=end_age {
        state.advance(schedule, age, config.retirement_expense_factor);
        let annual = if (career_start_age..retire_age).contains(&age) {
            let planned = state.expenses.total() + allowances.total();
            let need = (planned - state.other_income).max(0.0);
            (need * 12.0 / after_tax_rate).max(loan_floor)
        } else {
            0.0
        };
        per_year.push(annual);
    }

    let lifetime_total: f64 = per_year.iter().sum();
    let annual_by_age = match inputs.settings.mode {
        ProjectionMode::RequiredFlat | ProjectionMode::Forward => per_year,
        ProjectionMode::RequiredEarningCurve => distribute_along_earning_curve(
            config,
            first_age,
            career_start_age,
            retire_age,
            per_year.len(),
            lifetime_total,
        ),
    };

    RequiredIncomePlan {
        first_age,
        annual_by_age,
        lifetime_total,
        allowances,
        peak_loan,
    }
}

fn peak_loan(schedule: &Schedule<'_>) -> Option<LoanEvent> {
    schedule
        .events()
        .iter()
        .filter_map(|event| match event {
            LifeEvent::Loan(loan) if loan.principal > 0.0 => Some(loan),
            _ => None,
        })
        .fold(None, |best: Option<&LoanEvent>, loan| match best {
            Some(b) if b.principal >= loan.principal => Some(b),
            _ => Some(loan),
        })
        .cloned()
}

fn earning_power(config: &PlannerConfig, age: u32, career_start_age: u32) -> f64 {
    let years = age
        .min(config.peak_earning_age)
        .saturating_sub(career_start_age);
    (1.0 + config.earning_growth_rate).powi(years as i32)
}

fn distribute_along_earning_curve(
    config: &PlannerConfig,
    first_age: u32,
    career_start_age: u32,
    retire_age: u32,
    len: usize,
    lifetime_total: f64,
) -> Vec<f64> {
    let weights: Vec<f64> = (0..len as u32)
        .map(|offset| {
            let age = first_age + offset;
            if (career_start_age..retire_age).contains(&age) {
                earning_power(config, age, career_start_age)
            } else {
                0.0
            }
        })
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 {
        return vec![0.0; len];
    }
    weights
        .into_iter()
        .map(|w| lifetime_total * w / weight_sum)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        Child, EducationType, LifeGoal, LoanPlan, SpouseWorkType, UserType,
    };
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> PlanInputs {
        let mut inputs = PlanInputs::default();
        inputs.basic_info.current_age = 20;
        inputs.basic_info.current_savings = 100_000.0;
        inputs.basic_info.monthly_income = 80_000.0;
        inputs.basic_info.monthly_expense = 70_000.0;
        inputs.basic_info.retire_age = 65;
        inputs
    }

    fn required_inputs(mode: ProjectionMode) -> PlanInputs {
        let mut inputs = PlanInputs::default();
        inputs.basic_info.current_age = 30;
        inputs.basic_info.current_savings = 0.0;
        inputs.basic_info.retire_age = 40;
        inputs.settings.mode = mode;
        inputs.settings.end_age = Some(50);
        inputs
    }

    fn loan(age: u32, principal: f64, term_years: u32) -> LoanEvent {
        LoanEvent {
            age,
            name: "home".to_string(),
            principal,
            term_years,
            annual_rate_percent: 1.0,
        }
    }

    #[test]
    fn one_year_of_surplus_accumulates_into_next_age() {
        let projection = project(&sample_inputs(), &PlannerConfig::default());

        let first = projection.record_at(20).expect("current age present");
        assert_eq!(first.cumulative_assets, 100_000.0);
        assert_eq!(first.monthly_income, 80_000.0);
        assert_eq!(first.monthly_expense, 70_000.0);
        assert_eq!(
            projection.record_at(21).expect("age 21").cumulative_assets,
            220_000.0
        );
        assert_eq!(projection.records.len(), 61);
        assert!(projection.peak_loan.is_none());
        assert!(projection.lifetime_required_income.is_none());
        assert!(projection.records.iter().all(|r| r.required_annual_income.is_none()));
    }

    #[test]
    fn forward_assets_are_clamped_for_output() {
        let mut inputs = sample_inputs();
        inputs.basic_info.monthly_expense = 300_000.0;
        let projection = project(&inputs, &PlannerConfig::default());

        assert!(projection.records.iter().all(|r| r.cumulative_assets >= 0.0));
        assert_eq!(projection.record_at(22).expect("age 22").cumulative_assets, 0.0);
    }

    #[test]
    fn loan_pays_until_term_end_and_not_after() {
        let mut inputs = sample_inputs();
        inputs.loans.push(loan(30, 30_000_000.0, 35));
        let projection = project(&inputs, &PlannerConfig::default());
        let payment = inputs.loans[0].monthly_payment();

        assert_eq!(projection.record_at(29).expect("29").expense_breakdown.loans, 0.0);
        for age in 30..65 {
            let loans = projection.record_at(age).expect("age").expense_breakdown.loans;
            assert_approx(loans, payment);
        }
        for age in 65..=80 {
            let loans = projection.record_at(age).expect("age").expense_breakdown.loans;
            assert_eq!(loans, 0.0, "age {age}");
        }
    }

    #[test]
    fn retirement_switches_to_pension_and_cuts_living_costs() {
        let projection = project(&sample_inputs(), &PlannerConfig::default());
        let at_64 = projection.record_at(64).expect("64");
        let at_65 = projection.record_at(65).expect("65");

        assert_eq!(at_64.monthly_income, 80_000.0);
        assert_approx(at_65.monthly_income, 4_950_000.0 / 12.0 * 0.6);
        assert_approx(at_65.monthly_expense, 70_000.0 * 0.8);
        assert_eq!(at_65.recommended_monthly_saving, 0.0);
        assert_approx(at_64.recommended_monthly_saving, 30_000_000.0 / 12.0);
    }

    #[test]
    fn student_income_switches_at_graduation() {
        let mut inputs = sample_inputs();
        inputs.basic_info.user_type = UserType::Student;
        inputs.basic_info.monthly_income = 30_000.0;
        inputs.basic_info.graduation_age = 22;
        let projection = project(&inputs, &PlannerConfig::default());

        assert_eq!(projection.record_at(21).expect("21").monthly_income, 30_000.0);
        assert_eq!(projection.record_at(22).expect("22").monthly_income, 250_000.0);
    }

    #[test]
    fn marriage_adds_spouse_income_and_household_cost() {
        let mut inputs = sample_inputs();
        inputs.family_plan.marriage_age = Some(28);
        inputs.family_plan.spouse_work_type = SpouseWorkType::PartTime;
        inputs.family_plan.spouse_income = 100_000.0;
        let projection = project(&inputs, &PlannerConfig::default());
        let married = projection.record_at(28).expect("28");

        assert_eq!(married.monthly_income, 180_000.0);
        assert_eq!(married.expense_breakdown.living, 120_000.0);
    }

    #[test]
    fn child_costs_flow_through_education_category() {
        let mut inputs = sample_inputs();
        inputs.basic_info.monthly_income = 500_000.0;
        inputs.family_plan.children.push(Child {
            birth_age: 28,
            education_type: EducationType::Public,
            high_education: false,
        });
        let projection = project(&inputs, &PlannerConfig::default());
        let education = |age| projection.record_at(age).expect("age").expense_breakdown.education;

        assert_eq!(education(27), 0.0);
        assert_eq!(education(28), 30_000.0);
        assert_eq!(education(34), 45_000.0);
        assert_eq!(education(40), 50_000.0);
        assert_eq!(education(43), 55_000.0);
        assert_eq!(education(46), 30_000.0);
        assert_eq!(education(50), 0.0);

        let before = projection.record_at(45).expect("45");
        let start = projection.record_at(46).expect("46");
        let expected = before.cumulative_assets
            + (before.monthly_income - before.monthly_expense) * 12.0
            - 1_000_000.0;
        assert_approx(start.cumulative_assets, expected);
    }

    #[test]
    fn flat_required_income_reaches_retirement_goal() {
        let projection = project(
            &required_inputs(ProjectionMode::RequiredFlat),
            &PlannerConfig::default(),
        );
        let first = projection.record_at(30).expect("30");

        assert_approx_tol(first.required_annual_income.unwrap_or_default(), 7_500_000.0, 1e-3);
        assert_approx_tol(first.monthly_income, 500_000.0, 1e-3);
        assert_approx(first.expense_breakdown.retirement_saving, 250_000.0);
        assert_approx(first.expense_breakdown.living, 250_000.0);
        assert_approx_tol(
            projection.record_at(40).expect("40").cumulative_assets,
            30_000_000.0,
            1e-2,
        );
        assert_eq!(projection.record_at(40).expect("40").required_annual_income, Some(0.0));
        assert!(projection.peak_loan.is_none());
        assert_approx_tol(
            projection.lifetime_required_income.unwrap_or_default(),
            75_000_000.0,
            1e-2,
        );
    }

    #[test]
    fn peak_loan_sets_an_income_floor() {
        let mut inputs = required_inputs(ProjectionMode::RequiredFlat);
        inputs.loans.push(loan(32, 100_000_000.0, 35));
        inputs.loans.push(loan(33, 3_000_000.0, 7));
        let projection = project(&inputs, &PlannerConfig::default());

        let peak = projection.peak_loan.as_ref().expect("peak loan reported");
        assert_eq!(peak.principal, 100_000_000.0);
        for age in 30..40 {
            let required = projection
                .record_at(age)
                .and_then(|r| r.required_annual_income)
                .unwrap_or_default();
            assert!(required >= 20_000_000.0 - EPS, "age {age}: {required}");
        }
    }

    #[test]
    fn earning_curve_preserves_lifetime_total_and_rises_to_peak() {
        let config = PlannerConfig::default();
        let mut inputs = required_inputs(ProjectionMode::RequiredEarningCurve);
        inputs.basic_info.retire_age = 60;
        inputs.settings.end_age = Some(70);
        let curve = project(&inputs, &config);
        inputs.settings.mode = ProjectionMode::RequiredFlat;
        let flat = project(&inputs, &config);

        let lifetime = curve.lifetime_required_income.unwrap_or_default();
        let summed: f64 = curve
            .records
            .iter()
            .filter_map(|r| r.required_annual_income)
            .sum();
        assert_approx_tol(summed, lifetime, lifetime * 1e-12);
        assert_approx_tol(lifetime, flat.lifetime_required_income.unwrap_or_default(), 1e-3);

        let required = |age| {
            curve
                .record_at(age)
                .and_then(|r| r.required_annual_income)
                .unwrap_or_default()
        };
        assert_approx_tol(required(31) / required(30), 1.03, 1e-12);
        assert!(required(49) < required(50));
        assert_approx_tol(required(55), required(50), 1e-6);
        assert_eq!(required(60), 0.0);
    }

    #[test]
    fn recurring_goal_is_charged_monthly_until_retirement() {
        let mut inputs = sample_inputs();
        inputs.life_goals.push(LifeGoal {
            id: "annual-travel-basic".to_string(),
            cost: 240_000.0,
            recurring: true,
            ..LifeGoal::default()
        });
        let projection = project(&inputs, &PlannerConfig::default());

        assert_eq!(
            projection.record_at(20).expect("20").expense_breakdown.discretionary,
            20_000.0
        );
        assert_eq!(
            projection.record_at(65).expect("65").expense_breakdown.discretionary,
            0.0
        );
    }

    #[test]
    fn early_retirement_goal_moves_the_pension_switch() {
        let mut inputs = sample_inputs();
        inputs.life_goals.push(LifeGoal {
            id: "early-retire".to_string(),
            early_retire_age: Some(50),
            ..LifeGoal::default()
        });
        let projection = project(&inputs, &PlannerConfig::default());

        assert_eq!(projection.retire_age, 50);
        assert_approx(
            projection.record_at(50).expect("50").monthly_income,
            5_760_000.0 / 12.0 * 0.6,
        );
    }

    #[test]
    fn preset_loans_are_projected_like_explicit_loans() {
        let mut inputs = sample_inputs();
        inputs.loan_plans.push(LoanPlan {
            preset: "car-new".to_string(),
            age: 30,
        });
        let projection = project(&inputs, &PlannerConfig::default());

        assert_approx_tol(
            projection.record_at(30).expect("30").expense_breakdown.loans,
            39_639.90,
            0.01,
        );
        assert_eq!(projection.record_at(37).expect("37").expense_breakdown.loans, 0.0);
    }

    #[test]
    fn forward_salary_score_uses_current_income() {
        let projection = project(&sample_inputs(), &PlannerConfig::default());
        let expected = salary::score(&PlannerConfig::default(), 960_000.0, 20);
        assert_eq!(projection.salary_score, expected);
    }

    #[test]
    fn end_age_below_current_age_still_yields_one_record() {
        let mut inputs = sample_inputs();
        inputs.settings.end_age = Some(10);
        let projection = project(&inputs, &PlannerConfig::default());
        assert_eq!(projection.records.len(), 1);
        assert_eq!(projection.records[0].age, 20);
    }

    #[test]
    fn unbounded_end_age_is_capped_at_configured_maximum() {
        let config = PlannerConfig::default();
        let mut inputs = sample_inputs();
        inputs.settings.end_age = Some(u32::MAX);
        let projection = project(&inputs, &config);
        assert_eq!(projection.records.len(), 101);
        assert_eq!(projection.records.last().map(|r| r.age), Some(config.max_end_age));
    }

    #[test]
    fn oversized_loan_term_projects_without_overflow() {
        let mut inputs = sample_inputs();
        inputs.loans.push(loan(30, 1_200_000.0, 400_000_000));
        let projection = project(&inputs, &PlannerConfig::default());
        let at_80 = projection.record_at(80).expect("80");
        assert!(at_80.expense_breakdown.loans > 0.0);
        assert!(at_80.expense_breakdown.loans.is_finite());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_forward_records_are_contiguous_finite_and_non_negative(
            current_age in 18u32..60,
            working_years in 1u32..30,
            savings in 0u32..50_000_000,
            income in 0u32..1_000_000,
            expense in 0u32..1_000_000,
            children in 0usize..3,
            loan_principal in 0u32..80_000_000,
        ) {
            let mut inputs = PlanInputs::default();
            inputs.basic_info.current_age = current_age;
            inputs.basic_info.retire_age = current_age + working_years;
            inputs.basic_info.current_savings = savings as f64;
            inputs.basic_info.monthly_income = income as f64;
            inputs.basic_info.monthly_expense = expense as f64;
            inputs.family_plan.set_children_count(children, current_age);
            if loan_principal > 0 {
                inputs.loans.push(loan(current_age + 1, loan_principal as f64, 20));
            }

            let projection = project(&inputs, &PlannerConfig::default());
            let end = inputs.end_age(&PlannerConfig::default());
            prop_assert_eq!(projection.records.len() as u32, end - current_age + 1);
            for (offset, record) in projection.records.iter().enumerate() {
                prop_assert_eq!(record.age, current_age + offset as u32);
                prop_assert!(record.cumulative_assets >= 0.0);
                prop_assert!(record.monthly_income.is_finite());
                prop_assert!(record.monthly_expense.is_finite());
            }
        }

        #[test]
        fn prop_required_income_is_never_negative(
            current_age in 18u32..50,
            working_years in 1u32..40,
            savings in 0u32..40_000_000,
            flat in proptest::bool::ANY,
        ) {
            let mut inputs = PlanInputs::default();
            inputs.basic_info.current_age = current_age;
            inputs.basic_info.retire_age = current_age + working_years;
            inputs.basic_info.current_savings = savings as f64;
            inputs.settings.mode = if flat {
                ProjectionMode::RequiredFlat
            } else {
                ProjectionMode::RequiredEarningCurve
            };

            let projection = project(&inputs, &PlannerConfig::default());
            for record in &projection.records {
                let required = record.required_annual_income.unwrap_or(-1.0);
                prop_assert!(required >= 0.0 && required.is_finite());
            }
        }
    }
}
