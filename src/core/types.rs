use serde::{Deserialize, Serialize};

use super::amortization::monthly_payment;
use super::config::PlannerConfig;
use super::error::{PlanError, PlanResult};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserType {
    Student,
    #[default]
    Working,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpouseWorkType {
    #[default]
    FullTime,
    PartTime,
    Homemaker,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EducationType {
    #[default]
    Public,
    Private,
    Mixed,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionMode {
    /// Income and expense are inputs; assets are the output.
    #[default]
    Forward,
    /// Solve required income and spread the lifetime total along the earning-power curve.
    #[serde(alias = "required", alias = "requiredEarningCurve")]
    RequiredEarningCurve,
    /// Solve required income independently for each working year.
    #[serde(alias = "requiredFlat")]
    RequiredFlat,
}

impl ProjectionMode {
    pub fn is_required_income(self) -> bool {
        !matches!(self, ProjectionMode::Forward)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scholarship {
    pub debt: f64,
    pub annual_interest_rate: f64,
    pub repayment_years: u32,
}

impl Default for Scholarship {
    fn default() -> Self {
        Self {
            debt: 0.0,
            annual_interest_rate: 0.3,
            repayment_years: 15,
        }
    }
}

impl Scholarship {
    pub fn monthly_payment(&self) -> f64 {
        monthly_payment(self.debt, self.annual_interest_rate, self.repayment_years)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicInfo {
    pub user_type: UserType,
    pub current_age: u32,
    pub current_savings: f64,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub retire_age: u32,
    pub graduation_age: u32,
    pub starting_salary: f64,
    pub scholarship: Scholarship,
}

impl Default for BasicInfo {
    fn default() -> Self {
        Self {
            user_type: UserType::Working,
            current_age: 20,
            current_savings: 100_000.0,
            monthly_income: 80_000.0,
            monthly_expense: 70_000.0,
            retire_age: 65,
            graduation_age: 22,
            starting_salary: 250_000.0,
            scholarship: Scholarship::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Child {
    pub birth_age: u32,
    pub education_type: EducationType,
    pub high_education: bool,
}

impl Default for Child {
    fn default() -> Self {
        Self {
            birth_age: 30,
            education_type: EducationType::Public,
            high_education: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyPlan {
    pub marriage_age: Option<u32>,
    pub spouse_work_type: SpouseWorkType,
    pub spouse_income: f64,
    pub children: Vec<Child>,
}

impl Default for FamilyPlan {
    fn default() -> Self {
        Self {
            marriage_age: None,
            spouse_work_type: SpouseWorkType::FullTime,
            spouse_income: 200_000.0,
            children: Vec::new(),
        }
    }
}

impl FamilyPlan {
    /// Grows or shrinks the children list. New children are appended with a
    /// birth age two years out plus their position; existing entries keep their order.
    pub fn set_children_count(&mut self, count: usize, current_age: u32) {
        while self.children.len() < count {
            let index = self.children.len() as u32;
            self.children.push(Child {
                birth_age: current_age + 2 + index,
                education_type: EducationType::Public,
                high_education: false,
            });
        }
        self.children.truncate(count);
    }

    pub fn spouse_monthly_income(&self) -> f64 {
        match self.spouse_work_type {
            SpouseWorkType::Homemaker => 0.0,
            SpouseWorkType::FullTime | SpouseWorkType::PartTime => self.spouse_income.max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifeGoal {
    pub id: String,
    pub label: Option<String>,
    pub cost: f64,
    /// Age the cost is incurred. Ignored for recurring goals.
    pub age: Option<u32>,
    /// Recurring goals charge `cost` per year until retirement.
    pub recurring: bool,
    pub early_retire_age: Option<u32>,
}

impl Default for LifeGoal {
    fn default() -> Self {
        Self {
            id: String::new(),
            label: None,
            cost: 0.0,
            age: None,
            recurring: false,
            early_retire_age: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CashflowKind {
    IncomeChange,
    ExpenseChange,
    OneTimeIncome,
    OneTimeExpense,
}

/// A free-form adjustment entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowEvent {
    #[serde(default)]
    pub id: u64,
    pub age: u32,
    pub kind: CashflowKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEvent {
    pub age: u32,
    pub name: String,
    pub principal: f64,
    pub term_years: u32,
    pub annual_rate_percent: f64,
}

impl LoanEvent {
    pub fn monthly_payment(&self) -> f64 {
        monthly_payment(self.principal, self.annual_rate_percent, self.term_years)
    }

    pub fn end_age(&self) -> u32 {
        self.age.saturating_add(self.term_years)
    }

    pub fn is_active(&self, age: u32) -> bool {
        age >= self.age && age < self.end_age()
    }
}

/// A loan picked from the configured preset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPlan {
    pub preset: String,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanSettings {
    pub mode: ProjectionMode,
    pub end_age: Option<u32>,
    /// Extra monthly cushion the required-income solve should leave over.
    pub target_monthly_surplus: f64,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Forward,
            end_age: None,
            target_monthly_surplus: 0.0,
        }
    }
}

/// Everything the engine needs, captured as one immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanInputs {
    pub basic_info: BasicInfo,
    pub family_plan: FamilyPlan,
    pub life_goals: Vec<LifeGoal>,
    pub life_events: Vec<CashflowEvent>,
    pub loans: Vec<LoanEvent>,
    pub loan_plans: Vec<LoanPlan>,
    pub settings: PlanSettings,
}

impl PlanInputs {
    /// Retirement age after early-retirement goals are taken into account.
    pub fn effective_retire_age(&self) -> u32 {
        let current_age = self.basic_info.current_age;
        let base = self.basic_info.retire_age.max(current_age.saturating_add(1));
        self.life_goals
            .iter()
            .filter_map(|g| g.early_retire_age)
            .filter(|&age| age > current_age)
            .fold(base, u32::min)
    }

    /// First age at which the person earns a full salary.
    pub fn career_start_age(&self) -> u32 {
        let info = &self.basic_info;
        match info.user_type {
            UserType::Student => info.graduation_age.max(info.current_age),
            UserType::Working => info.current_age,
        }
    }

    pub fn end_age(&self, config: &PlannerConfig) -> u32 {
        self.settings
            .end_age
            .unwrap_or(config.default_end_age)
            .min(config.max_end_age)
            .max(self.basic_info.current_age)
    }

    /// Explicit loans followed by loans resolved from presets. Unknown presets are skipped.
    pub fn resolved_loans(&self, config: &PlannerConfig) -> Vec<LoanEvent> {
        let mut loans = self.loans.clone();
        for plan in &self.loan_plans {
            match config.loan_preset(&plan.preset) {
                Some(preset) => loans.push(LoanEvent {
                    age: plan.age,
                    name: preset.name.clone(),
                    principal: preset.principal,
                    term_years: preset.term_years,
                    annual_rate_percent: preset.annual_rate_percent,
                }),
                None => log::warn!("skipping unknown loan preset '{}'", plan.preset),
            }
        }
        loans
    }

    /// Replaces non-finite numbers with their defaults.
    pub fn sanitized(&self) -> PlanInputs {
        let defaults = BasicInfo::default();
        let mut out = self.clone();
        let info = &mut out.basic_info;
        info.current_savings = finite_or(info.current_savings, defaults.current_savings);
        info.monthly_income = finite_or(info.monthly_income, defaults.monthly_income);
        info.monthly_expense = finite_or(info.monthly_expense, defaults.monthly_expense);
        info.starting_salary = finite_or(info.starting_salary, defaults.starting_salary);
        info.scholarship.debt = finite_or(info.scholarship.debt, 0.0);
        info.scholarship.annual_interest_rate = finite_or(
            info.scholarship.annual_interest_rate,
            defaults.scholarship.annual_interest_rate,
        );
        out.family_plan.spouse_income = finite_or(out.family_plan.spouse_income, 0.0);
        for goal in &mut out.life_goals {
            goal.cost = finite_or(goal.cost, 0.0);
        }
        for event in &mut out.life_events {
            event.amount = finite_or(event.amount, 0.0);
        }
        for loan in &mut out.loans {
            loan.principal = finite_or(loan.principal, 0.0);
            loan.annual_rate_percent = finite_or(loan.annual_rate_percent, 0.0);
        }
        out.settings.target_monthly_surplus = finite_or(out.settings.target_monthly_surplus, 0.0);
        out
    }

    /// Boundary validation. The engine itself never fails on these inputs.
    pub fn validate(&self, config: &PlannerConfig) -> PlanResult<()> {
        let info = &self.basic_info;
        let max_age = config.max_end_age;
        if info.retire_age <= info.current_age {
            return Err(invalid("retireAge must be > currentAge"));
        }
        if info.retire_age > max_age || info.graduation_age > max_age {
            return Err(PlanError::InvalidInput(format!(
                "retireAge and graduationAge must be <= {max_age}"
            )));
        }
        if info.current_savings < 0.0 {
            return Err(invalid("currentSavings must be >= 0"));
        }
        if info.monthly_income < 0.0 || info.monthly_expense < 0.0 {
            return Err(invalid("monthlyIncome and monthlyExpense must be >= 0"));
        }
        if info.user_type == UserType::Student && info.graduation_age < info.current_age {
            return Err(invalid("graduationAge must be >= currentAge"));
        }
        let scholarship = &info.scholarship;
        if scholarship.debt < 0.0 || scholarship.annual_interest_rate < 0.0 {
            return Err(invalid("scholarship debt and interest rate must be >= 0"));
        }
        if scholarship.debt > 0.0 && scholarship.repayment_years == 0 {
            return Err(invalid("scholarship repaymentYears must be > 0"));
        }
        if scholarship.repayment_years > config.max_loan_term_years {
            return Err(PlanError::InvalidInput(format!(
                "scholarship repaymentYears must be <= {}",
                config.max_loan_term_years
            )));
        }

        let family = &self.family_plan;
        if let Some(marriage_age) = family.marriage_age {
            if marriage_age <= info.current_age || marriage_age > max_age {
                return Err(PlanError::InvalidInput(format!(
                    "marriageAge must be > currentAge and <= {max_age}"
                )));
            }
        }
        if family.spouse_income < 0.0 {
            return Err(invalid("spouseIncome must be >= 0"));
        }
        for (index, child) in family.children.iter().enumerate() {
            if child.birth_age < info.current_age || child.birth_age > max_age {
                return Err(PlanError::InvalidInput(format!(
                    "child {} birthAge must be >= currentAge and <= {max_age}",
                    index + 1
                )));
            }
        }

        for goal in &self.life_goals {
            if goal.cost < 0.0 {
                return Err(PlanError::InvalidInput(format!(
                    "goal '{}' cost must be >= 0",
                    goal.id
                )));
            }
        }

        for loan in &self.loans {
            if loan.principal <= 0.0
                || loan.term_years == 0
                || loan.term_years > config.max_loan_term_years
                || loan.annual_rate_percent < 0.0
                || loan.age > max_age
            {
                return Err(PlanError::InvalidInput(format!(
                    "loan '{}' needs principal > 0, termYears in 1..={}, a non-negative rate and age <= {max_age}",
                    loan.name, config.max_loan_term_years
                )));
            }
        }
        for plan in &self.loan_plans {
            if plan.age > max_age {
                return Err(PlanError::InvalidInput(format!(
                    "loan plan '{}' age must be <= {max_age}",
                    plan.preset
                )));
            }
            if config.loan_preset(&plan.preset).is_none() {
                return Err(PlanError::UnknownLoanPreset {
                    preset: plan.preset.clone(),
                });
            }
        }

        if let Some(end_age) = self.settings.end_age {
            if end_age < info.current_age || end_age > max_age {
                return Err(PlanError::InvalidInput(format!(
                    "endAge must be >= currentAge and <= {max_age}"
                )));
            }
        }
        Ok(())
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn invalid(msg: &str) -> PlanError {
    PlanError::InvalidInput(msg.to_string())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExpenseCategory {
    Living,
    Scholarship,
    Education,
    Loans,
    RetirementSaving,
    Discretionary,
}

impl ExpenseCategory {
    /// Debt payments run on their own schedule and are not cut at retirement.
    pub fn is_debt_service(self) -> bool {
        matches!(self, ExpenseCategory::Loans | ExpenseCategory::Scholarship)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub living: f64,
    pub scholarship: f64,
    pub education: f64,
    pub loans: f64,
    pub retirement_saving: f64,
    pub discretionary: f64,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> f64 {
        self.living
            + self.scholarship
            + self.education
            + self.loans
            + self.retirement_saving
            + self.discretionary
    }

    pub fn get_mut(&mut self, category: ExpenseCategory) -> &mut f64 {
        match category {
            ExpenseCategory::Living => &mut self.living,
            ExpenseCategory::Scholarship => &mut self.scholarship,
            ExpenseCategory::Education => &mut self.education,
            ExpenseCategory::Loans => &mut self.loans,
            ExpenseCategory::RetirementSaving => &mut self.retirement_saving,
            ExpenseCategory::Discretionary => &mut self.discretionary,
        }
    }

    pub fn combined(&self, other: &ExpenseBreakdown) -> ExpenseBreakdown {
        ExpenseBreakdown {
            living: self.living + other.living,
            scholarship: self.scholarship + other.scholarship,
            education: self.education + other.education,
            loans: self.loans + other.loans,
            retirement_saving: self.retirement_saving + other.retirement_saving,
            discretionary: self.discretionary + other.discretionary,
        }
    }

    pub fn scaled(&self, factor: f64) -> ExpenseBreakdown {
        ExpenseBreakdown {
            living: self.living * factor,
            scholarship: self.scholarship * factor,
            education: self.education * factor,
            loans: self.loans * factor,
            retirement_saving: self.retirement_saving * factor,
            discretionary: self.discretionary * factor,
        }
    }

    /// Scales every category except debt service.
    pub fn scale_living_costs(&mut self, factor: f64) {
        self.living *= factor;
        self.education *= factor;
        self.retirement_saving *= factor;
        self.discretionary *= factor;
    }
}

/// One simulated year. Monetary rates are monthly unless named otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRecord {
    pub age: u32,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    /// Net worth at the start of this age, floored at zero for charting.
    pub cumulative_assets: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_annual_income: Option<f64>,
    pub reference_monthly_income: f64,
    pub recommended_monthly_saving: f64,
    pub expense_breakdown: ExpenseBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub mode: ProjectionMode,
    pub retire_age: u32,
    pub records: Vec<ProjectionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_loan: Option<LoanEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_required_income: Option<f64>,
    pub salary_score: super::salary::SalaryScore,
}

impl Projection {
    pub fn record_at(&self, age: u32) -> Option<&ProjectionRecord> {
        let first = self.records.first()?.age;
        self.records.get(age.checked_sub(first)? as usize)
    }
}
