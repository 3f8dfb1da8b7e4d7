//! Turns the static plan into typed life events and answers which stage
//! deltas take effect at a given simulated age.
//!
//! Deltas for one age are applied in three phases: overrides that start a new
//! earning regime (graduation), additive changes to income, expense and
//! assets, and finally the retirement regime switch.

use super::config::PlannerConfig;
use super::salary::reference_monthly_income;
use super::types::{
    CashflowEvent, CashflowKind, Child, ExpenseBreakdown, ExpenseCategory, LifeGoal, LoanEvent,
    PlanInputs, UserType,
};

/// Default distance from today for a one-off goal without an age.
const DEFAULT_GOAL_OFFSET_YEARS: u32 = 5;

const ELEMENTARY_START: u32 = 6;
const MIDDLE_START: u32 = 12;
const HIGH_START: u32 = 15;
const UNIVERSITY_START: u32 = 18;
const UNIVERSITY_YEARS: u32 = 4;
const GRADUATE_SCHOOL_YEARS: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum LifeEvent {
    Graduation {
        age: u32,
        starting_salary: f64,
    },
    ScholarshipRepayment {
        start_age: u32,
        years: u32,
        monthly_payment: f64,
    },
    Marriage {
        age: u32,
        spouse_income: f64,
    },
    Childbirth {
        index: usize,
        child: Child,
    },
    Loan(LoanEvent),
    Goal {
        goal: LifeGoal,
        age: u32,
    },
    Cashflow(CashflowEvent),
    Retirement {
        age: u32,
        pension_monthly: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageDelta {
    /// Replaces the person's own monthly income.
    SetOwnIncome(f64),
    /// Adds to household income from other sources (spouse, raises, side jobs).
    OtherIncome(f64),
    Expense {
        category: ExpenseCategory,
        monthly: f64,
    },
    /// One-time change to assets; negative for a cost.
    Asset {
        category: ExpenseCategory,
        amount: f64,
    },
    Retire {
        pension_monthly: f64,
    },
}

impl StageDelta {
    fn phase(&self) -> u8 {
        match self {
            StageDelta::SetOwnIncome(_) => 0,
            StageDelta::OtherIncome(_) | StageDelta::Expense { .. } | StageDelta::Asset { .. } => 1,
            StageDelta::Retire { .. } => 2,
        }
    }
}

pub struct Schedule<'a> {
    config: &'a PlannerConfig,
    events: Vec<LifeEvent>,
    retire_age: u32,
}

impl<'a> Schedule<'a> {
    pub fn build(inputs: &PlanInputs, config: &'a PlannerConfig) -> Self {
        let info = &inputs.basic_info;
        let current_age = info.current_age;
        let retire_age = inputs.effective_retire_age();
        let mut events = Vec::new();

        if info.user_type == UserType::Student {
            events.push(LifeEvent::Graduation {
                age: info.graduation_age,
                starting_salary: info.starting_salary,
            });
        }

        let scholarship_payment = info.scholarship.monthly_payment();
        if scholarship_payment > 0.0 {
            events.push(LifeEvent::ScholarshipRepayment {
                start_age: inputs.career_start_age(),
                years: info.scholarship.repayment_years,
                monthly_payment: scholarship_payment,
            });
        }

        if let Some(age) = inputs.family_plan.marriage_age {
            events.push(LifeEvent::Marriage {
                age,
                spouse_income: inputs.family_plan.spouse_monthly_income(),
            });
        }

        for (index, child) in inputs.family_plan.children.iter().enumerate() {
            events.push(LifeEvent::Childbirth {
                index,
                child: child.clone(),
            });
        }

        for loan in inputs.resolved_loans(config) {
            events.push(LifeEvent::Loan(loan));
        }

        for goal in &inputs.life_goals {
            let age = if goal.recurring {
                current_age
            } else {
                goal.age
                    .unwrap_or(current_age.saturating_add(DEFAULT_GOAL_OFFSET_YEARS))
            };
            events.push(LifeEvent::Goal {
                goal: goal.clone(),
                age,
            });
        }

        for event in &inputs.life_events {
            events.push(LifeEvent::Cashflow(event.clone()));
        }

        events.push(LifeEvent::Retirement {
            age: retire_age,
            pension_monthly: reference_monthly_income(config, retire_age)
                * config.retirement_income_ratio,
        });

        Self {
            config,
            events,
            retire_age,
        }
    }

    pub fn events(&self) -> &[LifeEvent] {
        &self.events
    }

    pub fn retire_age(&self) -> u32 {
        self.retire_age
    }

    /// All deltas effective at `age`, ordered by phase and then by declaration order.
    pub fn deltas_at(&self, age: u32) -> Vec<StageDelta> {
        let mut deltas = Vec::new();
        for event in &self.events {
            self.event_deltas(event, age, &mut deltas);
        }
        deltas.sort_by_key(StageDelta::phase);
        deltas
    }

    /// Sum of every one-time cost between `from` and `to` inclusive, by category.
    pub fn one_off_costs(&self, from: u32, to: u32) -> ExpenseBreakdown {
        let mut totals = ExpenseBreakdown::default();
        for age in from..=to {
            for delta in self.deltas_at(age) {
                if let StageDelta::Asset { category, amount } = delta {
                    if amount < 0.0 {
                        *totals.get_mut(category) -= amount;
                    }
                }
            }
        }
        totals
    }

    fn event_deltas(&self, event: &LifeEvent, age: u32, out: &mut Vec<StageDelta>) {
        let config = self.config;
        match event {
            LifeEvent::Graduation {
                age: graduation_age,
                starting_salary,
            } => {
                if age == *graduation_age {
                    out.push(StageDelta::SetOwnIncome(*starting_salary));
                }
            }
            LifeEvent::ScholarshipRepayment {
                start_age,
                years,
                monthly_payment,
            } => {
                if age == *start_age {
                    out.push(expense(ExpenseCategory::Scholarship, *monthly_payment));
                } else if age == start_age.saturating_add(*years) {
                    out.push(expense(ExpenseCategory::Scholarship, -monthly_payment));
                }
            }
            LifeEvent::Marriage {
                age: marriage_age,
                spouse_income,
            } => {
                if age == *marriage_age {
                    if *spouse_income > 0.0 {
                        out.push(StageDelta::OtherIncome(*spouse_income));
                    }
                    out.push(expense(ExpenseCategory::Living, config.marriage_expense_delta));
                }
            }
            LifeEvent::Childbirth { child, .. } => {
                if let Some(child_age) = age.checked_sub(child.birth_age) {
                    self.education_deltas(child, child_age, out);
                }
            }
            LifeEvent::Loan(loan) => {
                let payment = loan.monthly_payment();
                if payment <= 0.0 {
                    return;
                }
                let was_active = age.checked_sub(1).is_some_and(|prev| loan.is_active(prev));
                match (was_active, loan.is_active(age)) {
                    (false, true) => out.push(expense(ExpenseCategory::Loans, payment)),
                    (true, false) => out.push(expense(ExpenseCategory::Loans, -payment)),
                    _ => {}
                }
            }
            LifeEvent::Goal {
                goal,
                age: goal_age,
            } => {
                if goal.recurring {
                    let monthly = goal.cost / 12.0;
                    if age == *goal_age && *goal_age < self.retire_age {
                        out.push(expense(ExpenseCategory::Discretionary, monthly));
                    } else if age == self.retire_age && *goal_age < self.retire_age {
                        out.push(expense(ExpenseCategory::Discretionary, -monthly));
                    }
                } else if age == *goal_age && goal.cost > 0.0 {
                    out.push(asset(ExpenseCategory::Discretionary, -goal.cost));
                }
            }
            LifeEvent::Cashflow(event) => {
                if age != event.age {
                    return;
                }
                out.push(match event.kind {
                    CashflowKind::IncomeChange => StageDelta::OtherIncome(event.amount),
                    CashflowKind::ExpenseChange => {
                        expense(ExpenseCategory::Discretionary, event.amount)
                    }
                    CashflowKind::OneTimeIncome => {
                        asset(ExpenseCategory::Discretionary, event.amount)
                    }
                    CashflowKind::OneTimeExpense => {
                        asset(ExpenseCategory::Discretionary, -event.amount)
                    }
                });
            }
            LifeEvent::Retirement {
                age: retire_age,
                pension_monthly,
            } => {
                if age == *retire_age {
                    out.push(StageDelta::Retire {
                        pension_monthly: *pension_monthly,
                    });
                }
            }
        }
    }

    fn education_deltas(&self, child: &Child, child_age: u32, out: &mut Vec<StageDelta>) {
        let config = self.config;
        let track = config.education_costs.track(child.education_type);
        let university_years = if child.high_education {
            UNIVERSITY_YEARS + GRADUATE_SCHOOL_YEARS
        } else {
            UNIVERSITY_YEARS
        };
        let independence_age = UNIVERSITY_START + university_years;

        match child_age {
            0 => {
                out.push(asset(ExpenseCategory::Education, -config.childbirth_cost));
                out.push(expense(ExpenseCategory::Education, config.infant_monthly_cost));
            }
            ELEMENTARY_START => {
                out.push(expense(ExpenseCategory::Education, track.elementary_monthly));
            }
            MIDDLE_START => out.push(expense(
                ExpenseCategory::Education,
                track.middle_monthly - track.elementary_monthly,
            )),
            HIGH_START => out.push(expense(
                ExpenseCategory::Education,
                track.high_monthly - track.middle_monthly,
            )),
            UNIVERSITY_START => {
                out.push(expense(ExpenseCategory::Education, -track.high_monthly));
            }
            _ => {}
        }

        if (UNIVERSITY_START..independence_age).contains(&child_age) {
            out.push(asset(
                ExpenseCategory::Education,
                -track.university_total / UNIVERSITY_YEARS as f64,
            ));
        }
        if child_age == independence_age {
            out.push(expense(ExpenseCategory::Education, -config.infant_monthly_cost));
        }
    }
}

fn expense(category: ExpenseCategory, monthly: f64) -> StageDelta {
    StageDelta::Expense { category, monthly }
}

fn asset(category: ExpenseCategory, amount: f64) -> StageDelta {
    StageDelta::Asset { category, amount }
}
