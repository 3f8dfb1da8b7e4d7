mod advice;
mod amortization;
mod config;
mod engine;
mod error;
mod salary;
mod schedule;
mod snapshot;
mod types;

pub use advice::{
    IdealBenchmark, IncomeTier, PlanAdvice, Recommendation, StudentEffortLevel, TimelineEntry,
    TimelineKind, advise, goal_label, ideal_benchmark, income_tier, recommendations,
    student_effort_level, timeline,
};
pub use amortization::{monthly_payment, total_repayment};
pub use config::{
    CareerMultipliers, EducationCosts, EducationMultipliers, EducationTrackCosts, LoanCategory,
    LoanPreset, PercentileBreakpoints, PlannerConfig, SalaryBucket,
};
pub use engine::project;
pub use error::{PlanError, PlanResult};
pub use salary::{
    CareerTrack, EducationLevel, NationalBracket, SalaryScore, adjusted_average,
    national_bracket, nearest_bucket, reference_annual_income, reference_monthly_income, score,
};
pub use schedule::{LifeEvent, Schedule, StageDelta};
pub use snapshot::{AgeSnapshot, Outlook, snapshot};
pub use types::{
    BasicInfo, CashflowEvent, CashflowKind, Child, EducationType, ExpenseBreakdown,
    ExpenseCategory, FamilyPlan, LifeGoal, LoanEvent, LoanPlan, PlanInputs, PlanSettings,
    Projection, ProjectionMode, ProjectionRecord, Scholarship, SpouseWorkType, UserType,
};
