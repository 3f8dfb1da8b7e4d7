/// Fixed monthly payment that fully retires `principal` over `term_years`.
///
/// A zero rate falls back to straight-line repayment. A zero term or a
/// non-positive principal pays nothing.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    if principal <= 0.0 || term_years == 0 {
        return 0.0;
    }

    let months = term_months(term_years);
    if annual_rate_percent <= 0.0 {
        return principal / months;
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    let growth = (1.0 + monthly_rate).powf(months);
    if !growth.is_finite() {
        // Interest-only in the limit of an unbounded term.
        return principal * monthly_rate;
    }
    principal * monthly_rate * growth / (growth - 1.0)
}

pub fn total_repayment(principal: f64, annual_rate_percent: f64, term_years: u32) -> f64 {
    monthly_payment(principal, annual_rate_percent, term_years) * term_months(term_years)
}

fn term_months(term_years: u32) -> f64 {
    f64::from(term_years) * 12.0
}
