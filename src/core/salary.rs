use serde::{Deserialize, Serialize};

use super::config::{PlannerConfig, SalaryBucket};

/// Where an annual income sits against the age-matched salary distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryScore {
    /// Mean 50, spread 10, clamped to [0, 100].
    pub deviation_score: f64,
    /// Share of earners above this income, in percent, clamped to [0.1, 99.9].
    pub percentile_rank: f64,
    pub reference_average: f64,
    pub matched_age_bucket: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EducationLevel {
    HighSchool,
    University,
    Graduate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CareerTrack {
    PublicService,
    LargeCompany,
    MediumCompany,
    SmallCompany,
    Startup,
    Freelance,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NationalBracket {
    Top1,
    Top5,
    Top10,
    Top25,
    Top50,
    Bottom50,
    Bottom25,
    Bottom10,
}

/// Nearest bucket by absolute age distance. On a tie the lower key wins.
pub fn nearest_bucket(config: &PlannerConfig, age: u32) -> Option<(u32, SalaryBucket)> {
    let mut best: Option<(u32, SalaryBucket)> = None;
    for (&key, bucket) in &config.salary_by_age {
        let closer = match best {
            None => true,
            Some((best_key, _)) => key.abs_diff(age) < best_key.abs_diff(age),
        };
        if closer {
            best = Some((key, *bucket));
        }
    }
    best
}

pub fn score(config: &PlannerConfig, annual_income: f64, age: u32) -> SalaryScore {
    let Some((bucket_age, bucket)) = nearest_bucket(config, age) else {
        return SalaryScore {
            deviation_score: 50.0,
            percentile_rank: 50.0,
            reference_average: config.fallback_annual_income,
            matched_age_bucket: age,
        };
    };

    let z = if bucket.deviation > 0.0 {
        (annual_income - bucket.average) / bucket.deviation
    } else {
        0.0
    };
    let percentile_from_below = normal_cdf(z) * 100.0;

    SalaryScore {
        deviation_score: (50.0 + z * 10.0).clamp(0.0, 100.0),
        percentile_rank: (100.0 - percentile_from_below).clamp(0.1, 99.9),
        reference_average: bucket.average,
        matched_age_bucket: bucket_age,
    }
}

pub fn reference_annual_income(config: &PlannerConfig, age: u32) -> f64 {
    nearest_bucket(config, age)
        .map(|(_, bucket)| bucket.average)
        .unwrap_or(config.fallback_annual_income)
}

pub fn reference_monthly_income(config: &PlannerConfig, age: u32) -> f64 {
    reference_annual_income(config, age) / 12.0
}

/// Age-bucket average scaled by education and career multipliers.
pub fn adjusted_average(
    config: &PlannerConfig,
    age: u32,
    education: EducationLevel,
    career: CareerTrack,
) -> f64 {
    let edu = &config.education_multipliers;
    let education_multiplier = match education {
        EducationLevel::HighSchool => edu.high_school,
        EducationLevel::University => edu.university,
        EducationLevel::Graduate => edu.graduate,
    };
    let jobs = &config.career_multipliers;
    let career_multiplier = match career {
        CareerTrack::PublicService => jobs.public_service,
        CareerTrack::LargeCompany => jobs.large_company,
        CareerTrack::MediumCompany => jobs.medium_company,
        CareerTrack::SmallCompany => jobs.small_company,
        CareerTrack::Startup => jobs.startup,
        CareerTrack::Freelance => jobs.freelance,
    };
    reference_annual_income(config, age) * education_multiplier * career_multiplier
}

pub fn national_bracket(config: &PlannerConfig, annual_income: f64) -> NationalBracket {
    let p = &config.percentiles;
    if annual_income >= p.top1 {
        NationalBracket::Top1
    } else if annual_income >= p.top5 {
        NationalBracket::Top5
    } else if annual_income >= p.top10 {
        NationalBracket::Top10
    } else if annual_income >= p.top25 {
        NationalBracket::Top25
    } else if annual_income >= p.top50 {
        NationalBracket::Top50
    } else if annual_income > p.bottom25 {
        NationalBracket::Bottom50
    } else if annual_income > p.bottom10 {
        NationalBracket::Bottom25
    } else {
        NationalBracket::Bottom10
    }
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz-Stegun 7.1.26, absolute error below 1.5e-7.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}
