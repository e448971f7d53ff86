use super::error::CalcError;
use super::types::{CapacityCheck, ContributionMode};

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionSolution {
    pub corpus_gap: f64,
    pub required_contribution: f64,
    pub already_covered: bool,
}

pub fn corpus_gap(required_corpus: f64, existing_future_value: f64) -> f64 {
    (required_corpus - existing_future_value).max(0.0)
}

pub fn solve_required_contribution(
    gap: f64,
    annual_rate: f64,
    years: u32,
    mode: ContributionMode,
) -> Result<ContributionSolution, CalcError> {
    let corpus_gap = gap.max(0.0);
    if corpus_gap <= 0.0 {
        return Ok(ContributionSolution {
            corpus_gap,
            required_contribution: 0.0,
            already_covered: true,
        });
    }

    let required_contribution = match mode {
        ContributionMode::Periodic => solve_periodic(corpus_gap, annual_rate, years)?,
        ContributionMode::LumpSum => solve_lump_sum(corpus_gap, annual_rate, years as f64)?,
    };

    Ok(ContributionSolution {
        corpus_gap,
        required_contribution,
        already_covered: false,
    })
}

pub fn solve_periodic(gap: f64, annual_rate: f64, years: u32) -> Result<f64, CalcError> {
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let periods = years as f64 * MONTHS_PER_YEAR;
    let denom = (1.0 + monthly_rate).powf(periods) - 1.0;
    if !denom.is_finite() || denom <= 0.0 {
        return Err(CalcError::DegenerateAnnuity);
    }
    Ok(gap * monthly_rate / denom)
}

pub fn solve_lump_sum(gap: f64, annual_rate: f64, years: f64) -> Result<f64, CalcError> {
    let growth = (1.0 + annual_rate).powf(years);
    let lump = gap / growth;
    if !growth.is_finite() || growth <= 0.0 || (gap > 0.0 && lump <= 0.0) {
        return Err(CalcError::DegenerateAnnuity);
    }
    Ok(lump)
}

pub fn periodic_future_value(contribution: f64, monthly_rate: f64, periods: u32) -> f64 {
    if monthly_rate.abs() < 1e-12 {
        return contribution * periods as f64;
    }
    contribution * ((1.0 + monthly_rate).powf(periods as f64) - 1.0) / monthly_rate
}

pub fn capacity_check(max_monthly_capacity: f64, required_contribution: f64) -> CapacityCheck {
    let gap = max_monthly_capacity - required_contribution;
    CapacityCheck {
        max_monthly_capacity,
        gap,
        covered: gap >= 0.0,
    }
}
