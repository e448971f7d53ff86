use super::error::CalcError;
use super::solver::{capacity_check, corpus_gap, solve_required_contribution};
use super::types::{
    AssetAllocation, COMPARISON_BASE_AMOUNT, CalculationResult, ContributionMode,
    ExistingPortfolioForm, ExistingPortfolioInputs, ExistingPortfolioResult, HoldingProjection,
    PlanningForm, PlanningInputs, TargetComparisonForm, TargetComparisonInputs,
    TargetComparisonResult,
};
use super::validate::{validate_existing, validate_planning, validate_target};

const MONTHS_PER_YEAR: f64 = 12.0;

// Largest amount an f64 still holds to the rupee.
const MAX_AMOUNT: f64 = 9_007_199_254_740_992.0;

pub fn compose_return<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    pairs
        .into_iter()
        .map(|(weight_percent, return_percent)| (weight_percent / 100.0) * (return_percent / 100.0))
        .sum()
}

pub fn allocation_return(allocation: &AssetAllocation) -> f64 {
    compose_return(
        allocation
            .rows()
            .iter()
            .map(|row| (row.weight_percent, row.annual_return_percent)),
    )
}

pub fn require_positive_return(rate: f64) -> Result<f64, CalcError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(CalcError::NonPositiveReturn)
    }
}

pub fn compound(present: f64, rate: f64, years: f64) -> f64 {
    present * (1.0 + rate).powf(years)
}

// The lifestyle step applies once; inflation compounds yearly.
pub fn escalate_expense(
    monthly_expense: f64,
    lifestyle_increase_percent: f64,
    inflation_percent: f64,
    years: u32,
) -> f64 {
    monthly_expense
        * (1.0 + lifestyle_increase_percent / 100.0)
        * (1.0 + inflation_percent / 100.0).powf(years as f64)
}

pub fn corpus_for_expense(annual_expense: f64, safe_withdrawal_rate_percent: f64) -> f64 {
    annual_expense / (safe_withdrawal_rate_percent / 100.0)
}

pub fn run_plan(form: &PlanningForm) -> Result<CalculationResult, CalcError> {
    let inputs = validate_planning(form)?;
    calculate_plan(&inputs)
}

pub fn calculate_plan(inputs: &PlanningInputs) -> Result<CalculationResult, CalcError> {
    let years = inputs.years();
    let weighted_return = require_positive_return(allocation_return(&inputs.allocation))?;

    let future_monthly_expense = bounded(escalate_expense(
        inputs.monthly_expense,
        inputs.lifestyle_increase_percent,
        inputs.inflation_percent,
        years,
    ))?;
    let future_annual_expense = bounded(future_monthly_expense * MONTHS_PER_YEAR)?;
    let required_corpus = bounded(corpus_for_expense(
        future_annual_expense,
        inputs.safe_withdrawal_rate_percent,
    ))?;

    let existing_future_value = if inputs.existing_invested > 0.0 {
        bounded(compound(inputs.existing_invested, weighted_return, years as f64))?
    } else {
        0.0
    };

    let solution = solve_required_contribution(
        corpus_gap(required_corpus, existing_future_value),
        weighted_return,
        years,
        inputs.mode,
    )?;
    bounded(solution.required_contribution)?;

    let capacity = match (inputs.mode, inputs.max_monthly_capacity) {
        (ContributionMode::Periodic, Some(max)) if !solution.already_covered => {
            Some(capacity_check(max, solution.required_contribution))
        }
        _ => None,
    };

    Ok(CalculationResult {
        years,
        mode: inputs.mode,
        future_monthly_expense,
        future_annual_expense,
        required_corpus,
        weighted_return,
        existing_future_value,
        corpus_gap: solution.corpus_gap,
        required_contribution: solution.required_contribution,
        already_covered: solution.already_covered,
        capacity,
    })
}

fn bounded(amount: f64) -> Result<f64, CalcError> {
    if amount.is_finite() && amount.abs() <= MAX_AMOUNT {
        Ok(amount)
    } else {
        Err(CalcError::invalid("Inputs give amounts too large to calculate."))
    }
}

pub fn run_existing(form: &ExistingPortfolioForm) -> Result<ExistingPortfolioResult, CalcError> {
    let inputs = validate_existing(form)?;
    Ok(project_existing(&inputs))
}

pub fn project_existing(inputs: &ExistingPortfolioInputs) -> ExistingPortfolioResult {
    let current_total: f64 = inputs.holdings.iter().map(|h| h.amount).sum();

    let holdings: Vec<HoldingProjection> = inputs
        .holdings
        .iter()
        .map(|h| HoldingProjection {
            name: h.name.clone(),
            amount: h.amount,
            implied_weight_percent: h.amount / current_total * 100.0,
            annual_return_percent: h.annual_return_percent,
            future_value: compound(h.amount, h.annual_return_percent / 100.0, inputs.years),
        })
        .collect();

    let blended_return = compose_return(
        holdings
            .iter()
            .map(|h| (h.implied_weight_percent, h.annual_return_percent)),
    );
    let future_total = holdings.iter().map(|h| h.future_value).sum();

    ExistingPortfolioResult {
        years: inputs.years,
        current_total,
        blended_return,
        future_total,
        holdings,
    }
}

pub fn run_target(form: &TargetComparisonForm) -> Result<TargetComparisonResult, CalcError> {
    let inputs = validate_target(form)?;
    Ok(compare_target(&inputs))
}

pub fn compare_target(inputs: &TargetComparisonInputs) -> TargetComparisonResult {
    let actual_return = allocation_return(&inputs.allocation);
    let desired_return = inputs.desired_return_percent / 100.0;
    let actual_future_value = compound(COMPARISON_BASE_AMOUNT, actual_return, inputs.years);
    let desired_future_value = compound(COMPARISON_BASE_AMOUNT, desired_return, inputs.years);

    TargetComparisonResult {
        years: inputs.years,
        base_amount: COMPARISON_BASE_AMOUNT,
        actual_return,
        desired_return,
        actual_future_value,
        desired_future_value,
        meets_target: actual_future_value >= desired_future_value,
    }
}
