mod engine;
mod error;
mod solver;
mod types;
mod validate;

pub use engine::{
    allocation_return, calculate_plan, compare_target, compose_return, compound,
    corpus_for_expense, escalate_expense, project_existing, require_positive_return, run_existing,
    run_plan, run_target,
};
pub use error::CalcError;
pub use solver::{
    ContributionSolution, capacity_check, corpus_gap, periodic_future_value, solve_lump_sum,
    solve_periodic, solve_required_contribution,
};
pub use types::{
    AllocationRow, AssetAllocation, COMPARISON_BASE_AMOUNT, CalculationResult, CapacityCheck,
    ContributionMode, DEFAULT_ASSET_NAME, ExistingPortfolioForm, ExistingPortfolioInputs,
    ExistingPortfolioResult, Holding, HoldingProjection, PlanningForm, PlanningInputs, TableRow,
    TargetComparisonForm, TargetComparisonInputs, TargetComparisonResult,
};
pub use validate::{
    MAX_AGE, validate_allocation, validate_existing, validate_planning, validate_target,
};
