use serde::{Deserialize, Serialize};

pub const COMPARISON_BASE_AMOUNT: f64 = 100_000.0;

pub const DEFAULT_ASSET_NAME: &str = "Asset";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionMode {
    #[serde(alias = "sip", alias = "monthly")]
    Periodic,
    #[serde(alias = "lumpSum", alias = "lump_sum", alias = "lump")]
    LumpSum,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub name: Option<String>,
    pub first: Option<f64>,
    pub second: Option<f64>,
}

impl TableRow {
    pub fn new(name: &str, first: f64, second: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            first: Some(first),
            second: Some(second),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRow {
    pub name: String,
    pub weight_percent: f64,
    pub annual_return_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AssetAllocation {
    rows: Vec<AllocationRow>,
}

impl AssetAllocation {
    pub(crate) fn from_checked_rows(rows: Vec<AllocationRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AllocationRow] {
        &self.rows
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.name.clone()).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|row| row.weight_percent).sum()
    }
}

#[derive(Debug, Clone)]
pub struct PlanningForm {
    pub current_age: Option<f64>,
    pub target_age: Option<f64>,
    pub monthly_expense: Option<f64>,
    pub lifestyle_increase_percent: Option<f64>,
    pub inflation_percent: Option<f64>,
    pub safe_withdrawal_rate_percent: Option<f64>,
    pub existing_invested: Option<f64>,
    pub max_monthly_capacity: Option<f64>,
    pub mode: ContributionMode,
    pub assets: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanningInputs {
    pub current_age: u32,
    pub target_age: u32,
    pub monthly_expense: f64,
    pub lifestyle_increase_percent: f64,
    pub inflation_percent: f64,
    pub safe_withdrawal_rate_percent: f64,
    pub existing_invested: f64,
    pub max_monthly_capacity: Option<f64>,
    pub mode: ContributionMode,
    pub allocation: AssetAllocation,
}

impl PlanningInputs {
    pub fn years(&self) -> u32 {
        self.target_age - self.current_age
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCheck {
    pub max_monthly_capacity: f64,
    pub gap: f64,
    pub covered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub years: u32,
    pub mode: ContributionMode,
    pub future_monthly_expense: f64,
    pub future_annual_expense: f64,
    pub required_corpus: f64,
    pub weighted_return: f64,
    pub existing_future_value: f64,
    pub corpus_gap: f64,
    pub required_contribution: f64,
    pub already_covered: bool,
    pub capacity: Option<CapacityCheck>,
}

#[derive(Debug, Clone)]
pub struct ExistingPortfolioForm {
    pub years: Option<f64>,
    pub holdings: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub name: String,
    pub amount: f64,
    pub annual_return_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExistingPortfolioInputs {
    pub years: f64,
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingProjection {
    pub name: String,
    pub amount: f64,
    pub implied_weight_percent: f64,
    pub annual_return_percent: f64,
    pub future_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingPortfolioResult {
    pub years: f64,
    pub current_total: f64,
    pub blended_return: f64,
    pub future_total: f64,
    pub holdings: Vec<HoldingProjection>,
}

#[derive(Debug, Clone)]
pub struct TargetComparisonForm {
    pub desired_return_percent: Option<f64>,
    pub years: Option<f64>,
    pub assets: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetComparisonInputs {
    pub desired_return_percent: f64,
    pub years: f64,
    pub allocation: AssetAllocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetComparisonResult {
    pub years: f64,
    pub base_amount: f64,
    pub actual_return: f64,
    pub desired_return: f64,
    pub actual_future_value: f64,
    pub desired_future_value: f64,
    pub meets_target: bool,
}
