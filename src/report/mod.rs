mod currency;

use serde::Serialize;

use crate::core::{
    COMPARISON_BASE_AMOUNT, CalculationResult, ContributionMode, ExistingPortfolioResult, MAX_AGE,
    PlanningInputs, TargetComparisonResult, compound,
};

pub use currency::{format_currency, format_rate};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleId {
    Plan,
    Existing,
    Target,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub module: ModuleId,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDisplay {
    pub corpus: String,
    pub portfolio_return: String,
    pub required_amount: String,
    pub required_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub display: PlanDisplay,
    pub allocation_chart: ChartData,
    pub growth_chart: ChartData,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingDisplay {
    pub current_total: String,
    pub blended_return: String,
    pub future_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingReport {
    pub display: ExistingDisplay,
    pub chart: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDisplay {
    pub actual_return: String,
    pub future_values: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub display: TargetDisplay,
    pub chart: ChartData,
}

pub fn plan_report(inputs: &PlanningInputs, result: &CalculationResult) -> PlanReport {
    PlanReport {
        display: plan_display(result),
        allocation_chart: allocation_chart(inputs),
        growth_chart: growth_chart(result),
        summary: plan_summary(result),
    }
}

fn plan_display(result: &CalculationResult) -> PlanDisplay {
    let required_amount = if result.already_covered {
        format_currency(0.0)
    } else {
        match result.mode {
            ContributionMode::Periodic => {
                format!("{} / month", format_currency(result.required_contribution))
            }
            ContributionMode::LumpSum => format_currency(result.required_contribution),
        }
    };
    let required_note = if result.already_covered {
        "Existing investments are enough (by assumptions).".to_string()
    } else {
        match result.mode {
            ContributionMode::Periodic => format!("SIP for {} years", result.years),
            ContributionMode::LumpSum => "Lump sum invested today".to_string(),
        }
    };

    PlanDisplay {
        corpus: format_currency(result.required_corpus),
        portfolio_return: format_rate(result.weighted_return),
        required_amount,
        required_note,
    }
}

pub fn allocation_chart(inputs: &PlanningInputs) -> ChartData {
    ChartData {
        module: ModuleId::Plan,
        kind: ChartKind::Pie,
        labels: inputs.allocation.names(),
        series: vec![Series {
            name: "Allocation".to_string(),
            values: inputs
                .allocation
                .rows()
                .iter()
                .map(|row| row.weight_percent)
                .collect(),
        }],
    }
}

pub fn growth_chart(result: &CalculationResult) -> ChartData {
    let contribution = result.required_contribution;
    let years = result.years.min(MAX_AGE);
    let points = years as usize + 1;
    let mut labels = Vec::with_capacity(points);
    let mut portfolio = Vec::with_capacity(points);
    let mut invested = Vec::with_capacity(points);

    match result.mode {
        ContributionMode::Periodic => {
            let monthly_rate = result.weighted_return / 12.0;
            let mut value = 0.0;
            let mut paid_in = 0.0;
            labels.push("0".to_string());
            portfolio.push(0.0);
            invested.push(0.0);
            for year in 1..=years {
                for _ in 0..12 {
                    value = value * (1.0 + monthly_rate) + contribution;
                    paid_in += contribution;
                }
                labels.push(year.to_string());
                portfolio.push(value.round());
                invested.push(paid_in.round());
            }
        }
        ContributionMode::LumpSum => {
            for year in 0..=years {
                labels.push(year.to_string());
                portfolio.push(compound(contribution, result.weighted_return, year as f64).round());
                invested.push(contribution.round());
            }
        }
    }

    ChartData {
        module: ModuleId::Plan,
        kind: ChartKind::Line,
        labels,
        series: vec![
            Series {
                name: "Portfolio Value".to_string(),
                values: portfolio,
            },
            Series {
                name: "Amount Invested".to_string(),
                values: invested,
            },
        ],
    }
}

pub fn plan_summary(result: &CalculationResult) -> String {
    let mut summary = format!(
        "You have {} years. Projected lifestyle ~{} / month, annual ~{}. Corpus needed ≈ {}.",
        result.years,
        format_currency(result.future_monthly_expense),
        format_currency(result.future_annual_expense),
        format_currency(result.required_corpus),
    );

    if result.already_covered {
        summary.push_str(
            " Existing investments are enough to cover this corpus by the assumptions used.",
        );
        return summary;
    }

    let required = format_currency(result.required_contribution);
    match result.mode {
        ContributionMode::Periodic => {
            summary.push_str(&format!(" You need ~{required}/month as SIP."));
        }
        ContributionMode::LumpSum => {
            summary.push_str(&format!(" You need a lump-sum of {required} today."));
        }
    }

    if let Some(check) = result.capacity {
        let capacity = format_currency(check.max_monthly_capacity);
        if check.covered {
            summary.push_str(&format!(
                " Your stated capacity {capacity}/month covers the requirement."
            ));
        } else {
            summary.push_str(&format!(
                " Your capacity {capacity}/month is below required SIP. Consider changing goal or increase risk."
            ));
        }
    }

    summary
}

pub fn existing_report(result: &ExistingPortfolioResult) -> ExistingReport {
    ExistingReport {
        display: ExistingDisplay {
            current_total: format_currency(result.current_total),
            blended_return: format_rate(result.blended_return),
            future_total: format_currency(result.future_total),
        },
        chart: ChartData {
            module: ModuleId::Existing,
            kind: ChartKind::Bar,
            labels: result.holdings.iter().map(|h| h.name.clone()).collect(),
            series: vec![
                Series {
                    name: "Today".to_string(),
                    values: result.holdings.iter().map(|h| h.amount).collect(),
                },
                Series {
                    name: "Future".to_string(),
                    values: result.holdings.iter().map(|h| h.future_value).collect(),
                },
            ],
        },
    }
}

pub fn target_report(result: &TargetComparisonResult) -> TargetReport {
    TargetReport {
        display: TargetDisplay {
            actual_return: format_rate(result.actual_return),
            future_values: format!(
                "{} (actual) vs {} (target)",
                format_currency(result.actual_future_value),
                format_currency(result.desired_future_value),
            ),
        },
        chart: ChartData {
            module: ModuleId::Target,
            kind: ChartKind::Bar,
            labels: vec!["Actual".to_string(), "Target".to_string()],
            series: vec![Series {
                name: format_currency(COMPARISON_BASE_AMOUNT),
                values: vec![result.actual_future_value, result.desired_future_value],
            }],
        },
    }
}
