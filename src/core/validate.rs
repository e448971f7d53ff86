use super::error::CalcError;
use super::types::{
    AllocationRow, AssetAllocation, DEFAULT_ASSET_NAME, ExistingPortfolioForm,
    ExistingPortfolioInputs, Holding, PlanningForm, PlanningInputs, TableRow, TargetComparisonForm,
    TargetComparisonInputs,
};

pub const MAX_AGE: u32 = 150;

pub fn validate_planning(form: &PlanningForm) -> Result<PlanningInputs, CalcError> {
    let (Some(current_age), Some(target_age)) =
        (whole_age(form.current_age), whole_age(form.target_age))
    else {
        return Err(CalcError::invalid("Enter valid ages."));
    };
    if target_age <= current_age {
        return Err(CalcError::invalid("Enter valid ages."));
    }

    let Some(monthly_expense) = positive(form.monthly_expense) else {
        return Err(CalcError::invalid("Enter valid monthly expense."));
    };

    let Some(safe_withdrawal_rate_percent) = positive(form.safe_withdrawal_rate_percent) else {
        return Err(CalcError::invalid("Enter valid SWR."));
    };

    let allocation = validate_allocation(&form.assets)?;

    let lifestyle_increase_percent = non_negative(
        form.lifestyle_increase_percent,
        "Lifestyle increase must be >= 0.",
    )?;
    let inflation_percent = non_negative(form.inflation_percent, "Inflation must be >= 0.")?;
    let existing_invested =
        non_negative(form.existing_invested, "Money already invested must be >= 0.")?;
    let max_monthly_capacity = non_negative(
        form.max_monthly_capacity,
        "Max monthly investment must be >= 0.",
    )?;

    Ok(PlanningInputs {
        current_age,
        target_age,
        monthly_expense,
        lifestyle_increase_percent,
        inflation_percent,
        safe_withdrawal_rate_percent,
        existing_invested,
        max_monthly_capacity: (max_monthly_capacity > 0.0).then_some(max_monthly_capacity),
        mode: form.mode,
        allocation,
    })
}

pub fn validate_existing(form: &ExistingPortfolioForm) -> Result<ExistingPortfolioInputs, CalcError> {
    let Some(years) = horizon(form.years) else {
        return Err(CalcError::invalid("Enter years."));
    };

    let mut holdings = Vec::with_capacity(form.holdings.len());
    for row in &form.holdings {
        let (name, amount, annual_return_percent) = read_row(row)?;
        if amount > 0.0 {
            holdings.push(Holding {
                name,
                amount,
                annual_return_percent,
            });
        }
    }

    let total: f64 = holdings.iter().map(|h| h.amount).sum();
    if total <= 0.0 {
        return Err(CalcError::invalid("Enter positive amounts."));
    }

    Ok(ExistingPortfolioInputs { years, holdings })
}

pub fn validate_target(form: &TargetComparisonForm) -> Result<TargetComparisonInputs, CalcError> {
    let Some(desired_return_percent) = positive(form.desired_return_percent) else {
        return Err(CalcError::invalid("Enter target return."));
    };
    let Some(years) = horizon(form.years) else {
        return Err(CalcError::invalid("Enter years."));
    };
    if form.assets.is_empty() {
        return Err(CalcError::invalid("Add assets."));
    }
    let allocation = validate_allocation(&form.assets).map_err(|err| match err {
        CalcError::AllocationMismatch { sum } => CalcError::InvalidInput(format!(
            "Allocation must total 100% (now {sum:.1}%)."
        )),
        other => other,
    })?;

    Ok(TargetComparisonInputs {
        desired_return_percent,
        years,
        allocation,
    })
}

pub fn validate_allocation(rows: &[TableRow]) -> Result<AssetAllocation, CalcError> {
    if rows.is_empty() {
        return Err(CalcError::invalid("Add at least one asset."));
    }

    let mut checked = Vec::with_capacity(rows.len());
    for row in rows {
        let (name, weight_percent, annual_return_percent) = read_row(row)?;
        checked.push(AllocationRow {
            name,
            weight_percent,
            annual_return_percent,
        });
    }

    let sum: f64 = checked.iter().map(|row| row.weight_percent).sum();
    if sum.round() != 100.0 {
        return Err(CalcError::AllocationMismatch { sum });
    }

    if checked
        .iter()
        .any(|row| !(0.0..=100.0).contains(&row.weight_percent))
    {
        return Err(CalcError::invalid(
            "Allocation weights must be between 0 and 100.",
        ));
    }

    Ok(AssetAllocation::from_checked_rows(checked))
}

fn read_row(row: &TableRow) -> Result<(String, f64, f64), CalcError> {
    let name = row
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ASSET_NAME)
        .to_string();
    let first = row.first.unwrap_or(0.0);
    let second = row.second.unwrap_or(0.0);
    if !first.is_finite() || !second.is_finite() {
        return Err(CalcError::InvalidInput(format!(
            "Row '{name}' must contain numbers."
        )));
    }
    Ok((name, first, second))
}

fn whole_age(value: Option<f64>) -> Option<u32> {
    let value = value?;
    if value.is_finite() && value > 0.0 && value.fract() == 0.0 && value <= MAX_AGE as f64 {
        Some(value as u32)
    } else {
        None
    }
}

fn horizon(value: Option<f64>) -> Option<f64> {
    positive(value).filter(|years| *years <= MAX_AGE as f64)
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn non_negative(value: Option<f64>, msg: &str) -> Result<f64, CalcError> {
    match value {
        None => Ok(0.0),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(_) => Err(CalcError::invalid(msg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContributionMode;

    fn default_rows() -> Vec<TableRow> {
        vec![
            TableRow::new("Equity", 60.0, 15.0),
            TableRow::new("Debt", 25.0, 7.0),
            TableRow::new("Gold", 15.0, 9.0),
        ]
    }

    fn sample_form() -> PlanningForm {
        PlanningForm {
            current_age: Some(30.0),
            target_age: Some(60.0),
            monthly_expense: Some(50_000.0),
            lifestyle_increase_percent: Some(0.0),
            inflation_percent: Some(6.0),
            safe_withdrawal_rate_percent: Some(4.0),
            existing_invested: Some(0.0),
            max_monthly_capacity: None,
            mode: ContributionMode::Periodic,
            assets: default_rows(),
        }
    }

    fn message(err: CalcError) -> String {
        err.to_string()
    }

    #[test]
    fn accepts_default_form() {
        let inputs = validate_planning(&sample_form()).expect("valid form");
        assert_eq!(inputs.years(), 30);
        assert_eq!(inputs.allocation.rows().len(), 3);
        assert_eq!(inputs.max_monthly_capacity, None);
    }

    #[test]
    fn rejects_target_age_not_after_current_age() {
        let mut form = sample_form();
        form.target_age = Some(30.0);
        assert_eq!(
            message(validate_planning(&form).expect_err("equal ages")),
            "Enter valid ages."
        );
    }

    #[test]
    fn rejects_missing_or_fractional_ages() {
        let mut form = sample_form();
        form.current_age = None;
        assert!(validate_planning(&form).is_err());

        let mut form = sample_form();
        form.current_age = Some(30.5);
        assert_eq!(
            message(validate_planning(&form).expect_err("fractional age")),
            "Enter valid ages."
        );
    }

    #[test]
    fn rejects_ages_beyond_a_human_lifetime() {
        let mut form = sample_form();
        form.current_age = Some(1.0);
        form.target_age = Some(4_000_000_000.0);
        assert_eq!(
            message(validate_planning(&form).expect_err("absurd target age")),
            "Enter valid ages."
        );

        form.target_age = Some(MAX_AGE as f64);
        assert_eq!(validate_planning(&form).expect("oldest age").years(), MAX_AGE - 1);
    }

    #[test]
    fn holding_years_are_capped() {
        let existing = ExistingPortfolioForm {
            years: Some(1e9),
            holdings: vec![TableRow::new("Equity", 1_000.0, 10.0)],
        };
        assert_eq!(
            message(validate_existing(&existing).expect_err("years")),
            "Enter years."
        );

        let target = TargetComparisonForm {
            desired_return_percent: Some(12.0),
            years: Some(151.0),
            assets: default_rows(),
        };
        assert_eq!(
            message(validate_target(&target).expect_err("years")),
            "Enter years."
        );
    }

    #[test]
    fn checks_run_in_order() {
        let mut form = sample_form();
        form.monthly_expense = Some(0.0);
        form.safe_withdrawal_rate_percent = None;
        form.assets.clear();
        assert_eq!(
            message(validate_planning(&form).expect_err("expense first")),
            "Enter valid monthly expense."
        );

        form.monthly_expense = Some(1.0);
        assert_eq!(
            message(validate_planning(&form).expect_err("swr second")),
            "Enter valid SWR."
        );

        form.safe_withdrawal_rate_percent = Some(4.0);
        assert_eq!(
            message(validate_planning(&form).expect_err("assets third")),
            "Add at least one asset."
        );
    }

    #[test]
    fn reports_allocation_sum_to_one_decimal() {
        let mut form = sample_form();
        form.assets = vec![
            TableRow::new("A", 50.0, 10.0),
            TableRow::new("B", 50.0, 10.0),
            TableRow::new("C", 5.0, 10.0),
        ];
        let err = validate_planning(&form).expect_err("sum 105");
        assert_eq!(err, CalcError::AllocationMismatch { sum: 105.0 });
        assert!(message(err).contains("105.0"));
    }

    #[test]
    fn allocation_sum_uses_nearest_integer() {
        let ok = validate_allocation(&[
            TableRow::new("A", 33.33, 10.0),
            TableRow::new("B", 33.33, 10.0),
            TableRow::new("C", 33.34, 10.0),
        ]);
        assert!(ok.is_ok());

        for total in [99.0, 101.0] {
            let rows = vec![TableRow::new("A", total, 10.0)];
            assert!(matches!(
                validate_allocation(&rows),
                Err(CalcError::AllocationMismatch { .. })
            ));
        }

        let rounds_down = [TableRow::new("A", 50.2, 10.0), TableRow::new("B", 50.2, 10.0)];
        assert!(validate_allocation(&rounds_down).is_ok());
        let rounds_up = [TableRow::new("A", 50.3, 10.0), TableRow::new("B", 50.3, 10.0)];
        assert!(validate_allocation(&rounds_up).is_err());
        assert!(validate_allocation(&[TableRow::new("A", 99.6, 10.0)]).is_ok());
    }

    #[test]
    fn missing_row_fields_fall_back_to_defaults() {
        let rows = vec![
            TableRow {
                name: None,
                first: Some(100.0),
                second: None,
            },
            TableRow {
                name: Some("  ".to_string()),
                first: None,
                second: Some(8.0),
            },
        ];
        let allocation = validate_allocation(&rows).expect("sum is 100");
        assert_eq!(allocation.names(), vec!["Asset", "Asset"]);
        assert_eq!(allocation.rows()[0].annual_return_percent, 0.0);
        assert_eq!(allocation.rows()[1].weight_percent, 0.0);
    }

    #[test]
    fn rejects_negative_weights_even_when_sum_matches() {
        let rows = vec![TableRow::new("A", 120.0, 10.0), TableRow::new("B", -20.0, 5.0)];
        assert!(matches!(
            validate_allocation(&rows),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn optional_scalars_default_to_zero_and_reject_negatives() {
        let mut form = sample_form();
        form.lifestyle_increase_percent = None;
        form.inflation_percent = None;
        form.existing_invested = None;
        form.max_monthly_capacity = Some(0.0);
        let inputs = validate_planning(&form).expect("valid form");
        assert_eq!(inputs.lifestyle_increase_percent, 0.0);
        assert_eq!(inputs.inflation_percent, 0.0);
        assert_eq!(inputs.existing_invested, 0.0);
        assert_eq!(inputs.max_monthly_capacity, None);

        form.inflation_percent = Some(-1.0);
        assert_eq!(
            message(validate_planning(&form).expect_err("negative inflation")),
            "Inflation must be >= 0."
        );
    }

    #[test]
    fn existing_portfolio_drops_non_positive_rows() {
        let form = ExistingPortfolioForm {
            years: Some(10.0),
            holdings: vec![
                TableRow::new("Equity", 400_000.0, 14.0),
                TableRow::new("Empty", 0.0, 8.0),
                TableRow::new("Debt", 300_000.0, 7.0),
            ],
        };
        let inputs = validate_existing(&form).expect("valid holdings");
        assert_eq!(inputs.holdings.len(), 2);
        assert_eq!(inputs.holdings[1].name, "Debt");
    }

    #[test]
    fn existing_portfolio_requires_years_then_amounts() {
        let form = ExistingPortfolioForm {
            years: Some(0.0),
            holdings: vec![],
        };
        assert_eq!(
            message(validate_existing(&form).expect_err("years")),
            "Enter years."
        );

        let form = ExistingPortfolioForm {
            years: Some(5.0),
            holdings: vec![TableRow::new("Cash", -10.0, 3.0)],
        };
        assert_eq!(
            message(validate_existing(&form).expect_err("amounts")),
            "Enter positive amounts."
        );
    }

    #[test]
    fn target_comparison_checks_return_years_rows_then_sum() {
        let mut form = TargetComparisonForm {
            desired_return_percent: None,
            years: None,
            assets: vec![],
        };
        assert_eq!(
            message(validate_target(&form).expect_err("return")),
            "Enter target return."
        );
        form.desired_return_percent = Some(12.0);
        assert_eq!(
            message(validate_target(&form).expect_err("years")),
            "Enter years."
        );
        form.years = Some(10.0);
        assert_eq!(
            message(validate_target(&form).expect_err("rows")),
            "Add assets."
        );
        form.assets = vec![TableRow::new("A", 90.0, 10.0)];
        assert_eq!(
            message(validate_target(&form).expect_err("sum")),
            "Allocation must total 100% (now 90.0%)."
        );
        form.assets = default_rows();
        assert!(validate_target(&form).is_ok());
    }
}
