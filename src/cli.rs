use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::api::{default_allocation_rows, default_holding_rows, run_http_server};
use crate::config::AppConfig;
use crate::core::{
    CalcError, ContributionMode, ExistingPortfolioForm, PlanningForm, TableRow,
    TargetComparisonForm, calculate_plan, compare_target, project_existing, validate_existing,
    validate_planning, validate_target,
};
use crate::report::{
    ExistingReport, PlanReport, TargetReport, existing_report, format_currency, format_rate,
    plan_report, target_report,
};
use crate::rewrite::{RequestTracker, RewriteClient, RewriteError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Calc(#[from] CalcError),
    #[error("could not encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct Output<R, P> {
    result: R,
    report: P,
}

#[derive(Parser, Debug)]
#[command(
    name = "goalplan",
    about = "Goal-based investment planner: required SIP or lump sum, portfolio projection, target check"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Serve the JSON API")]
    Serve {
        #[arg(long, help = "Overrides GOALPLAN_PORT")]
        port: Option<u16>,
    },
    #[command(about = "Size the corpus for a retirement goal and solve the contribution")]
    Plan(PlanArgs),
    #[command(about = "Project holdings you already own")]
    Existing(ExistingArgs),
    #[command(about = "Compare the allocation's return with a desired return")]
    Target(TargetArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliContributionMode {
    Sip,
    LumpSum,
}

impl From<CliContributionMode> for ContributionMode {
    fn from(value: CliContributionMode) -> Self {
        match value {
            CliContributionMode::Sip => ContributionMode::Periodic,
            CliContributionMode::LumpSum => ContributionMode::LumpSum,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long, default_value_t = 30.0)]
    current_age: f64,
    #[arg(long, default_value_t = 60.0)]
    target_age: f64,
    #[arg(long, help = "Monthly expense in today's money")]
    monthly_expense: Option<f64>,
    #[arg(long, default_value_t = 0.0, help = "Lifestyle increase in percent")]
    lifestyle_increase: f64,
    #[arg(long, default_value_t = 6.0, help = "Annual inflation in percent")]
    inflation: f64,
    #[arg(long, default_value_t = 4.0, help = "Safe withdrawal rate in percent")]
    swr: f64,
    #[arg(long, default_value_t = 0.0, help = "Money already invested")]
    invested: f64,
    #[arg(long, help = "Largest monthly amount you can invest")]
    max_monthly: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliContributionMode::Sip)]
    mode: CliContributionMode,
    #[arg(
        long = "asset",
        value_parser = parse_row,
        help = "NAME:WEIGHT%:RETURN%, repeatable; defaults to Equity 60/15, Debt 25/7, Gold 15/9"
    )]
    assets: Vec<TableRow>,
    #[arg(long, help = "Print the result as JSON")]
    json: bool,
    #[arg(long, help = "Send the summary to the rewrite service")]
    rewrite: bool,
}

#[derive(Args, Debug)]
pub struct ExistingArgs {
    #[arg(long, default_value_t = 10.0)]
    years: f64,
    #[arg(
        long = "holding",
        value_parser = parse_row,
        help = "NAME:AMOUNT:RETURN%, repeatable"
    )]
    holdings: Vec<TableRow>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    #[arg(long, default_value_t = 12.0, help = "Desired annual return in percent")]
    desired_return: f64,
    #[arg(long, default_value_t = 10.0)]
    years: f64,
    #[arg(long = "asset", value_parser = parse_row, help = "NAME:WEIGHT%:RETURN%, repeatable")]
    assets: Vec<TableRow>,
    #[arg(long)]
    json: bool,
}

pub async fn run(cli: Cli, mut config: AppConfig) -> Result<(), CliError> {
    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            run_http_server(config).await?;
        }
        Command::Plan(args) => {
            let rewrite = args.rewrite;
            let (text, summary) = plan_output(args)?;
            println!("{text}");
            if rewrite {
                let client = RewriteClient::new(config.rewrite);
                let tracker = RequestTracker::new();
                println!("\n{}", rewrite_summary(&tracker, &client, &summary).await);
            }
        }
        Command::Existing(args) => println!("{}", existing_output(args)?),
        Command::Target(args) => println!("{}", target_output(args)?),
    }
    Ok(())
}

fn parse_row(raw: &str) -> Result<TableRow, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(second), Some(first), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected NAME:NUMBER:NUMBER, got '{raw}'"));
    };
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number"))
    };
    Ok(TableRow {
        name: Some(name.trim().to_string()),
        first: Some(number(first)?),
        second: Some(number(second)?),
    })
}

fn rows_or(rows: Vec<TableRow>, default: fn() -> Vec<TableRow>) -> Vec<TableRow> {
    if rows.is_empty() { default() } else { rows }
}

fn plan_output(args: PlanArgs) -> Result<(String, String), CliError> {
    let form = PlanningForm {
        current_age: Some(args.current_age),
        target_age: Some(args.target_age),
        monthly_expense: args.monthly_expense,
        lifestyle_increase_percent: Some(args.lifestyle_increase),
        inflation_percent: Some(args.inflation),
        safe_withdrawal_rate_percent: Some(args.swr),
        existing_invested: Some(args.invested),
        max_monthly_capacity: args.max_monthly,
        mode: args.mode.into(),
        assets: rows_or(args.assets, default_allocation_rows),
    };
    let inputs = validate_planning(&form)?;
    let result = calculate_plan(&inputs)?;
    let report = plan_report(&inputs, &result);
    info!(years = result.years, mode = ?result.mode, "plan calculated");

    let summary = report.summary.clone();
    let text = if args.json {
        serde_json::to_string_pretty(&Output { result, report })?
    } else {
        render_plan(&report)
    };
    Ok((text, summary))
}

fn existing_output(args: ExistingArgs) -> Result<String, CliError> {
    let form = ExistingPortfolioForm {
        years: Some(args.years),
        holdings: rows_or(args.holdings, default_holding_rows),
    };
    let result = project_existing(&validate_existing(&form)?);
    let report = existing_report(&result);
    if args.json {
        return Ok(serde_json::to_string_pretty(&Output { result, report })?);
    }

    let mut out = render_existing(&report);
    for holding in &result.holdings {
        out.push_str(&format!(
            "\n  {:<10} {} -> {} ({:.1}% of today, {})",
            holding.name,
            format_currency(holding.amount),
            format_currency(holding.future_value),
            holding.implied_weight_percent,
            format_rate(holding.annual_return_percent / 100.0),
        ));
    }
    Ok(out)
}

fn target_output(args: TargetArgs) -> Result<String, CliError> {
    let form = TargetComparisonForm {
        desired_return_percent: Some(args.desired_return),
        years: Some(args.years),
        assets: rows_or(args.assets, default_allocation_rows),
    };
    let result = compare_target(&validate_target(&form)?);
    let report = target_report(&result);
    if args.json {
        return Ok(serde_json::to_string_pretty(&Output { result, report })?);
    }

    let verdict = if result.meets_target {
        "Allocation meets the target."
    } else {
        "Allocation falls short of the target."
    };
    Ok(format!("{}\n{verdict}", render_target(&report)))
}

fn render_plan(report: &PlanReport) -> String {
    let display = &report.display;
    format!(
        "Corpus needed:     {}\nPortfolio return:  {}\nRequired:          {} ({})\n\n{}",
        display.corpus,
        display.portfolio_return,
        display.required_amount,
        display.required_note,
        report.summary,
    )
}

fn render_existing(report: &ExistingReport) -> String {
    let display = &report.display;
    format!(
        "Current total:     {}\nBlended return:    {}\nFuture total:      {}",
        display.current_total, display.blended_return, display.future_total,
    )
}

fn render_target(report: &TargetReport) -> String {
    format!(
        "Actual return:     {}\nFuture values:     {}",
        report.display.actual_return, report.display.future_values,
    )
}

async fn rewrite_summary(
    tracker: &RequestTracker,
    client: &RewriteClient,
    summary: &str,
) -> String {
    match tracker.submit(client, summary).await {
        Ok(text) => format!("{}\n{text}", tracker.state().status_text()),
        Err(RewriteError::MissingPrompt) => "No summary to send.".to_string(),
        Err(err @ RewriteError::Busy) => format!("AI error: {err}"),
        Err(_) => tracker.state().status_text(),
    }
}
