use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use assessment_matrix::assess::AssessmentService;
use assessment_matrix::config::AppConfig;
use assessment_matrix::error::AppError;
use assessment_matrix::permissions::User;
use assessment_matrix::report::{
    render_matrix, render_record_summary, write_matrix_csv, RecordSummaryView, ScoreCell,
};
use assessment_matrix::telemetry;
use assessment_matrix::workbook::Workbook;
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "assessment-matrix",
    about = "Lay out and score Activity x Topic assessments from a JSON workbook",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Activity x Topic category grid
    Matrix(WorkbookArgs),
    /// Print record summaries and the score matrix
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct WorkbookArgs {
    /// Path to the workbook JSON document
    workbook: PathBuf,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    source: WorkbookArgs,
    /// Also write the score matrix as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Matrix(args) => run_matrix(&config, args),
        Command::Report(args) => run_report(&config, args),
    }
}

fn run_matrix(config: &AppConfig, args: WorkbookArgs) -> Result<(), AppError> {
    let workbook = Workbook::from_path(&args.workbook, &config.assessment.score_map)?;
    let grid = workbook
        .catalog
        .category_matrix()
        .map_err(|err| AppError::Service(err.into()))?;

    print!(
        "{}",
        render_matrix(&grid, |cell| {
            cell.map(|category| category.label.clone())
                .unwrap_or_default()
        })
    );
    Ok(())
}

fn run_report(config: &AppConfig, args: ReportArgs) -> Result<(), AppError> {
    let workbook = Workbook::from_path(&args.source.workbook, &config.assessment.score_map)?;
    let service = AssessmentService::with_scoring(
        Arc::new(workbook.catalog),
        Arc::new(workbook.repository),
        Arc::new(config.assessment.permissions()),
        config.assessment.score_classes.clone(),
        config.assessment.score_map.clone(),
    );
    let user = User::staff("cli");

    println!("Assessment records");
    let categories: Vec<_> = service
        .catalog()
        .active_categories()
        .into_iter()
        .map(|category| category.id())
        .collect();
    for category in &categories {
        for record in service.records_for_category(&user, category)? {
            let view = RecordSummaryView::build(&record, service.catalog(), service.classes());
            print!("{}", render_record_summary(&view));
        }
    }

    let matrix = service.score_matrix(&user)?;
    println!("\nScore matrix");
    print!("{}", render_matrix(&matrix, describe_cell));

    if let Some(path) = args.csv {
        let file = File::create(&path)?;
        write_matrix_csv(file, &matrix, describe_cell)?;
        info!(path = %path.display(), "wrote score matrix csv");
    }
    Ok(())
}

fn describe_cell(cell: &Option<ScoreCell>) -> String {
    match cell {
        Some(cell) => format!("{:.2} {}", cell.mean, cell.label),
        None => String::new(),
    }
}
