// Entry point and interactive CLI flow.
//
// - Option [1] loads the five input tables from the data directory.
// - Option [2] runs the impact analysis and exports the report.
// - Options [3] and [4] compare preset scenarios and sweep sensitivities.
// After each analysis the user can go back to the menu or exit.
//
// Flags: --data-dir <dir> (default from config), --config <file.json>.
// Set RUST_LOG=debug for pipeline detail.
use healthcare_roi::config::{load_config, AnalysisConfig};
use healthcare_roi::loader::CsvDirectory;
use healthcare_roi::output::{self, Export};
use healthcare_roi::sweep::{
    compare_scenarios, preset_scenarios, sensitivity_grid, summarize_sensitivity,
    SensitivityRanges,
};
use healthcare_roi::util::{format_int, format_number, format_payback};
use healthcare_roi::{AnalysisResult, ImpactAnalyzer, InputTables};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Loaded tables are cached for the session so several analyses can run
// against one load.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { tables: None }));

struct AppState {
    tables: Option<InputTables>,
}

struct Session {
    config: AnalysisConfig,
    analyzer: ImpactAnalyzer,
    data_dir: PathBuf,
    results_dir: PathBuf,
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Analysis Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn loaded_tables() -> Option<InputTables> {
    let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.tables.clone()
}

fn handle_load(session: &Session) {
    let provider = CsvDirectory::new(&session.data_dir);
    match provider.load() {
        Ok((tables, report)) => {
            println!(
                "Loading input tables from {}... ({} rows kept)",
                provider.dir().display(),
                format_int(report.kept_rows())
            );
            if report.parse_errors() > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    format_int(report.parse_errors())
                );
            }
            let missing = report.missing_tables();
            if !missing.is_empty() {
                println!(
                    "Info: missing tables use fallback constants: {}",
                    missing.join(", ")
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
            state.tables = Some(tables);
        }
        Err(e) => eprintln!("Failed to load input tables: {}\n", e),
    }
}

fn require_tables() -> Option<InputTables> {
    let tables = loaded_tables();
    if tables.is_none() {
        println!("Error: No data loaded. Please load the input tables first (option 1).\n");
    }
    tables
}

fn handle_report(session: &Session, tables: &InputTables) -> AnalysisResult<()> {
    let report = session
        .analyzer
        .generate_report(tables, session.config.improvement_factors.clone())?;
    let summary = report.summary();

    println!("Impact Analysis\n");
    println!(
        "Annual savings:      {} {}",
        format_number(summary.total_annual_savings_scaled, 2),
        summary.currency_unit
    );
    println!(
        "{}-year ROI:          {}%",
        summary.horizon_years,
        format_number(summary.total_roi_percentage, 1)
    );
    println!(
        "Payback period:      {}",
        format_payback(summary.payback_period_years)
    );
    println!(
        "Net present value:   {} {}\n",
        format_number(summary.net_present_value_scaled, 2),
        summary.currency_unit
    );

    println!("Baseline vs Improved Metrics\n");
    output::preview_table_rows(&report.comparison_rows(), 5);

    let roi_rows = report.roi_rows();
    println!("Year-by-Year Projection\n");
    output::preview_table_rows(&roi_rows, roi_rows.len());

    let json_path = session.results_dir.join("impact_report.json");
    output::write_json(&json_path, &Export::now(&report))?;
    let csv_path = session.results_dir.join("roi_projection.csv");
    output::write_csv(&csv_path, &report.roi().yearly)?;
    println!(
        "(Report exported to {} and {})\n",
        json_path.display(),
        csv_path.display()
    );
    Ok(())
}

fn handle_scenarios(session: &Session, tables: &InputTables) -> AnalysisResult<()> {
    let outcomes = compare_scenarios(&session.analyzer, tables, &preset_scenarios())?;
    let rows: Vec<_> = outcomes.iter().map(|o| o.row()).collect();
    println!("Scenario Comparison\n");
    output::preview_table_rows(&rows, rows.len());

    let summaries: BTreeMap<String, _> = outcomes
        .iter()
        .map(|o| (o.scenario.key.clone(), o.summary()))
        .collect();
    let json_path = session.results_dir.join("scenario_analysis_results.json");
    output::write_json(&json_path, &Export::now(&summaries))?;
    let records: Vec<_> = outcomes.iter().map(|o| o.record()).collect();
    let csv_path = session.results_dir.join("scenario_comparison.csv");
    output::write_csv(&csv_path, &records)?;
    println!(
        "(Scenarios exported to {} and {})\n",
        json_path.display(),
        csv_path.display()
    );
    Ok(())
}

fn handle_sensitivity(session: &Session, tables: &InputTables) -> AnalysisResult<()> {
    let points = sensitivity_grid(
        &session.analyzer,
        tables,
        &session.config.improvement_factors,
        &SensitivityRanges::default(),
    )?;
    let rows: Vec<_> = points.iter().map(|p| p.row()).collect();
    println!("Sensitivity Analysis (admin efficiency × error-cost multiplier)\n");
    output::preview_table_rows(&rows, 6);

    if let Some(s) = summarize_sensitivity(&points) {
        println!(
            "Annual savings range: {} - {}",
            format_number(s.min_annual_savings_scaled, 2),
            format_number(s.max_annual_savings_scaled, 2)
        );
        println!(
            "ROI range:            {}% - {}%",
            format_number(s.min_roi_percentage, 1),
            format_number(s.max_roi_percentage, 1)
        );
        println!(
            "Payback range:        {} - {}\n",
            format_payback(s.min_payback_years),
            format_payback(s.max_payback_years)
        );
    }

    let csv_path = session.results_dir.join("sensitivity_analysis.csv");
    output::write_csv(&csv_path, &points)?;
    println!("(Full grid exported to {})\n", csv_path.display());
    Ok(())
}

fn run_action(session: &Session, action: fn(&Session, &InputTables) -> AnalysisResult<()>) {
    let Some(tables) = require_tables() else {
        return;
    };
    if let Err(e) = action(session, &tables) {
        eprintln!("Analysis failed: {}\n", e);
    }
}

fn build_session(args: &[String]) -> AnalysisResult<Session> {
    let config = load_config(arg_value(args, "--config").map(Path::new))?;
    let analyzer = ImpactAnalyzer::from_config(&config)?;
    let data_dir = arg_value(args, "--data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.output.data_dir));
    let results_dir = PathBuf::from(&config.output.results_dir);
    Ok(Session {
        config,
        analyzer,
        data_dir,
        results_dir,
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let session = match build_session(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    loop {
        println!("Select Analysis:");
        println!("[1] Load input tables");
        println!("[2] Generate impact report");
        println!("[3] Compare scenarios");
        println!("[4] Sensitivity analysis\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        let action: fn(&Session, &InputTables) -> AnalysisResult<()> = match choice.as_str() {
            "1" => {
                handle_load(&session);
                continue;
            }
            "2" => handle_report,
            "3" => handle_scenarios,
            "4" => handle_sensitivity,
            _ => {
                println!("Invalid choice. Please enter 1, 2, 3 or 4.\n");
                continue;
            }
        };
        println!();
        run_action(&session, action);
        if !prompt_back_to_menu() {
            println!("Exiting the program.");
            break;
        }
    }
}
