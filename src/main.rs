// Entry point and high-level CLI flow.
//
// - `report` loads a contract export once, builds every view and writes the
//   report files.
// - `menu` is the interactive loop: load the file, generate reports, switch
//   the display currency; unchanged files are not normalized twice.
// - `bands` writes the static price band table.
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use contract_report::bands::{all_bands, write_bands};
use contract_report::cache::{CachedTable, TableCache};
use contract_report::filter::{distinct_values, FILTERABLE};
use contract_report::loader::LoadReport;
use contract_report::output::{export_dashboard, print_dashboard};
use contract_report::util::format_int;
use contract_report::{build_dashboard, Currency, Field, FilterCriteria, ReportConfig, ReportRequest};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "contract_report", about = "Contract portfolio data quality and KPI reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every report view from a contract export.
    Report {
        /// Contract export (CSV).
        csv: PathBuf,

        /// Display currency: USD, EUR, GBP, CHF, DKK, NOK or SEK.
        #[arg(long, default_value = "USD")]
        currency: Currency,

        /// Keep only these contract types (repeatable).
        #[arg(long = "contract-type")]
        contract_types: Vec<String>,

        /// Keep only these business units (repeatable).
        #[arg(long = "business-unit")]
        business_units: Vec<String>,

        /// Keep only these clusters (repeatable).
        #[arg(long = "cluster")]
        clusters: Vec<String>,

        /// Keep only these countries (repeatable).
        #[arg(long = "country")]
        countries: Vec<String>,

        /// Keep only these statuses (repeatable).
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Columns flagged as KPI-relevant, raw key or label (repeatable).
        #[arg(long = "kpi-column")]
        kpi_columns: Vec<String>,

        /// TOML file overriding rates, active status, ranking size or KPI columns.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Anchor date for time windows (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output directory for the report files.
        #[arg(long, default_value = "report")]
        out_dir: PathBuf,

        /// Rows shown per table preview.
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Interactive menu over one contract export.
    Menu {
        /// Contract export (CSV).
        csv: PathBuf,

        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the report files.
        #[arg(long, default_value = "report")]
        out_dir: PathBuf,
    },
    /// Write the price band definition table.
    Bands {
        /// Destination CSV.
        #[arg(long, default_value = "band_definitions.csv")]
        out: PathBuf,
    },
}

fn print_load_report(rows: usize, report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} contracts loaded)",
        format_int(report.total_rows),
        format_int(rows)
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to read errors.",
            format_int(report.parse_errors)
        );
    }
    let bad_dates: usize = report.unparseable_dates.values().sum();
    if bad_dates > 0 || report.unparseable_amounts > 0 {
        println!(
            "Info: {} unreadable dates and {} unreadable amounts treated as missing.",
            format_int(bad_dates),
            format_int(report.unparseable_amounts)
        );
    }
    println!();
}

#[allow(clippy::too_many_arguments)]
fn run_report(
    csv: &Path,
    currency: Currency,
    criteria: FilterCriteria,
    kpi_columns: &[String],
    config: Option<&Path>,
    today: Option<NaiveDate>,
    out_dir: &Path,
    preview: usize,
) -> Result<()> {
    let config = ReportConfig::load(config)?;
    let mut cache = TableCache::new();
    let loaded = cache
        .load_path(csv)
        .with_context(|| format!("failed to load {}", csv.display()))?;
    print_load_report(loaded.table.len(), &loaded.report);

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let request = ReportRequest::new(currency, today)
        .with_filters(criteria)
        .with_kpi_columns(kpi_columns);

    let dash = build_dashboard(&loaded.table, &config, &request);
    print_dashboard(&dash, preview);
    export_dashboard(out_dir, &dash)?;
    println!("(Full tables exported to {})", out_dir.display());
    Ok(())
}

/// Read a single line of input after printing `prompt`.
///
/// `None` once the input is closed or unreadable.
fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu. `true` for `Y`, `false` for `N` or closed input.
fn prompt_back_to_menu<R: BufRead>(input: &mut R) -> bool {
    loop {
        let Some(answer) = read_line(input, "Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn prompt_currency<R: BufRead>(input: &mut R, current: Currency) -> Currency {
    let codes: Vec<&str> = Currency::ALL.iter().map(|c| c.code()).collect();
    let prompt = format!("Display currency [{}] ({}): ", current, codes.join("/"));
    let answer = read_line(input, &prompt).unwrap_or_default();
    if answer.is_empty() {
        return current;
    }
    match answer.parse() {
        Ok(c) => c,
        Err(e) => {
            println!("{}. Keeping {}.", e, current);
            current
        }
    }
}

fn prompt_filters<R: BufRead>(input: &mut R, loaded: &CachedTable) -> FilterCriteria {
    let mut criteria = FilterCriteria::new();
    for field in FILTERABLE {
        if !loaded.table.has_field(field) {
            continue;
        }
        let options = distinct_values(&loaded.table, field);
        if options.is_empty() {
            continue;
        }
        println!("{}: {}", field.label(), options.join(", "));
        let Some(answer) = read_line(input, "Keep (comma separated, empty for all): ") else {
            break;
        };
        let picked: Vec<String> = answer
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        criteria = criteria.accept(field, picked);
    }
    criteria
}

fn run_menu<R: BufRead>(
    input: &mut R,
    csv: &Path,
    config: Option<&Path>,
    out_dir: &Path,
) -> Result<()> {
    let config = ReportConfig::load(config)?;
    let mut cache = TableCache::new();
    let mut loaded: Option<CachedTable> = None;
    let mut currency = Currency::default();
    let mut criteria = FilterCriteria::new();

    loop {
        println!("Contract Report ({})", currency);
        println!("[1] Load the file");
        println!("[2] Generate Reports");
        println!("[3] Change Display Currency");
        println!("[4] Set Filters");
        println!("[5] Exit\n");
        let Some(choice) = read_line(input, "Enter choice: ") else {
            println!("\nExiting the program.");
            return Ok(());
        };
        match choice.as_str() {
            "1" => match cache.load_path(csv) {
                Ok(entry) => {
                    print_load_report(entry.table.len(), &entry.report);
                    loaded = Some(entry);
                }
                Err(e) => eprintln!("Failed to load file: {}\n", e),
            },
            "2" => {
                let Some(entry) = &loaded else {
                    println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
                    continue;
                };
                let request = ReportRequest::new(currency, Local::now().date_naive())
                    .with_filters(criteria.clone());
                let dash = build_dashboard(&entry.table, &config, &request);
                print_dashboard(&dash, 5);
                if let Err(e) = export_dashboard(out_dir, &dash) {
                    eprintln!("Write error: {}", e);
                }
                if !prompt_back_to_menu(input) {
                    println!("Exiting the program.");
                    return Ok(());
                }
            }
            "3" => currency = prompt_currency(input, currency),
            "4" => match &loaded {
                Some(entry) => criteria = prompt_filters(input, entry),
                None => println!("Error: No data loaded. Please load the CSV file first (option 1).\n"),
            },
            "5" => {
                println!("Exiting the program.");
                return Ok(());
            }
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            csv,
            currency,
            contract_types,
            business_units,
            clusters,
            countries,
            statuses,
            kpi_columns,
            config,
            today,
            out_dir,
            preview,
        } => {
            let criteria = FilterCriteria::new()
                .accept(Field::ContractType, contract_types)
                .accept(Field::BusinessUnit, business_units)
                .accept(Field::Region, clusters)
                .accept(Field::Country, countries)
                .accept(Field::Status, statuses);
            run_report(
                &csv,
                currency,
                criteria,
                &kpi_columns,
                config.as_deref(),
                today,
                &out_dir,
                preview,
            )
        }
        Commands::Menu {
            csv,
            config,
            out_dir,
        } => run_menu(&mut io::stdin().lock(), &csv, config.as_deref(), &out_dir),
        Commands::Bands { out } => {
            let bands = all_bands();
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            write_bands(file, &bands)?;
            println!("Wrote {} band definitions to {}", bands.len(), out.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_input_reads_as_none() {
        let mut input: &[u8] = b"";
        assert_eq!(read_line(&mut input, "> "), None);

        let mut input: &[u8] = b" 2 \n";
        assert_eq!(read_line(&mut input, "> ").as_deref(), Some("2"));
        assert_eq!(read_line(&mut input, "> "), None);
    }

    #[test]
    fn back_to_menu_stops_on_closed_input() {
        let mut input: &[u8] = b"maybe\n";
        assert!(!prompt_back_to_menu(&mut input));

        let mut input: &[u8] = b"y\n";
        assert!(prompt_back_to_menu(&mut input));
    }

    #[test]
    fn menu_exits_when_input_ends() {
        let mut input: &[u8] = b"9\n";
        let csv = Path::new("does-not-exist.csv");
        run_menu(&mut input, csv, None, Path::new("unused")).unwrap();
    }

    #[test]
    fn currency_prompt_keeps_current_on_closed_input() {
        let mut input: &[u8] = b"";
        assert_eq!(prompt_currency(&mut input, Currency::Eur), Currency::Eur);

        let mut input: &[u8] = b"sek\n";
        assert_eq!(prompt_currency(&mut input, Currency::Eur), Currency::Sek);
    }
}
