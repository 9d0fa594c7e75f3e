//! Command-line surface: `project`, `validate`, `compare` and `serve`.

use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::api::run_http_server;
use crate::core::{
    Calculation, CalculatorInputs, ComparisonSelection, Language, ProductProjection, ProductType,
    RadarRow, calculate, format_validation_error, product_profile, project_products, radar_rows,
    validation_report,
};
use crate::error::{Error, ExportError};
use crate::export::{
    COMPARISON_EXPORT_NAME, PROJECTION_EXPORT_NAME, ShareContent, Table, calculator_link,
    comparison_share, comparison_table, format_currency, format_number, format_percent,
    projection_share, projection_table, shareable_link, today, write_csv, write_json,
};

const EXIT_VALIDATION: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliProductType {
    #[value(alias = "private-pension")]
    Private,
    Riester,
    Ruerup,
    Occupational,
}

impl From<CliProductType> for ProductType {
    fn from(value: CliProductType) -> Self {
        match value {
            CliProductType::Private => ProductType::Private,
            CliProductType::Riester => ProductType::Riester,
            CliProductType::Ruerup => ProductType::Ruerup,
            CliProductType::Occupational => ProductType::Occupational,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliLanguage {
    De,
    En,
}

impl From<CliLanguage> for Language {
    fn from(value: CliLanguage) -> Self {
        match value {
            CliLanguage::De => Language::De,
            CliLanguage::En => Language::En,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "rentenrechner",
    version,
    about = "German retirement savings projection and product comparison"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the inputs and print the year-by-year projection.
    Project(ProjectArgs),
    /// Only run the input checks; exits with 2 on blocking failures.
    Validate(CalculatorArgs),
    /// Compare products side by side over a common age horizon.
    Compare(CompareArgs),
    /// Run the JSON HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CalculatorArgs {
    #[arg(long, default_value_t = 35)]
    pub current_age: u32,
    #[arg(long, default_value_t = 67)]
    pub retirement_age: u32,
    #[arg(
        long,
        default_value_t = 300.0,
        allow_negative_numbers = true,
        help = "Monthly contribution in euros"
    )]
    pub monthly_contribution: f64,
    #[arg(long, default_value_t = 10000.0, allow_negative_numbers = true)]
    pub start_capital: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 6"
    )]
    pub expected_return: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        allow_negative_numbers = true,
        help = "Annual inflation in percent, used for the real-terms summary"
    )]
    pub inflation_rate: f64,
    #[arg(long, value_enum, default_value_t = CliProductType::Private)]
    pub product: CliProductType,
    #[arg(long, value_enum, default_value_t = CliLanguage::De)]
    pub language: CliLanguage,
}

impl CalculatorArgs {
    fn inputs(&self) -> CalculatorInputs {
        CalculatorInputs {
            current_age: self.current_age,
            retirement_age: self.retirement_age,
            monthly_contribution: self.monthly_contribution,
            start_capital: self.start_capital,
            expected_return: self.expected_return,
            inflation_rate: self.inflation_rate,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub calculator: CalculatorArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    #[arg(
        long,
        help = "Also write a dated export file (CSV, or JSON with --format json) here"
    )]
    pub out_dir: Option<PathBuf>,
    #[arg(long, help = "Base URL used to build a shareable calculator link")]
    pub share_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value_t = 35)]
    pub current_age: u32,
    #[arg(long, default_value_t = 67)]
    pub retirement_age: u32,
    #[arg(long, default_value_t = 10000.0)]
    pub start_capital: f64,
    #[arg(long, default_value_t = 2.0)]
    pub inflation_rate: f64,
    #[arg(
        long = "product",
        value_enum,
        help = "Product to compare; repeat up to four times (default: riester, ruerup, private)"
    )]
    pub products: Vec<CliProductType>,
    #[arg(long, value_enum, default_value_t = CliLanguage::De)]
    pub language: CliLanguage,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(long, help = "Base URL used to build a shareable comparison link")]
    pub share_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "RENTENRECHNER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "RENTENRECHNER_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonReport {
    selected: Vec<ProductType>,
    radar: Vec<RadarRow>,
    projections: Vec<ProductProjection>,
}

pub async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve(args) => {
            let addr = SocketAddr::new(args.host, args.port);
            if let Err(err) = run_http_server(addr).await {
                tracing::error!(%addr, error = %err, "server error");
                return ExitCode::from(EXIT_FAILURE);
            }
            ExitCode::SUCCESS
        }
        command => ExitCode::from(run_command(&command, &mut io::stdout().lock())),
    }
}

/// Runs one of the offline subcommands, writing its report to `out`.
/// Returns the process exit status.
pub fn run_command(command: &Command, out: &mut impl Write) -> u8 {
    let result = match command {
        Command::Project(args) => run_project(args, out),
        Command::Validate(args) => run_validate(args, out),
        Command::Compare(args) => run_compare(args, out),
        Command::Serve(_) => return EXIT_FAILURE,
    };
    result.unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to write output");
        EXIT_FAILURE
    })
}

fn run_project(args: &ProjectArgs, out: &mut impl Write) -> io::Result<u8> {
    let language: Language = args.calculator.language.into();
    let product: ProductType = args.calculator.product.into();
    let inputs = args.calculator.inputs();

    let calculation = match calculate(&inputs, product, language) {
        Ok(calculation) => calculation,
        Err(err) => return report_calculation_error(&err, out),
    };

    let table = projection_table(&calculation.points, language);
    match args.format {
        OutputFormat::Table => write_projection_report(&calculation, language, out)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&calculation).map_err(io::Error::other)?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Csv => match table.to_csv() {
            Ok(csv) => writeln!(out, "{csv}")?,
            Err(err) => report_export_failure(&err, language, out)?,
        },
    }

    let mut status = 0;
    if let Some(dir) = &args.out_dir {
        let written = match args.format {
            OutputFormat::Json => write_json(dir, PROJECTION_EXPORT_NAME, &calculation, today()),
            OutputFormat::Table | OutputFormat::Csv => {
                write_csv(dir, PROJECTION_EXPORT_NAME, &table, today())
            }
        };
        status = report_written(written, language, out)?;
    }

    if let Some(base) = &args.share_url {
        match calculator_link(base, product, &inputs) {
            Ok(link) => {
                let share = projection_share(&calculation.summary, language, &link);
                write_share(&share, out)?;
            }
            Err(err) => {
                report_export_failure(&err, language, out)?;
                status = EXIT_FAILURE;
            }
        }
    }

    Ok(status)
}

fn run_validate(args: &CalculatorArgs, out: &mut impl Write) -> io::Result<u8> {
    let language: Language = args.language.into();
    let report = validation_report(&args.inputs(), args.product.into(), language);

    if report.is_valid() {
        writeln!(out, "{}", language.pick("Eingaben gültig", "Inputs valid"))?;
        return Ok(0);
    }

    for failure in &report.failures {
        let label = failure.field.label(language);
        let line = if failure.message.starts_with(label) {
            failure.message.clone()
        } else {
            format_validation_error(label, &failure.message)
        };
        if failure.is_blocking() {
            writeln!(out, "{line}")?;
        } else {
            writeln!(out, "({}) {line}", language.pick("Hinweis", "Note"))?;
        }
    }

    Ok(if report.has_blocking() {
        EXIT_VALIDATION
    } else {
        0
    })
}

fn run_compare(args: &CompareArgs, out: &mut impl Write) -> io::Result<u8> {
    let language: Language = args.language.into();
    let requested: Vec<ProductType> = args.products.iter().map(|&p| p.into()).collect();
    let selection = ComparisonSelection::from_products(&requested);
    let selected = selection.products();

    let base = CalculatorInputs {
        current_age: args.current_age,
        retirement_age: args.retirement_age,
        start_capital: args.start_capital,
        inflation_rate: args.inflation_rate,
        ..CalculatorInputs::default()
    };
    let projections = match project_products(&base, selected, language) {
        Ok(projections) => projections,
        Err(err) => return report_calculation_error(&err, out),
    };
    let report = ComparisonReport {
        selected: selected.to_vec(),
        radar: radar_rows(selected, language),
        projections,
    };
    let table = comparison_table(&report.radar, selected, language);

    match args.format {
        OutputFormat::Table => write_comparison_report(&report, &table, language, out)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Csv => match table.to_csv() {
            Ok(csv) => writeln!(out, "{csv}")?,
            Err(err) => report_export_failure(&err, language, out)?,
        },
    }

    let mut status = 0;
    if let Some(dir) = &args.out_dir {
        let written = match args.format {
            OutputFormat::Json => write_json(dir, COMPARISON_EXPORT_NAME, &report, today()),
            OutputFormat::Table | OutputFormat::Csv => {
                write_csv(dir, COMPARISON_EXPORT_NAME, &table, today())
            }
        };
        status = report_written(written, language, out)?;
    }

    if let Some(base_url) = &args.share_url {
        let ids = selected.iter().map(|p| p.id()).collect::<Vec<_>>().join(",");
        match shareable_link(base_url, &[("products", ids)]) {
            Ok(link) => write_share(&comparison_share(selected, language, &link), out)?,
            Err(err) => {
                report_export_failure(&err, language, out)?;
                status = EXIT_FAILURE;
            }
        }
    }

    Ok(status)
}

/// Blocking validation failures print the first message and exit with 2.
fn report_calculation_error(err: &Error, out: &mut impl Write) -> io::Result<u8> {
    match err {
        Error::Validation(failures) => {
            tracing::debug!(failures = failures.len(), "inputs rejected");
            writeln!(out, "{err}")?;
            Ok(EXIT_VALIDATION)
        }
        Error::Export(_) => {
            tracing::error!(error = %err, "calculation failed");
            Ok(EXIT_FAILURE)
        }
    }
}

fn write_projection_report(
    calculation: &Calculation,
    language: Language,
    out: &mut impl Write,
) -> io::Result<()> {
    let summary = &calculation.summary;
    let profile = product_profile(calculation.product, language);
    let l = |de: &'static str, en: &'static str| language.pick(de, en);

    writeln!(out, "{}: {}", l("Produkt", "Product"), profile.name)?;
    writeln!(
        out,
        "{}: {}",
        l("Jahre bis zur Rente", "Years to retirement"),
        summary.years
    )?;
    writeln!(
        out,
        "{}: {}",
        l("Endkapital", "Final capital"),
        format_currency(summary.final_capital, language)
    )?;
    writeln!(
        out,
        "{}: {}",
        l("Einzahlungen", "Contributions"),
        format_currency(summary.total_contributions, language)
    )?;
    writeln!(
        out,
        "{}: {}",
        l("Erträge", "Returns"),
        format_currency(summary.total_returns, language)
    )?;
    if let Some(gain) = summary.gain_percent {
        writeln!(out, "{}: {}", l("Rendite", "Gain"), format_percent(gain, 1))?;
    }
    writeln!(
        out,
        "{}: {}",
        l("Monatliche Rente", "Monthly pension"),
        format_currency(summary.monthly_pension, language)
    )?;
    writeln!(
        out,
        "{}: {}",
        l("Monatliche Rente (real)", "Monthly pension (real)"),
        format_currency(summary.real_monthly_pension, language)
    )?;
    for advisory in &calculation.advisories {
        writeln!(out, "{}", advisory.message)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:>5} {:>14} {:>14} {:>14}",
        l("Jahr", "Year"),
        l("Kapital", "Capital"),
        l("Einzahlungen", "Contributions"),
        l("Erträge", "Returns")
    )?;
    for point in &calculation.points {
        writeln!(
            out,
            "{:>5} {:>14} {:>14} {:>14}",
            point.year,
            format_number(point.capital, language, 0),
            format_number(point.contributions, language, 0),
            format_number(point.returns, language, 0)
        )?;
    }
    Ok(())
}

fn write_comparison_report(
    report: &ComparisonReport,
    table: &Table,
    language: Language,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{}", table.headers.join(" | "))?;
    for row in &report.radar {
        let values: Vec<String> = row
            .values
            .iter()
            .map(|v| format_number(v.value, language, 1))
            .collect();
        writeln!(out, "{} | {}", row.label, values.join(" | "))?;
    }

    writeln!(out)?;
    for projection in &report.projections {
        writeln!(
            out,
            "{}: {} / {} → {} ({})",
            projection.name,
            format_currency(projection.monthly_contribution, language),
            format_percent(projection.expected_return, 1),
            format_currency(projection.summary.final_capital, language),
            format_currency(projection.summary.monthly_pension, language),
        )?;
    }
    Ok(())
}

fn write_share(share: &ShareContent, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", share.title)?;
    writeln!(out, "{}", share.text)?;
    writeln!(out, "{}", share.url)
}

fn report_written(
    written: Result<PathBuf, ExportError>,
    language: Language,
    out: &mut impl Write,
) -> io::Result<u8> {
    match written {
        Ok(path) => {
            print_written(&path, language, out)?;
            Ok(0)
        }
        Err(err) => {
            report_export_failure(&err, language, out)?;
            Ok(EXIT_FAILURE)
        }
    }
}

fn print_written(path: &Path, language: Language, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{}: {}",
        language.pick("Gespeichert", "Saved"),
        path.display()
    )
}

/// Export problems never abort the calculation output; they are logged and
/// reported with a generic message.
fn report_export_failure(
    err: &ExportError,
    language: Language,
    out: &mut impl Write,
) -> io::Result<()> {
    tracing::error!(error = %err, "export failed");
    writeln!(
        out,
        "{}",
        language.pick("Export fehlgeschlagen", "Export failed")
    )
}
