//! Export and sharing helpers: tabular CSV/JSON output, dated filenames,
//! share text and links, and locale-aware number formatting.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use url::Url;

use crate::core::{
    CalculatorInputs, Language, ProductType, ProjectionPoint, ProjectionSummary, RadarRow,
    product_profile,
};
use crate::error::ExportError;

pub const PROJECTION_EXPORT_NAME: &str = "rentenrechner-ergebnisse";
pub const COMPARISON_EXPORT_NAME: &str = "produktvergleich-daten";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn to_csv_field(&self) -> String {
        match self {
            Cell::Number(value) => value.to_string(),
            Cell::Text(text) if text.contains(',') || text.contains('"') => {
                format!("\"{}\"", text.replace('"', "\"\""))
            }
            Cell::Text(text) => text.clone(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row followed by one line per row, joined with `\n`. Text cells
    /// containing a comma or quote are quoted with doubled inner quotes.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::NoData);
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.headers.join(","));
        for row in &self.rows {
            let fields: Vec<String> = (0..self.headers.len())
                .map(|i| row.get(i).map(Cell::to_csv_field).unwrap_or_default())
                .collect();
            lines.push(fields.join(","));
        }
        Ok(lines.join("\n"))
    }
}

pub fn projection_table(points: &[ProjectionPoint], language: Language) -> Table {
    Table {
        headers: vec![
            language.pick("Jahr", "Year").to_string(),
            language.pick("Kapital", "Capital").to_string(),
            language.pick("Einzahlungen", "Contributions").to_string(),
            language.pick("Erträge", "Returns").to_string(),
        ],
        rows: points
            .iter()
            .map(|p| {
                vec![
                    Cell::Number(f64::from(p.year)),
                    Cell::Number(p.capital),
                    Cell::Number(p.contributions),
                    Cell::Number(p.returns),
                ]
            })
            .collect(),
    }
}

pub fn comparison_table(
    rows: &[RadarRow],
    selection: &[ProductType],
    language: Language,
) -> Table {
    let mut headers = vec![language.pick("Kriterium", "Criterion").to_string()];
    headers.extend(
        selection
            .iter()
            .map(|&product| product_profile(product, language).name.to_string()),
    );

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = vec![Cell::from(row.label)];
            cells.extend(selection.iter().map(|product| {
                let value = row
                    .values
                    .iter()
                    .find(|v| v.product == *product)
                    .map_or(0.0, |v| v.value);
                Cell::Number(value)
            }));
            cells
        })
        .collect();

    Table { headers, rows }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// `{base}-{YYYY-MM-DD}.{ext}`
pub fn dated_filename(base: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{base}-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Today's UTC date, used to stamp export filenames.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn write_csv(
    dir: &Path,
    base: &str,
    table: &Table,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let content = table.to_csv()?;
    write_file(dir, &dated_filename(base, ExportFormat::Csv, date), &content)
}

pub fn write_json<T: Serialize>(
    dir: &Path,
    base: &str,
    value: &T,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let content = serde_json::to_string_pretty(value)?;
    write_file(dir, &dated_filename(base, ExportFormat::Json, date), &content)
}

fn write_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(filename);
    fs::write(&path, content).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareContent {
    pub title: String,
    pub text: String,
    pub url: String,
}

pub fn projection_share(
    summary: &ProjectionSummary,
    language: Language,
    url: &str,
) -> ShareContent {
    let pension = format_number(summary.monthly_pension, language, 0);
    let capital = format_number(summary.final_capital, language, 0);
    let text = match language {
        Language::De => {
            format!("Meine prognostizierte Rente: €{pension}/Monat bei €{capital} Endkapital")
        }
        Language::En => {
            format!("My projected pension: €{pension}/month with €{capital} final capital")
        }
    };
    ShareContent {
        title: language
            .pick("Meine Rentenprognose", "My Pension Projection")
            .to_string(),
        text,
        url: url.to_string(),
    }
}

pub fn comparison_share(selection: &[ProductType], language: Language, url: &str) -> ShareContent {
    let names = selection
        .iter()
        .map(|&product| product_profile(product, language).name)
        .collect::<Vec<_>>()
        .join(", ");
    let text = match language {
        Language::De => format!("Mein Altersvorsorge-Vergleich: {names}"),
        Language::En => format!("My pension product comparison: {names}"),
    };
    ShareContent {
        title: language
            .pick("Produktvergleich", "Product Comparison")
            .to_string(),
        text,
        url: url.to_string(),
    }
}

/// Appends `params` to `base_url` as an URL-encoded query string.
pub fn shareable_link<K, V>(base_url: &str, params: &[(K, V)]) -> Result<String, ExportError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = Url::parse(base_url).map_err(|source| ExportError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key.as_ref(), value.as_ref());
        }
    }
    Ok(url.into())
}

/// Link that reopens the calculator with the given product and inputs.
pub fn calculator_link(
    base_url: &str,
    product: ProductType,
    inputs: &CalculatorInputs,
) -> Result<String, ExportError> {
    let params = [
        ("product", product.id().to_string()),
        ("currentAge", inputs.current_age.to_string()),
        ("retirementAge", inputs.retirement_age.to_string()),
        ("monthlyContribution", inputs.monthly_contribution.to_string()),
        ("startCapital", inputs.start_capital.to_string()),
        ("expectedReturn", inputs.expected_return.to_string()),
        ("inflationRate", inputs.inflation_rate.to_string()),
    ];
    shareable_link(base_url, &params)
}

/// Formats with thousands grouping: `1.234,5` in German, `1,234.5` in English.
pub fn format_number(value: f64, language: Language, decimals: usize) -> String {
    let (group_sep, decimal_sep) = match language {
        Language::De => ('.', ','),
        Language::En => (',', '.'),
    };

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(digit);
    }

    let is_zero = formatted.bytes().all(|b| b == b'0' || b == b'.');
    let mut out = String::new();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(decimal_sep);
        out.push_str(frac);
    }
    out
}

/// Whole-euro amount: `1.234 €` in German, `€1,234` in English.
pub fn format_currency(value: f64, language: Language) -> String {
    let number = format_number(value, language, 0);
    match language {
        Language::De => format!("{number}\u{a0}€"),
        Language::En => match number.strip_prefix('-') {
            Some(abs) => format!("-€{abs}"),
            None => format!("€{number}"),
        },
    }
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CalculatorInputs, project, radar_rows, summarize};

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
    }

    #[test]
    fn projection_csv_has_localized_header_and_integer_cells() {
        let inputs = CalculatorInputs {
            current_age: 60,
            retirement_age: 61,
            expected_return: 0.0,
            ..CalculatorInputs::default()
        };
        let table = projection_table(&project(&inputs), Language::De);
        let csv = table.to_csv().expect("non-empty");

        assert_eq!(
            csv,
            "Jahr,Kapital,Einzahlungen,Erträge\n60,13600,10000,3600\n61,17200,13600,3600"
        );
    }

    #[test]
    fn csv_quotes_text_with_commas_and_quotes() {
        let table = Table {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![Cell::from("x, y"), Cell::from("say \"hi\"")]],
        };
        assert_eq!(table.to_csv().expect("csv"), "a,b\n\"x, y\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn empty_table_is_rejected() {
        let table = projection_table(&[], Language::En);
        assert!(matches!(table.to_csv(), Err(ExportError::NoData)));
    }

    #[test]
    fn comparison_table_lists_products_as_columns() {
        let selection = [ProductType::Riester, ProductType::Private];
        let rows = radar_rows(&selection, Language::En);
        let csv = comparison_table(&rows, &selection, Language::En)
            .to_csv()
            .expect("csv");

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Criterion,Riester Pension,Private Pension"));
        assert_eq!(lines.next(), Some("Expected Return,4.5,7.5"));
        assert_eq!(csv.lines().last(), Some("Costs,4,5"));
    }

    #[test]
    fn dated_filename_uses_iso_date() {
        assert_eq!(
            dated_filename(PROJECTION_EXPORT_NAME, ExportFormat::Csv, sample_date()),
            "rentenrechner-ergebnisse-2024-03-09.csv"
        );
        assert_eq!(
            dated_filename("data", ExportFormat::Json, sample_date()),
            "data-2024-03-09.json"
        );
    }

    #[test]
    fn write_csv_and_json_create_dated_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = CalculatorInputs::default();
        let points = project(&inputs);

        let csv_path = write_csv(
            dir.path(),
            PROJECTION_EXPORT_NAME,
            &projection_table(&points, Language::En),
            sample_date(),
        )
        .expect("csv written");
        let csv = fs::read_to_string(&csv_path).expect("read csv");
        assert!(csv.starts_with("Year,Capital,Contributions,Returns\n35,14200,10000,4200"));

        let json_path =
            write_json(dir.path(), "projection", &points, sample_date()).expect("json written");
        let json = fs::read_to_string(&json_path).expect("read json");
        assert!(json.starts_with("[\n  {\n    \"year\": 35,"));
    }

    #[test]
    fn write_into_missing_directory_is_an_operation_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let table = projection_table(&project(&CalculatorInputs::default()), Language::De);

        let err = write_csv(&missing, "x", &table, sample_date()).expect_err("must fail");
        assert!(matches!(err, ExportError::Write { .. }));
    }

    #[test]
    fn projection_share_text_uses_locale_grouping() {
        let inputs = CalculatorInputs::default();
        let summary = summarize(&inputs, &project(&inputs));
        let mut fixed = summary;
        fixed.monthly_pension = 1_234.0;
        fixed.final_capital = 370_020.0;

        let de = projection_share(&fixed, Language::De, "https://example.de/rechner");
        assert_eq!(de.title, "Meine Rentenprognose");
        assert_eq!(
            de.text,
            "Meine prognostizierte Rente: €1.234/Monat bei €370.020 Endkapital"
        );

        let en = projection_share(&fixed, Language::En, "https://example.de/rechner");
        assert_eq!(
            en.text,
            "My projected pension: €1,234/month with €370,020 final capital"
        );
    }

    #[test]
    fn comparison_share_lists_product_names() {
        let share = comparison_share(
            &[ProductType::Riester, ProductType::Ruerup],
            Language::De,
            "https://example.de/vergleich",
        );
        assert_eq!(share.title, "Produktvergleich");
        assert_eq!(
            share.text,
            "Mein Altersvorsorge-Vergleich: Riester-Rente, Rürup-Rente"
        );
    }

    #[test]
    fn shareable_link_encodes_params() {
        let link = shareable_link(
            "https://example.de/rechner",
            &[("product", "riester"), ("note", "a b&c")],
        )
        .expect("valid url");
        assert_eq!(
            link,
            "https://example.de/rechner?product=riester&note=a+b%26c"
        );

        let bare: &[(&str, &str)] = &[];
        assert_eq!(
            shareable_link("https://example.de/rechner", bare).expect("valid url"),
            "https://example.de/rechner"
        );
    }

    #[test]
    fn shareable_link_rejects_relative_base() {
        let err = shareable_link("not a url", &[("a", "b")]).expect_err("must fail");
        assert!(matches!(err, ExportError::InvalidUrl { .. }));
    }

    #[test]
    fn calculator_link_carries_product_and_inputs() {
        let link = calculator_link(
            "https://example.de/rechner",
            ProductType::Ruerup,
            &CalculatorInputs::default(),
        )
        .expect("valid url");
        assert!(link.starts_with("https://example.de/rechner?product=ruerup&currentAge=35"));
        assert!(link.ends_with("&expectedReturn=6&inflationRate=2"));
    }

    #[test]
    fn number_formatting_matches_locales() {
        assert_eq!(format_number(1_234_567.891, Language::De, 2), "1.234.567,89");
        assert_eq!(format_number(1_234_567.891, Language::En, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, Language::De, 0), "999");
        assert_eq!(format_number(-1_000.0, Language::En, 0), "-1,000");
        assert_eq!(format_number(-0.2, Language::En, 0), "0");
    }

    #[test]
    fn currency_and_percent_formatting() {
        assert_eq!(format_currency(1_234.4, Language::De), "1.234\u{a0}€");
        assert_eq!(format_currency(1_234.4, Language::En), "€1,234");
        assert_eq!(format_currency(-50.0, Language::En), "-€50");
        assert_eq!(format_percent(12.345, 1), "12.3%");
        assert_eq!(format_percent(7.0, 0), "7%");
    }
}
