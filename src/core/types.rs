use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Private,
    Riester,
    Ruerup,
    Occupational,
}

impl ProductType {
    pub const ALL: [ProductType; 4] = [
        ProductType::Riester,
        ProductType::Ruerup,
        ProductType::Private,
        ProductType::Occupational,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProductType::Private => "private",
            ProductType::Riester => "riester",
            ProductType::Ruerup => "ruerup",
            ProductType::Occupational => "occupational",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

impl Language {
    /// Picks the German or English variant of a fixed string.
    pub fn pick<'a>(self, de: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::De => de,
            Language::En => en,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub monthly_contribution: f64,
    pub start_capital: f64,
    pub expected_return: f64,
    pub inflation_rate: f64,
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self {
            current_age: 35,
            retirement_age: 67,
            monthly_contribution: 300.0,
            start_capital: 10_000.0,
            expected_return: 6.0,
            inflation_rate: 2.0,
        }
    }
}

impl CalculatorInputs {
    /// Years between today and retirement; zero if the ages are inverted.
    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: u32,
    pub capital: f64,
    pub contributions: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub years: u32,
    pub final_capital: f64,
    pub total_contributions: f64,
    pub total_returns: f64,
    pub monthly_pension: f64,
    pub gain_percent: Option<f64>,
    pub real_final_capital: f64,
    pub real_monthly_pension: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CurrentAge,
    RetirementAge,
    MonthlyContribution,
    StartCapital,
    ExpectedReturn,
    InflationRate,
}

impl Field {
    pub fn label(self, language: Language) -> &'static str {
        match self {
            Field::CurrentAge => language.pick("Aktuelles Alter", "Current Age"),
            Field::RetirementAge => language.pick("Renteneintrittsalter", "Retirement Age"),
            Field::MonthlyContribution => {
                language.pick("Monatlicher Beitrag", "Monthly Contribution")
            }
            Field::StartCapital => language.pick("Startkapital", "Start Capital"),
            Field::ExpectedReturn => language.pick("Erwartete Rendite", "Expected Return"),
            Field::InflationRate => language.pick("Inflationsrate", "Inflation Rate"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the calculation until corrected.
    Error,
    /// Informational; the caller decides whether it blocks.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub field: Field,
    pub severity: Severity,
    pub message: String,
}

impl ValidationFailure {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub product: ProductType,
    pub inputs: CalculatorInputs,
    pub points: Vec<ProjectionPoint>,
    pub summary: ProjectionSummary,
    pub advisories: Vec<ValidationFailure>,
}
