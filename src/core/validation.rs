use super::limits::GERMAN_PENSION_LIMITS;
use super::types::{CalculatorInputs, Field, Language, ProductType, Severity, ValidationFailure};

/// Inclusive bounds for a numeric field.
#[derive(Debug, Clone, Copy)]
pub struct NumberRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRule {
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Failures collected by [`validate_calculator_inputs`], in check order.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has_blocking(&self) -> bool {
        self.failures.iter().any(ValidationFailure::is_blocking)
    }

    /// The message surfaced to the user: the first failure in check order.
    pub fn first_message(&self) -> Option<&str> {
        self.failures.first().map(|f| f.message.as_str())
    }

    pub fn blocking(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.failures.iter().filter(|f| f.is_blocking())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.failures.iter().filter(|f| !f.is_blocking())
    }
}

pub fn validate_number(
    value: f64,
    rule: NumberRule,
    field: Field,
    language: Language,
) -> Option<ValidationFailure> {
    let label = field.label(language);

    let message = if value.is_nan() {
        match language {
            Language::De => format!("{label} muss eine Zahl sein"),
            Language::En => format!("{label} must be a number"),
        }
    } else if let Some(min) = rule.min.filter(|min| value < *min) {
        match language {
            Language::De => format!("{label} muss mindestens {min} sein"),
            Language::En => format!("{label} must be at least {min}"),
        }
    } else if let Some(max) = rule.max.filter(|max| value > *max) {
        match language {
            Language::De => format!("{label} darf höchstens {max} sein"),
            Language::En => format!("{label} must be at most {max}"),
        }
    } else {
        return None;
    };

    Some(error(field, message))
}

pub fn validate_retirement_age(
    current_age: u32,
    retirement_age: u32,
    language: Language,
) -> Option<ValidationFailure> {
    let limits = &GERMAN_PENSION_LIMITS;

    let message = if retirement_age <= current_age {
        language
            .pick(
                "Renteneintrittsalter muss höher als das aktuelle Alter sein",
                "Retirement age must be greater than current age",
            )
            .to_string()
    } else if retirement_age < limits.min_retirement_age {
        let min = limits.min_retirement_age;
        match language {
            Language::De => format!("Renteneintrittsalter muss mindestens {min} Jahre sein"),
            Language::En => format!("Retirement age must be at least {min}"),
        }
    } else if retirement_age > limits.max_age {
        let max = limits.max_age;
        match language {
            Language::De => format!("Renteneintrittsalter darf höchstens {max} Jahre sein"),
            Language::En => format!("Retirement age must be at most {max}"),
        }
    } else {
        return None;
    };

    Some(error(Field::RetirementAge, message))
}

pub fn validate_ruerup_contribution(
    monthly_contribution: f64,
    language: Language,
) -> Option<ValidationFailure> {
    let limits = &GERMAN_PENSION_LIMITS;
    if monthly_contribution.is_nan() || monthly_contribution * 12.0 <= limits.ruerup_max_annual {
        return None;
    }

    let monthly = limits.ruerup_max_monthly;
    let annual = limits.ruerup_max_annual;
    let message = match language {
        Language::De => {
            format!("Rürup-Beitrag darf höchstens {monthly}€/Monat sein ({annual}€/Jahr)")
        }
        Language::En => {
            format!("Rürup contribution must be at most {monthly}€/month ({annual}€/year)")
        }
    };
    Some(error(Field::MonthlyContribution, message))
}

pub fn validate_riester_contribution(
    monthly_contribution: f64,
    language: Language,
) -> Option<ValidationFailure> {
    let limits = &GERMAN_PENSION_LIMITS;
    if monthly_contribution.is_nan() || monthly_contribution * 12.0 >= limits.riester_min_annual {
        return None;
    }

    let annual = limits.riester_min_annual;
    let message = match language {
        Language::De => format!("Riester-Beitrag muss mindestens {annual}€/Jahr sein"),
        Language::En => format!("Riester contribution must be at least {annual}€/year"),
    };
    Some(error(Field::MonthlyContribution, message))
}

pub fn validate_occupational_contribution(
    monthly_contribution: f64,
    language: Language,
) -> Option<ValidationFailure> {
    let cap = GERMAN_PENSION_LIMITS.occupational_tax_free_monthly;
    if monthly_contribution.is_nan() || monthly_contribution <= cap {
        return None;
    }

    let message = match language {
        Language::De => format!("Hinweis: Beiträge über {cap}€/Monat sind sozialabgabenpflichtig"),
        Language::En => {
            format!("Note: Contributions over {cap}€/month are subject to social security")
        }
    };
    Some(ValidationFailure {
        field: Field::MonthlyContribution,
        severity: Severity::Advisory,
        message,
    })
}

pub fn validate_contribution(
    monthly_contribution: f64,
    product: ProductType,
    language: Language,
) -> Option<ValidationFailure> {
    if monthly_contribution.is_nan() {
        return validate_number(
            monthly_contribution,
            NumberRule {
                min: None,
                max: None,
            },
            Field::MonthlyContribution,
            language,
        );
    }

    match product {
        ProductType::Ruerup => validate_ruerup_contribution(monthly_contribution, language),
        ProductType::Riester => validate_riester_contribution(monthly_contribution, language),
        ProductType::Occupational => {
            validate_occupational_contribution(monthly_contribution, language)
        }
        ProductType::Private => validate_number(
            monthly_contribution,
            NumberRule::between(0.0, GERMAN_PENSION_LIMITS.max_monthly_contribution),
            Field::MonthlyContribution,
            language,
        ),
    }
}

/// Runs every calculator check independently and returns the failures in
/// check order. An empty vector means the inputs are fully valid.
pub fn validate_calculator_inputs(
    inputs: &CalculatorInputs,
    product: ProductType,
    language: Language,
) -> Vec<ValidationFailure> {
    let limits = &GERMAN_PENSION_LIMITS;

    let checks = [
        validate_current_age(inputs.current_age, language),
        validate_retirement_age(inputs.current_age, inputs.retirement_age, language),
        validate_contribution(inputs.monthly_contribution, product, language),
        validate_start_capital(inputs.start_capital, language),
        validate_number(
            inputs.expected_return,
            NumberRule::between(0.0, limits.max_expected_return),
            Field::ExpectedReturn,
            language,
        ),
        validate_inflation_rate(inputs.inflation_rate, language),
    ];

    let failures: Vec<ValidationFailure> = checks.into_iter().flatten().collect();
    tracing::debug!(
        product = product.id(),
        failures = failures.len(),
        "validated calculator inputs"
    );
    failures
}

/// Checks the fields a product comparison takes from the caller: the age
/// horizon, start capital and inflation. Contribution and return come from
/// the catalog and are not checked here.
pub fn validate_comparison_inputs(
    inputs: &CalculatorInputs,
    language: Language,
) -> Vec<ValidationFailure> {
    [
        validate_current_age(inputs.current_age, language),
        validate_retirement_age(inputs.current_age, inputs.retirement_age, language),
        validate_start_capital(inputs.start_capital, language),
        validate_inflation_rate(inputs.inflation_rate, language),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn validate_current_age(current_age: u32, language: Language) -> Option<ValidationFailure> {
    let limits = &GERMAN_PENSION_LIMITS;
    validate_number(
        f64::from(current_age),
        NumberRule::between(f64::from(limits.min_age), f64::from(limits.max_age)),
        Field::CurrentAge,
        language,
    )
}

fn validate_start_capital(start_capital: f64, language: Language) -> Option<ValidationFailure> {
    validate_number(
        start_capital,
        NumberRule::between(0.0, GERMAN_PENSION_LIMITS.max_start_capital),
        Field::StartCapital,
        language,
    )
}

fn validate_inflation_rate(inflation_rate: f64, language: Language) -> Option<ValidationFailure> {
    validate_number(
        inflation_rate,
        NumberRule::between(0.0, GERMAN_PENSION_LIMITS.max_inflation_rate),
        Field::InflationRate,
        language,
    )
}

pub fn validation_report(
    inputs: &CalculatorInputs,
    product: ProductType,
    language: Language,
) -> ValidationReport {
    ValidationReport {
        failures: validate_calculator_inputs(inputs, product, language),
    }
}

pub fn format_validation_error(field_label: &str, message: &str) -> String {
    format!("{field_label}: {message}")
}

/// Coerces free-form input to a non-negative number. Anything that does not
/// parse as a finite number (including `inf`, `NaN`) becomes zero, negatives
/// clamp to zero.
pub fn sanitize_number_input(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.max(0.0),
        _ => 0.0,
    }
}

pub fn clamp_number(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

fn error(field: Field, message: String) -> ValidationFailure {
    ValidationFailure {
        field,
        severity: Severity::Error,
        message,
    }
}
