mod comparison;
mod engine;
mod limits;
mod types;
mod validation;

pub use comparison::{
    ComparisonSelection, MAX_COMPARED_PRODUCTS, ProductProfile, ProductProjection, RadarMetric,
    RadarRow, RadarValue, product_profile, project_products, radar_rows,
};
pub use engine::{calculate, monthly_pension, project, round_half_up, summarize};
pub use limits::{GERMAN_PENSION_LIMITS, PensionLimits, SAFE_WITHDRAWAL_RATE};
pub use types::{
    Calculation, CalculatorInputs, Field, Language, ProductType, ProjectionPoint,
    ProjectionSummary, Severity, ValidationFailure,
};
pub use validation::{
    NumberRule, ValidationReport, clamp_number, format_validation_error, sanitize_number_input,
    validate_calculator_inputs, validate_comparison_inputs, validate_contribution,
    validate_number, validate_retirement_age, validation_report,
};
