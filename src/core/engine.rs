use super::limits::SAFE_WITHDRAWAL_RATE;
use super::types::{
    Calculation, CalculatorInputs, Language, ProductType, ProjectionPoint, ProjectionSummary,
};
use super::validation::validation_report;
use crate::error::{Error, Result};

/// Projects the capital year by year from `current_age` to `retirement_age`
/// inclusive. Returns are earned on the balance at the start of each year;
/// that year's contributions only start earning in the following step.
///
/// The caller is expected to have validated the inputs.
pub fn project(inputs: &CalculatorInputs) -> Vec<ProjectionPoint> {
    if inputs.retirement_age < inputs.current_age {
        return Vec::new();
    }

    let years = inputs.retirement_age - inputs.current_age;
    let annual_contribution = inputs.monthly_contribution * 12.0;
    let rate = inputs.expected_return / 100.0;

    let mut points = Vec::with_capacity(years as usize + 1);
    let mut capital = inputs.start_capital;

    for offset in 0..=years {
        let total_invested = inputs.start_capital + annual_contribution * f64::from(offset);
        let this_year_return = capital * rate;
        capital += annual_contribution + this_year_return;

        points.push(ProjectionPoint {
            year: inputs.current_age + offset,
            capital: round_half_up(capital),
            contributions: round_half_up(total_invested),
            returns: round_half_up(capital - total_invested),
        });
    }

    points
}

/// Derives the headline figures from a projected series.
pub fn summarize(inputs: &CalculatorInputs, points: &[ProjectionPoint]) -> ProjectionSummary {
    let (final_capital, total_contributions, total_returns) = points
        .last()
        .map(|p| (p.capital, p.contributions, p.returns))
        .unwrap_or((0.0, 0.0, 0.0));

    let years = inputs.years_to_retirement();
    let gain_percent =
        (total_contributions > 0.0).then(|| total_returns / total_contributions * 100.0);

    let price_level = (1.0 + inputs.inflation_rate / 100.0).powf(f64::from(years));
    let real_final_capital = if price_level > 0.0 {
        final_capital / price_level
    } else {
        final_capital
    };

    ProjectionSummary {
        years,
        final_capital,
        total_contributions,
        total_returns,
        monthly_pension: monthly_pension(final_capital),
        gain_percent,
        real_final_capital: round_half_up(real_final_capital),
        real_monthly_pension: monthly_pension(real_final_capital),
    }
}

/// Monthly payout under the fixed safe-withdrawal heuristic.
pub fn monthly_pension(final_capital: f64) -> f64 {
    round_half_up(final_capital * SAFE_WITHDRAWAL_RATE / 12.0)
}

/// Validates, projects and summarizes in one call. Blocking validation
/// failures withhold the projection; advisories ride along with the result.
pub fn calculate(
    inputs: &CalculatorInputs,
    product: ProductType,
    language: Language,
) -> Result<Calculation> {
    let report = validation_report(inputs, product, language);
    if report.has_blocking() {
        return Err(Error::Validation(report.failures));
    }

    let points = project(inputs);
    let summary = summarize(inputs, &points);
    tracing::debug!(
        product = product.id(),
        points = points.len(),
        final_capital = summary.final_capital,
        "projection complete"
    );

    Ok(Calculation {
        product,
        inputs: *inputs,
        points,
        summary,
        advisories: report.advisories().cloned().collect(),
    })
}

/// Rounds halves towards positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
