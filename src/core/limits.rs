/// German pension contribution limits (2024 values).
pub struct PensionLimits {
    pub ruerup_max_annual: f64,
    pub ruerup_max_monthly: f64,
    pub ruerup_deductible_rate: f64,
    pub riester_min_annual: f64,
    pub riester_min_monthly: f64,
    pub riester_max_percent_income: f64,
    pub riester_basic_allowance: f64,
    pub riester_child_allowance_new: f64,
    pub riester_child_allowance_old: f64,
    pub occupational_tax_free_monthly: f64,
    pub occupational_tax_free_annual: f64,
    pub min_age: u32,
    pub max_age: u32,
    pub min_retirement_age: u32,
    pub standard_retirement_age: u32,
    pub max_monthly_contribution: f64,
    pub max_start_capital: f64,
    pub max_expected_return: f64,
    pub max_inflation_rate: f64,
}

pub const GERMAN_PENSION_LIMITS: PensionLimits = PensionLimits {
    // §10 EStG basis pension cap.
    ruerup_max_annual: 27_566.0,
    // floor(27566 / 12)
    ruerup_max_monthly: 2_297.0,
    ruerup_deductible_rate: 0.96,
    riester_min_annual: 60.0,
    riester_min_monthly: 5.0,
    riester_max_percent_income: 0.04,
    riester_basic_allowance: 175.0,
    riester_child_allowance_new: 300.0,
    riester_child_allowance_old: 185.0,
    // 8% of the contribution assessment ceiling.
    occupational_tax_free_monthly: 584.0,
    occupational_tax_free_annual: 7_008.0,
    min_age: 18,
    max_age: 75,
    min_retirement_age: 55,
    standard_retirement_age: 67,
    max_monthly_contribution: 5_000.0,
    max_start_capital: 1_000_000.0,
    max_expected_return: 15.0,
    max_inflation_rate: 10.0,
};

/// Annual share of capital assumed sustainable as a pension drawdown.
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;
