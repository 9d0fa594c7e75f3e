use serde::Serialize;

use super::engine::{project, summarize};
use super::types::{
    CalculatorInputs, Language, ProductType, ProjectionPoint, ProjectionSummary, ValidationFailure,
};
use super::validation::validate_comparison_inputs;
use crate::error::{Error, Result};

pub const MAX_COMPARED_PRODUCTS: usize = 4;

const DEFAULT_SELECTION: [ProductType; 3] = [
    ProductType::Riester,
    ProductType::Ruerup,
    ProductType::Private,
];

/// Catalog entry for one product. Scores are on a 0..=10 scale; for `costs`
/// higher means more expensive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProfile {
    pub product: ProductType,
    pub name: &'static str,
    pub category: &'static str,
    pub monthly_contribution: f64,
    pub expected_return: f64,
    pub tax_benefit: f64,
    pub flexibility: f64,
    pub guarantee: f64,
    pub costs: f64,
    pub features: [&'static str; 3],
    pub pros: [&'static str; 3],
    pub cons: [&'static str; 3],
}

pub fn product_profile(product: ProductType, language: Language) -> ProductProfile {
    let t = |de: &'static str, en: &'static str| language.pick(de, en);
    match product {
        ProductType::Riester => ProductProfile {
            product,
            name: t("Riester-Rente", "Riester Pension"),
            category: t("Staatlich gefördert", "Government-subsidized"),
            monthly_contribution: 175.0,
            expected_return: 4.5,
            tax_benefit: 9.0,
            flexibility: 5.0,
            guarantee: 8.0,
            costs: 6.0,
            features: [
                t("Staatliche Zulagen", "State subsidies"),
                t("Steuervorteile", "Tax benefits"),
                t("Garantierte Beiträge", "Guaranteed contributions"),
            ],
            pros: [
                t("Hohe staatliche Förderung", "High government support"),
                t("Beitragsgarantie", "Contribution guarantee"),
                t("Pfändungsschutz", "Protection from seizure"),
            ],
            cons: [
                t("Begrenzte Flexibilität", "Limited flexibility"),
                t("Niedrige Rendite", "Low returns"),
                t("Komplexe Förderlogik", "Complex subsidy logic"),
            ],
        },
        ProductType::Ruerup => ProductProfile {
            product,
            name: t("Rürup-Rente", "Rürup Pension"),
            category: t("Steuerbegünstigt", "Tax-advantaged"),
            monthly_contribution: 300.0,
            expected_return: 5.2,
            tax_benefit: 10.0,
            flexibility: 3.0,
            guarantee: 7.0,
            costs: 7.0,
            features: [
                t("Hohe Steuerersparnis", "High tax savings"),
                t("Für Selbstständige", "For self-employed"),
                t("Insolvenzschutz", "Bankruptcy protection"),
            ],
            pros: [
                t("Maximale Steuerersparnis", "Maximum tax savings"),
                t("Ideal für Selbstständige", "Ideal for self-employed"),
                t("Hoher Insolvenzschutz", "High bankruptcy protection"),
            ],
            cons: [
                t("Keine Kapitalauszahlung", "No capital payout"),
                t("Nicht vererbbar", "Not inheritable"),
                t("Keine vorzeitige Kündigung", "No early termination"),
            ],
        },
        ProductType::Private => ProductProfile {
            product,
            name: t("Private Rente", "Private Pension"),
            category: t("Flexibel", "Flexible"),
            monthly_contribution: 250.0,
            expected_return: 7.5,
            tax_benefit: 3.0,
            flexibility: 10.0,
            guarantee: 4.0,
            costs: 5.0,
            features: [
                t("Maximale Flexibilität", "Maximum flexibility"),
                t("Weltweite Investments", "Global investments"),
                t("Vererbbar", "Inheritable"),
            ],
            pros: [
                t("Höchste Renditechance", "Highest return potential"),
                t("Volle Kontrolle", "Full control"),
                t("Jederzeit kündbar", "Cancellable anytime"),
            ],
            cons: [
                t("Keine staatliche Förderung", "No government support"),
                t("Höheres Risiko", "Higher risk"),
                t("Kapitalertragssteuer", "Capital gains tax"),
            ],
        },
        ProductType::Occupational => ProductProfile {
            product,
            name: t("Betriebsrente", "Occupational Pension"),
            category: t("Arbeitgeber-gefördert", "Employer-sponsored"),
            monthly_contribution: 200.0,
            expected_return: 5.8,
            tax_benefit: 8.0,
            flexibility: 6.0,
            guarantee: 9.0,
            costs: 4.0,
            features: [
                t("Arbeitgeberzuschuss", "Employer contribution"),
                t("Sozialabgabenfrei", "Social security exempt"),
                t("Insolvenzgeschützt", "Insolvency protected"),
            ],
            pros: [
                t("Arbeitgeber-Beteiligung", "Employer participation"),
                t("Steuer- und Sozialabgabenfrei", "Tax and social security exempt"),
                t("Hohe Sicherheit", "High security"),
            ],
            cons: [
                t("An Arbeitgeber gebunden", "Tied to employer"),
                t("Eingeschränkte Portabilität", "Limited portability"),
                t("Begrenzte Wahlmöglichkeiten", "Limited choices"),
            ],
        },
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RadarMetric {
    ExpectedReturn,
    TaxBenefit,
    Flexibility,
    Guarantee,
    Costs,
}

impl RadarMetric {
    pub const ALL: [RadarMetric; 5] = [
        RadarMetric::ExpectedReturn,
        RadarMetric::TaxBenefit,
        RadarMetric::Flexibility,
        RadarMetric::Guarantee,
        RadarMetric::Costs,
    ];

    pub fn label(self, language: Language) -> &'static str {
        match self {
            RadarMetric::ExpectedReturn => language.pick("Erwartete Rendite", "Expected Return"),
            RadarMetric::TaxBenefit => language.pick("Steuervorteil", "Tax Benefit"),
            RadarMetric::Flexibility => language.pick("Flexibilität", "Flexibility"),
            RadarMetric::Guarantee => language.pick("Garantie", "Guarantee"),
            RadarMetric::Costs => language.pick("Kosten", "Costs"),
        }
    }

    /// Plotted value; costs are inverted so that larger is better on every axis.
    pub fn value(self, profile: &ProductProfile) -> f64 {
        match self {
            RadarMetric::ExpectedReturn => profile.expected_return,
            RadarMetric::TaxBenefit => profile.tax_benefit,
            RadarMetric::Flexibility => profile.flexibility,
            RadarMetric::Guarantee => profile.guarantee,
            RadarMetric::Costs => 10.0 - profile.costs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarValue {
    pub product: ProductType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarRow {
    pub metric: RadarMetric,
    pub label: &'static str,
    pub values: Vec<RadarValue>,
}

pub fn radar_rows(selection: &[ProductType], language: Language) -> Vec<RadarRow> {
    let profiles: Vec<ProductProfile> = selection
        .iter()
        .map(|&product| product_profile(product, language))
        .collect();

    RadarMetric::ALL
        .iter()
        .map(|&metric| RadarRow {
            metric,
            label: metric.label(language),
            values: profiles
                .iter()
                .map(|profile| RadarValue {
                    product: profile.product,
                    value: metric.value(profile),
                })
                .collect(),
        })
        .collect()
}

/// Ordered set of products under comparison, with a single-level undo for
/// the most recent removal.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSelection {
    products: Vec<ProductType>,
    last_removed: Option<(ProductType, usize)>,
}

impl Default for ComparisonSelection {
    fn default() -> Self {
        Self {
            products: DEFAULT_SELECTION.to_vec(),
            last_removed: None,
        }
    }
}

impl ComparisonSelection {
    /// Builds a selection from an arbitrary list, dropping duplicates and
    /// anything past the cap. An empty list falls back to the default set.
    pub fn from_products(products: &[ProductType]) -> Self {
        if products.is_empty() {
            return Self::default();
        }
        let mut selection = Self {
            products: Vec::with_capacity(MAX_COMPARED_PRODUCTS),
            last_removed: None,
        };
        for &product in products {
            selection.add(product);
        }
        selection
    }

    pub fn products(&self) -> &[ProductType] {
        &self.products
    }

    pub fn contains(&self, product: ProductType) -> bool {
        self.products.contains(&product)
    }

    /// Returns false when the product is already selected or the cap is hit.
    pub fn add(&mut self, product: ProductType) -> bool {
        if self.contains(product) || self.products.len() >= MAX_COMPARED_PRODUCTS {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Returns false when the product is absent or is the last one left.
    pub fn remove(&mut self, product: ProductType) -> bool {
        if self.products.len() <= 1 {
            return false;
        }
        let Some(index) = self.products.iter().position(|&p| p == product) else {
            return false;
        };
        self.products.remove(index);
        self.last_removed = Some((product, index));
        true
    }

    /// Reinserts the most recently removed product at its old position.
    pub fn undo(&mut self) -> bool {
        let Some((product, index)) = self.last_removed.take() else {
            return false;
        };
        if self.contains(product) || self.products.len() >= MAX_COMPARED_PRODUCTS {
            return false;
        }
        let index = index.min(self.products.len());
        self.products.insert(index, product);
        true
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProjection {
    pub product: ProductType,
    pub name: &'static str,
    pub monthly_contribution: f64,
    pub expected_return: f64,
    pub summary: ProjectionSummary,
    pub points: Vec<ProjectionPoint>,
}

/// Projects each product with its catalog contribution and return over the
/// age horizon, start capital and inflation of `base`. Fails with the
/// comparison checks' failures when `base` is out of range.
pub fn project_products(
    base: &CalculatorInputs,
    selection: &[ProductType],
    language: Language,
) -> Result<Vec<ProductProjection>> {
    let failures = validate_comparison_inputs(base, language);
    if failures.iter().any(ValidationFailure::is_blocking) {
        return Err(Error::Validation(failures));
    }

    let projections = selection
        .iter()
        .map(|&product| {
            let profile = product_profile(product, language);
            let inputs = CalculatorInputs {
                monthly_contribution: profile.monthly_contribution,
                expected_return: profile.expected_return,
                ..*base
            };
            let points = project(&inputs);
            let summary = summarize(&inputs, &points);
            ProductProjection {
                product,
                name: profile.name,
                monthly_contribution: profile.monthly_contribution,
                expected_return: profile.expected_return,
                summary,
                points,
            }
        })
        .collect();
    Ok(projections)
}
