//! Product and price tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EstimatorConfig;
use crate::types::{EstimatorError, ProductKind, Result};

/// Priority assumed for a roll width the catalog does not rank.
pub const DEFAULT_WIDTH_PRIORITY: u32 = 2;

/// Prices and limits of one product line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceCatalog {
    pub name: String,
    /// Price per 100cm piece or per 4-pack of 50cm tiles, by thickness
    #[serde(default)]
    pub tile_prices: BTreeMap<String, u64>,
    /// Price per 50cm of roll length, by thickness then width
    #[serde(default)]
    pub roll_prices: BTreeMap<String, BTreeMap<u32, u64>>,
    /// Purchase preference per roll width, lower is preferred
    #[serde(default)]
    pub width_priority: BTreeMap<u32, u32>,
    /// Longest single roll per thickness in cm
    #[serde(default)]
    pub max_roll_length: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_thickness: Option<String>,
}

impl PriceCatalog {
    pub fn thicknesses(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self
            .tile_prices
            .keys()
            .chain(self.roll_prices.keys())
            .map(String::as_str)
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    pub fn has_thickness(&self, thickness: &str) -> bool {
        self.tile_prices.contains_key(thickness) || self.roll_prices.contains_key(thickness)
    }

    /// Whether spaces of `kind` can be priced at `thickness`.
    pub fn supports(&self, kind: ProductKind, thickness: &str) -> bool {
        if kind.is_roll() {
            self.roll_prices
                .get(thickness)
                .is_some_and(|widths| !widths.is_empty())
        } else {
            self.tile_prices.contains_key(thickness)
        }
    }

    pub fn tile_price(&self, thickness: &str) -> Option<u64> {
        self.tile_prices.get(thickness).copied()
    }

    pub fn roll_price(&self, thickness: &str, width: u32) -> Option<u64> {
        self.roll_prices.get(thickness)?.get(&width).copied()
    }

    /// Roll widths offered at `thickness`, ascending
    pub fn available_widths(&self, thickness: &str) -> Vec<u32> {
        self.roll_prices
            .get(thickness)
            .map(|widths| widths.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn width_priority(&self, width: u32) -> u32 {
        self.width_priority
            .get(&width)
            .copied()
            .unwrap_or(DEFAULT_WIDTH_PRIORITY)
    }

    /// `None` means rolls of this thickness can be cut to any length.
    pub fn max_roll_length(&self, thickness: &str) -> Option<u32> {
        self.max_roll_length.get(thickness).copied()
    }
}

/// All product lines, keyed by product id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: BTreeMap<String, PriceCatalog>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn product(&self, id: &str) -> Result<&PriceCatalog> {
        self.products
            .get(id)
            .ok_or_else(|| EstimatorError::UnknownProduct(id.to_string()))
    }

    /// The shipped product table.
    pub fn builtin() -> Self {
        let mut products = BTreeMap::new();

        products.insert(
            "puzzle".to_string(),
            PriceCatalog {
                name: "Puzzle mat".to_string(),
                tile_prices: [("25", 17_900), ("25plus", 22_800), ("40", 26_300)]
                    .into_iter()
                    .map(|(t, p)| (t.to_string(), p))
                    .collect(),
                default_thickness: Some("25".to_string()),
                ..PriceCatalog::default()
            },
        );

        products.insert(
            "baby-roll".to_string(),
            roll_catalog(
                "Baby roll mat",
                "17",
                &[
                    ("12", &[(110, 12_600), (120, 14_900), (125, 14_900), (140, 16_800)]),
                    (
                        "17",
                        &[
                            (70, 10_700),
                            (110, 13_800),
                            (120, 15_300),
                            (125, 16_100),
                            (140, 18_200),
                        ],
                    ),
                    ("22", &[(110, 19_100), (120, 20_900), (125, 20_900)]),
                ],
                &[(70, 2), (110, 1), (120, 1), (125, 3), (140, 1)],
                &[("12", 1200), ("17", 800), ("22", 600)],
            ),
        );

        products.insert(
            "pet-roll".to_string(),
            roll_catalog(
                "Pet roll mat",
                "9",
                &[
                    ("6", &[(110, 10_400), (120, 11_900), (125, 11_900), (140, 13_200)]),
                    ("9", &[(110, 10_900), (120, 12_300), (125, 12_300), (140, 13_500)]),
                    ("12", &[(110, 12_600), (120, 14_900), (125, 14_900), (140, 16_800)]),
                ],
                &[(110, 1), (120, 1), (125, 3), (140, 1)],
                &[("6", 1300), ("9", 1200), ("12", 1200)],
            ),
        );

        products.insert(
            "riposo-roll".to_string(),
            roll_catalog(
                "Riposo roll mat",
                "17",
                &[(
                    "17",
                    &[
                        (80, 10_900),
                        (90, 11_900),
                        (100, 12_900),
                        (110, 13_900),
                        (120, 15_400),
                        (130, 16_400),
                        (135, 17_900),
                    ],
                )],
                &[
                    (80, 2),
                    (90, 2),
                    (100, 1),
                    (110, 1),
                    (120, 1),
                    (130, 1),
                    (135, 2),
                ],
                &[("17", 700)],
            ),
        );

        products.insert(
            "parklon-roll".to_string(),
            roll_catalog(
                "Parklon roll mat",
                "17",
                &[
                    (
                        "17",
                        &[
                            (50, 10_950),
                            (60, 12_950),
                            (70, 14_950),
                            (80, 16_950),
                            (90, 18_450),
                            (100, 19_950),
                            (110, 21_950),
                            (120, 23_950),
                            (130, 25_950),
                            (140, 28_450),
                            (150, 29_950),
                        ],
                    ),
                    (
                        "22",
                        &[
                            (50, 12_450),
                            (100, 24_450),
                            (110, 27_450),
                            (120, 31_450),
                            (130, 33_450),
                            (140, 35_450),
                            (150, 37_450),
                        ],
                    ),
                ],
                &[
                    (50, 2),
                    (60, 2),
                    (70, 2),
                    (80, 2),
                    (90, 2),
                    (100, 1),
                    (110, 1),
                    (120, 1),
                    (130, 1),
                    (140, 1),
                    (150, 1),
                ],
                &[("17", 700), ("22", 500)],
            ),
        );

        products.insert(
            "tgo-roll".to_string(),
            roll_catalog(
                "TGO roll mat",
                "14",
                &[
                    ("10", &[(110, 10_900), (140, 13_900)]),
                    (
                        "14",
                        &[
                            (50, 10_900),
                            (100, 12_900),
                            (110, 13_900),
                            (125, 15_900),
                            (140, 17_900),
                            (150, 26_900),
                        ],
                    ),
                    ("24", &[(110, 19_900), (125, 21_400), (140, 22_900), (150, 30_900)]),
                    ("34", &[(110, 24_900), (140, 28_900)]),
                ],
                &[(50, 2), (100, 1), (110, 1), (125, 1), (140, 1), (150, 1)],
                &[("10", 1000), ("14", 1000), ("24", 1000), ("34", 1000)],
            ),
        );

        Self { products }
    }
}

type WidthPrices<'a> = &'a [(u32, u64)];

fn roll_catalog(
    name: &str,
    default_thickness: &str,
    prices: &[(&str, WidthPrices<'_>)],
    priorities: &[(u32, u32)],
    max_lengths: &[(&str, u32)],
) -> PriceCatalog {
    PriceCatalog {
        name: name.to_string(),
        tile_prices: BTreeMap::new(),
        roll_prices: prices
            .iter()
            .map(|(thickness, widths)| (thickness.to_string(), widths.iter().copied().collect()))
            .collect(),
        width_priority: priorities.iter().copied().collect(),
        max_roll_length: max_lengths
            .iter()
            .map(|(thickness, length)| (thickness.to_string(), *length))
            .collect(),
        default_thickness: Some(default_thickness.to_string()),
    }
}

/// Human label of a thickness key, `25` → `25T`, `25plus` → `25T Plus+`
pub fn thickness_label(thickness: &str) -> String {
    match thickness.strip_suffix("plus") {
        Some(base) => format!("{base}T Plus+"),
        None => format!("{thickness}T"),
    }
}

/// Everything an engine needs to price a covering. Passed explicitly into every call.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    pub product: &'a str,
    pub thickness: &'a str,
    pub catalog: &'a PriceCatalog,
    pub config: &'a EstimatorConfig,
}

impl<'a> PricingContext<'a> {
    pub fn new(
        product: &'a str,
        thickness: &'a str,
        catalog: &'a PriceCatalog,
        config: &'a EstimatorConfig,
    ) -> Self {
        Self {
            product,
            thickness,
            catalog,
            config,
        }
    }

    pub fn thickness_label(&self) -> String {
        thickness_label(self.thickness)
    }

    pub fn tile_price(&self) -> Option<u64> {
        self.catalog.tile_price(self.thickness)
    }

    pub fn roll_price(&self, width: u32) -> Option<u64> {
        self.catalog.roll_price(self.thickness, width)
    }

    pub fn available_widths(&self) -> Vec<u32> {
        self.catalog.available_widths(self.thickness)
    }

    pub fn width_priority(&self, width: u32) -> u32 {
        self.catalog.width_priority(width)
    }

    pub fn max_roll_length(&self) -> Option<u32> {
        self.catalog.max_roll_length(self.thickness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thickness_labels() {
        assert_eq!(thickness_label("25"), "25T");
        assert_eq!(thickness_label("25plus"), "25T Plus+");
    }

    #[test]
    fn test_builtin_lookups() {
        let catalog = Catalog::builtin();
        let baby = catalog.product("baby-roll").unwrap();

        assert_eq!(baby.available_widths("17"), vec![70, 110, 120, 125, 140]);
        assert_eq!(baby.roll_price("17", 110), Some(13_800));
        assert_eq!(baby.roll_price("22", 140), None);
        assert_eq!(baby.width_priority(125), 3);
        assert_eq!(baby.width_priority(95), DEFAULT_WIDTH_PRIORITY);
        assert_eq!(baby.max_roll_length("22"), Some(600));
        assert!(baby.supports(ProductKind::RollMat { pet: false }, "17"));
        assert!(!baby.supports(ProductKind::HybridTile, "17"));
    }

    #[test]
    fn test_unknown_product_is_error() {
        let catalog = Catalog::builtin();
        assert!(matches!(
            catalog.product("carpet"),
            Err(EstimatorError::UnknownProduct(_))
        ));
    }

    #[test]
    fn test_catalog_json_integer_width_keys() {
        let json = r#"{"products": {"mini": {
            "name": "Mini",
            "roll_prices": {"9": {"100": 9000, "130": 11000}},
            "max_roll_length": {"9": 1000}
        }}}"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let mini = catalog.product("mini").unwrap();

        assert_eq!(mini.available_widths("9"), vec![100, 130]);
        assert_eq!(mini.thicknesses(), vec!["9"]);
    }
}
