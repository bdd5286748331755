//! Floor mat quantity and price estimation.
//!
//! Spaces are covered with square tiles, hybrid tiles or roll goods, priced
//! against a [`Catalog`] and totalled into an [`Estimate`].

pub mod catalog;
pub mod config;
pub mod estimator;
pub mod geometry;
pub mod types;

pub use catalog::{Catalog, PriceCatalog, PricingContext};
pub use config::EstimatorConfig;
pub use estimator::Estimator;
pub use types::*;
