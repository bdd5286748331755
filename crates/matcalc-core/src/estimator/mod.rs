use crate::catalog::{Catalog, PriceCatalog, PricingContext};
use crate::config::*;
use crate::geometry::*;
use crate::types::*;
use tracing::debug;

mod complex;
mod layout;
mod rolls;
mod search;
mod summary;
mod tiles;

pub use complex::cover_complex;
pub use rolls::{cover_roll, preferred_roll_axis, resolve_length, split_length};
pub use search::{compare_candidates, search_width_combinations, PricedCombination};
pub use tiles::{
    cover_hybrid, cover_hybrid_auto, cover_single_size, plan_hybrid, HybridPlan,
    RemainderPolicy, Rounding,
};

/// Prices every space of a request against one product line and thickness.
pub struct Estimator {
    request: EstimateRequest,
    catalog: PriceCatalog,
}

impl Estimator {
    /// Validates the request against the catalog and builds a new estimator.
    pub fn new(request: EstimateRequest, catalog: &Catalog) -> Result<Self> {
        if request.spaces.is_empty() {
            return Err(EstimatorError::InvalidInput(
                "At least one space must be provided".to_string(),
            ));
        }

        let product = catalog.product(&request.product)?;

        if !product.has_thickness(&request.thickness) {
            return Err(EstimatorError::UnknownThickness {
                product: request.product.clone(),
                thickness: request.thickness.clone(),
            });
        }

        for space in &request.spaces {
            if !product.supports(space.product_type, &request.thickness) {
                return Err(EstimatorError::UnsupportedProduct {
                    product: request.product.clone(),
                    kind: space.product_type,
                });
            }
        }

        request.config.validate()?;

        Ok(Self {
            catalog: product.clone(),
            request,
        })
    }

    fn context(&self) -> PricingContext<'_> {
        PricingContext::new(
            &self.request.product,
            &self.request.thickness,
            &self.catalog,
            &self.request.config,
        )
    }

    /// Runs every space through its engine and totals the results.
    /// Spaces that cannot be covered are left out.
    pub fn estimate(&self) -> Estimate {
        let ctx = self.context();

        let spaces: Vec<SpaceEstimate> = self
            .request
            .spaces
            .iter()
            .enumerate()
            .filter_map(|(index, space)| {
                let result = calculate_space(&ctx, space);
                if result.is_none() {
                    debug!(index, name = %space.name, "space produced no covering");
                }
                let result = result?;
                let (width, height) = if space.pieces.len() >= 2 {
                    (result.coverage_width, result.coverage_height)
                } else {
                    space_dimensions(space)
                };

                Some(SpaceEstimate {
                    index,
                    name: space.name.clone(),
                    width,
                    height,
                    product_type: space.product_type,
                    calc_mode: space.calc_mode,
                    result,
                })
            })
            .collect();

        let summary = self.calculate_summary(&spaces);

        Estimate {
            product: self.request.product.clone(),
            thickness: self.request.thickness.clone(),
            spaces,
            summary,
        }
    }
}

/// Width and height a simple space is computed with. A single piece stands in
/// for the space's own dimensions.
fn space_dimensions(space: &Space) -> (u32, u32) {
    match space.pieces.as_slice() {
        [piece] => (clamp_dimension(piece.w), clamp_dimension(piece.h)),
        _ => (clamp_dimension(space.width), clamp_dimension(space.height)),
    }
}

/// Routes a space to the engine for its product kind and piece count.
pub fn calculate_space(ctx: &PricingContext<'_>, space: &Space) -> Option<CoverageResult> {
    if space.pieces.len() >= 2 {
        return cover_complex(ctx, &space.pieces, space.product_type, space.calc_mode);
    }

    let (width, height) = space_dimensions(space);
    calculate_rectangle(ctx, width, height, space.product_type, space.calc_mode)
}

/// Covers a single rectangle.
pub fn calculate_rectangle(
    ctx: &PricingContext<'_>,
    width: u32,
    height: u32,
    kind: ProductKind,
    mode: CalcMode,
) -> Option<CoverageResult> {
    if width == 0 || height == 0 {
        return None;
    }

    match kind {
        ProductKind::SquareTile(size) => cover_single_size(ctx, width, height, size, mode.bound()),
        ProductKind::HybridTile => match mode {
            CalcMode::Auto => cover_hybrid_auto(ctx, width, height),
            CalcMode::Loose | CalcMode::Exact => cover_hybrid(
                ctx,
                width,
                height,
                RemainderPolicy::uniform(mode.bound()),
            ),
        },
        ProductKind::RollMat { pet } => cover_roll(ctx, width, height, pet, None),
    }
}
