use super::*;

const TILE_50: u32 = 50;
const TILE_100: u32 = 100;

/// Rounding direction for a leftover strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Floor,
    Ceil,
}

impl Rounding {
    fn apply(self, length: u32, unit: u32) -> u32 {
        match self {
            Rounding::Floor => floor_div(length, unit),
            Rounding::Ceil => ceil_div(length, unit),
        }
    }
}

/// Per-axis rounding of the strips left over after placing 100cm tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainderPolicy {
    pub x: Rounding,
    pub y: Rounding,
}

impl RemainderPolicy {
    pub fn uniform(mode: FitMode) -> Self {
        let rounding = match mode {
            FitMode::Loose => Rounding::Floor,
            FitMode::Exact => Rounding::Ceil,
        };
        Self {
            x: rounding,
            y: rounding,
        }
    }
}

/// Tile counts of a hybrid covering before pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridPlan {
    pub n100x: u32,
    pub n100y: u32,
    /// Columns of 50cm tiles in the right strip
    pub remainder_cols: u32,
    /// Rows of 50cm tiles in the bottom strip
    pub remainder_rows: u32,
    pub tiles_100: u32,
    pub tiles_50: u32,
}

impl HybridPlan {
    pub fn coverage(&self) -> Extent {
        Extent {
            width: self.n100x * TILE_100 + self.remainder_cols * TILE_50,
            height: self.n100y * TILE_100 + self.remainder_rows * TILE_50,
        }
    }

    pub fn packs_50(&self) -> u32 {
        ceil_div(self.tiles_50, TILES_PER_PACK)
    }

    fn used_area(&self) -> u64 {
        u64::from(self.tiles_100) * u64::from(TILE_100 * TILE_100)
            + u64::from(self.tiles_50) * u64::from(TILE_50 * TILE_50)
    }
}

/// Places as many whole 100cm tiles as fit, then fills the right strip, the bottom
/// strip and the corner with 50cm tiles rounded per `policy`.
pub fn plan_hybrid(width: u32, height: u32, policy: RemainderPolicy) -> HybridPlan {
    let n100x = width / TILE_100;
    let n100y = height / TILE_100;
    let remain_x = width - n100x * TILE_100;
    let remain_y = height - n100y * TILE_100;

    let remainder_cols = if remain_x > 0 {
        policy.x.apply(remain_x, TILE_50)
    } else {
        0
    };
    let remainder_rows = if remain_y > 0 {
        policy.y.apply(remain_y, TILE_50)
    } else {
        0
    };

    // every 100cm of block edge holds two 50cm tiles
    let mut tiles_50 = 0;
    if remainder_cols > 0 && n100y > 0 {
        tiles_50 += remainder_cols * n100y * 2;
    }
    if remainder_rows > 0 && n100x > 0 {
        tiles_50 += n100x * 2 * remainder_rows;
    }
    if remainder_cols > 0 && remainder_rows > 0 {
        tiles_50 += remainder_cols * remainder_rows;
    }

    HybridPlan {
        n100x,
        n100y,
        remainder_cols,
        remainder_rows,
        // saturates for rooms past the dimension limit
        tiles_100: n100x.saturating_mul(n100y),
        tiles_50,
    }
}

/// Covers a rectangle with one tile size. 50cm tiles are bought in packs of four,
/// 100cm tiles one by one.
pub fn cover_single_size(
    ctx: &PricingContext<'_>,
    width: u32,
    height: u32,
    size: TileSize,
    mode: FitMode,
) -> Option<CoverageResult> {
    if width == 0 || height == 0 || !within_dimension_limit(width, height) {
        return None;
    }

    let tile = size.cm();
    let (nx, ny) = match mode {
        FitMode::Exact => (ceil_div(width, tile), ceil_div(height, tile)),
        FitMode::Loose => (floor_div(width, tile), floor_div(height, tile)),
    };

    let tiles = nx * ny;
    if tiles == 0 {
        return None;
    }

    let packs = match size {
        TileSize::Cm50 => ceil_div(tiles, TILES_PER_PACK),
        TileSize::Cm100 => tiles,
    };
    let price = u64::from(packs) * ctx.tile_price()?;

    let coverage = Extent {
        width: nx * tile,
        height: ny * tile,
    };
    let used_area = u64::from(coverage.width) * u64::from(coverage.height);
    let actual_area = u64::from(width) * u64::from(height);

    let thickness = ctx.thickness_label();
    let breakdown = vec![match size {
        TileSize::Cm50 => LineItem::TilePacks50 {
            thickness: thickness.clone(),
            packs,
            tiles,
        },
        TileSize::Cm100 => LineItem::Tiles100 {
            thickness: thickness.clone(),
            pieces: tiles,
        },
    }];

    debug!(width, height, tile, nx, ny, packs, price, "square tile covering");

    Some(CoverageResult {
        label: format!("{tile}cm tiles - {thickness}"),
        price,
        breakdown,
        coverage_width: coverage.width,
        coverage_height: coverage.height,
        waste_percent: waste_percent(used_area, actual_area),
        fit_messages: fit_messages(
            width,
            height,
            coverage.width,
            coverage.height,
            FitContext::Tile,
        ),
        counts: UnitCounts::SquareTiles {
            size,
            nx,
            ny,
            tiles,
            packs,
        },
        roll_plan: None,
        shipping_memos: Vec::new(),
        visualization: layout::square_tile_layout(
            Extent { width, height },
            coverage,
            tile,
        ),
    })
}

/// Covers a rectangle with 100cm tiles and fills the remainder with 50cm tiles.
/// Both sizes share the catalog's single unit price.
pub fn cover_hybrid(
    ctx: &PricingContext<'_>,
    width: u32,
    height: u32,
    policy: RemainderPolicy,
) -> Option<CoverageResult> {
    if width == 0 || height == 0 || !within_dimension_limit(width, height) {
        return None;
    }

    let plan = plan_hybrid(width, height, policy);
    if plan.tiles_100 + plan.tiles_50 == 0 {
        return None;
    }

    let packs_50 = plan.packs_50();
    let price = u64::from(plan.tiles_100 + packs_50) * ctx.tile_price()?;
    let coverage = plan.coverage();
    let actual_area = u64::from(width) * u64::from(height);

    debug!(
        width,
        height,
        tiles_100 = plan.tiles_100,
        tiles_50 = plan.tiles_50,
        price,
        "hybrid tile covering"
    );

    Some(CoverageResult {
        label: format!("Hybrid tiles - {}", ctx.thickness_label()),
        price,
        breakdown: tile_line_items(ctx, plan.tiles_100, plan.tiles_50),
        coverage_width: coverage.width,
        coverage_height: coverage.height,
        waste_percent: waste_percent(plan.used_area(), actual_area),
        fit_messages: fit_messages(
            width,
            height,
            coverage.width,
            coverage.height,
            FitContext::Tile,
        ),
        counts: UnitCounts::Hybrid {
            tiles_100: plan.tiles_100,
            tiles_50: plan.tiles_50,
            packs_50,
        },
        roll_plan: None,
        shipping_memos: Vec::new(),
        visualization: layout::hybrid_layout(Extent { width, height }, &plan),
    })
}

/// Hybrid covering that starts loose and rounds an axis up once its shortfall
/// reaches the configured threshold.
pub fn cover_hybrid_auto(
    ctx: &PricingContext<'_>,
    width: u32,
    height: u32,
) -> Option<CoverageResult> {
    if !within_dimension_limit(width, height) {
        return None;
    }
    let policy = auto_policy(ctx, width, height);
    if policy != RemainderPolicy::uniform(FitMode::Loose) {
        debug!(width, height, ?policy, "hybrid auto mode rounds up");
    }
    cover_hybrid(ctx, width, height, policy)
}

/// Rounding policy auto mode settles on for a rectangle
pub(super) fn auto_policy(ctx: &PricingContext<'_>, width: u32, height: u32) -> RemainderPolicy {
    let loose = plan_hybrid(width, height, RemainderPolicy::uniform(FitMode::Loose));
    let coverage = if loose.tiles_100 + loose.tiles_50 > 0 {
        loose.coverage()
    } else {
        Extent::default()
    };

    let threshold = ctx.config.hybrid_auto_threshold_cm;
    let pick = |shortfall: u32| {
        if shortfall >= threshold {
            Rounding::Ceil
        } else {
            Rounding::Floor
        }
    };

    RemainderPolicy {
        x: pick(width.saturating_sub(coverage.width)),
        y: pick(height.saturating_sub(coverage.height)),
    }
}

/// Breakdown lines for a mix of 100cm pieces and 50cm tiles
pub(super) fn tile_line_items(
    ctx: &PricingContext<'_>,
    tiles_100: u32,
    tiles_50: u32,
) -> Vec<LineItem> {
    let thickness = ctx.thickness_label();
    let mut items = Vec::new();

    if tiles_100 > 0 {
        items.push(LineItem::Tiles100 {
            thickness: thickness.clone(),
            pieces: tiles_100,
        });
    }

    let packs = ceil_div(tiles_50, TILES_PER_PACK);
    if packs > 0 {
        items.push(LineItem::TilePacks50 {
            thickness,
            packs,
            tiles: tiles_50,
        });
    }

    items
}
