use super::layout::{complex_layout, roll_stripes};
use super::tiles::{auto_policy, tile_line_items};
use super::*;
use tracing::warn;

/// Covers a space made of several possibly overlapping rectangles.
///
/// Tiles are laid on a grid over the footprint's bounding box. Rolls are laid
/// per strip of the union, trying both sweep directions.
pub fn cover_complex(
    ctx: &PricingContext<'_>,
    pieces: &[Piece],
    kind: ProductKind,
    mode: CalcMode,
) -> Option<CoverageResult> {
    let footprint = Footprint::from_pieces(pieces)?;

    match kind {
        ProductKind::SquareTile(size) => {
            cover_tile_grid(ctx, &footprint, TileGrid::Single(size), mode.bound())
        }
        ProductKind::HybridTile => {
            let bound = match mode {
                CalcMode::Auto => hybrid_auto_bound(ctx, &footprint),
                CalcMode::Loose | CalcMode::Exact => mode.bound(),
            };
            cover_tile_grid(ctx, &footprint, TileGrid::Hybrid, bound)
        }
        ProductKind::RollMat { pet } => cover_roll_strips(ctx, &footprint, pet),
    }
}

/// Auto mode covers a complex hybrid space exactly once any piece would be left
/// with a shortfall of the configured threshold.
fn hybrid_auto_bound(ctx: &PricingContext<'_>, footprint: &Footprint) -> FitMode {
    let loose = RemainderPolicy::uniform(FitMode::Loose);
    if footprint
        .pieces
        .iter()
        .any(|p| auto_policy(ctx, p.w, p.h) != loose)
    {
        FitMode::Exact
    } else {
        FitMode::Loose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileGrid {
    Single(TileSize),
    Hybrid,
}

impl TileGrid {
    fn cell(self) -> u32 {
        match self {
            TileGrid::Single(TileSize::Cm100) => 100,
            TileGrid::Single(TileSize::Cm50) | TileGrid::Hybrid => GRID_CELL_CM,
        }
    }
}

/// Which piece claims each grid cell, `None` for cells outside the footprint.
/// Overlapping pieces resolve to the lowest index. The footprint must be within
/// the dimension limit.
fn occupy_cells(footprint: &Footprint, cell: u32, bound: FitMode) -> Vec<Vec<Option<u32>>> {
    let cols = ceil_div(footprint.width, cell);
    let rows = ceil_div(footprint.height, cell);
    let reach = i64::from(cell / 2);

    let overlap = |lo: i64, hi: i64, start: i32, len: u32| {
        let start = i64::from(start);
        hi.min(start + i64::from(len)) - lo.max(start)
    };

    (0..rows)
        .map(|row| {
            let top = i64::from(row * cell);
            (0..cols)
                .map(|col| {
                    let left = i64::from(col * cell);
                    footprint
                        .pieces
                        .iter()
                        .filter(|p| {
                            let ox = overlap(left, left + i64::from(cell), p.x, p.w);
                            let oy = overlap(top, top + i64::from(cell), p.y, p.h);
                            match bound {
                                FitMode::Exact => ox > 0 && oy > 0,
                                FitMode::Loose => ox >= reach && oy >= reach,
                            }
                        })
                        .map(|p| p.index)
                        .min()
                })
                .collect()
        })
        .collect()
}

fn cover_tile_grid(
    ctx: &PricingContext<'_>,
    footprint: &Footprint,
    grid: TileGrid,
    bound: FitMode,
) -> Option<CoverageResult> {
    if !within_dimension_limit(footprint.width, footprint.height) {
        warn!(
            width = footprint.width,
            height = footprint.height,
            "complex footprint too large for a tile grid"
        );
        return None;
    }

    let cell = grid.cell();
    let cells = occupy_cells(footprint, cell, bound);
    let rows = cells.len();
    let cols = cells.first().map_or(0, Vec::len);

    let mut claimed = vec![vec![false; cols]; rows];
    let mut rects = Vec::new();

    if grid == TileGrid::Hybrid {
        for row in 0..rows.saturating_sub(1) {
            for col in 0..cols.saturating_sub(1) {
                let block = [(row, col), (row, col + 1), (row + 1, col), (row + 1, col + 1)];
                if block
                    .iter()
                    .all(|&(r, c)| cells[r][c].is_some() && !claimed[r][c])
                {
                    for &(r, c) in &block {
                        claimed[r][c] = true;
                    }
                    rects.push(PlacedRect {
                        x: (col as u32 * cell) as i32,
                        y: (row as u32 * cell) as i32,
                        width: cell * 2,
                        height: cell * 2,
                        color_index: cells[row][col].unwrap_or_default(),
                        label: format!("{}cm", cell * 2),
                    });
                }
            }
        }
    }
    let tiles_large = rects.len() as u32;

    for (row, line) in cells.iter().enumerate() {
        for (col, occupant) in line.iter().enumerate() {
            let Some(index) = occupant else {
                continue;
            };
            if claimed[row][col] {
                continue;
            }
            rects.push(PlacedRect {
                x: (col as u32 * cell) as i32,
                y: (row as u32 * cell) as i32,
                width: cell,
                height: cell,
                color_index: *index,
                label: format!("{cell}cm"),
            });
        }
    }
    let tiles_small = rects.len() as u32 - tiles_large;

    if tiles_large + tiles_small == 0 {
        return None;
    }

    let unit_price = ctx.tile_price()?;
    let thickness = ctx.thickness_label();
    let used_area = u64::from(tiles_large) * u64::from(4 * cell * cell)
        + u64::from(tiles_small) * u64::from(cell * cell);

    let (label, price, breakdown, counts) = match grid {
        TileGrid::Hybrid => {
            let packs_50 = ceil_div(tiles_small, TILES_PER_PACK);
            (
                format!("Hybrid tiles - {thickness}"),
                u64::from(tiles_large + packs_50) * unit_price,
                tile_line_items(ctx, tiles_large, tiles_small),
                UnitCounts::Hybrid {
                    tiles_100: tiles_large,
                    tiles_50: tiles_small,
                    packs_50,
                },
            )
        }
        TileGrid::Single(size) => {
            let tiles = tiles_small;
            let (packs, breakdown) = match size {
                TileSize::Cm50 => {
                    let packs = ceil_div(tiles, TILES_PER_PACK);
                    (packs, tile_line_items(ctx, 0, tiles))
                }
                TileSize::Cm100 => (tiles, tile_line_items(ctx, tiles, 0)),
            };
            (
                format!("{cell}cm tiles - {thickness}"),
                u64::from(packs) * unit_price,
                breakdown,
                UnitCounts::SquareTiles {
                    size,
                    nx: cols as u32,
                    ny: rows as u32,
                    tiles,
                    packs,
                },
            )
        }
    };

    debug!(
        pieces = footprint.pieces.len(),
        ?grid,
        ?bound,
        tiles_large,
        tiles_small,
        price,
        "complex tile covering"
    );

    Some(CoverageResult {
        label,
        price,
        breakdown,
        coverage_width: footprint.width,
        coverage_height: footprint.height,
        waste_percent: waste_percent(used_area, footprint.piece_area()),
        fit_messages: Vec::new(),
        counts,
        roll_plan: None,
        shipping_memos: Vec::new(),
        visualization: complex_layout(footprint, rects),
    })
}

/// Roll covering of one strip of the union
struct StripCovering {
    strip: Strip,
    result: CoverageResult,
}

impl StripCovering {
    fn rolls(&self) -> u32 {
        match self.result.counts {
            UnitCounts::Rolls { rolls, .. } => rolls,
            _ => 0,
        }
    }

    fn roll_units(&self) -> u32 {
        match self.result.counts {
            UnitCounts::Rolls { roll_units, .. } => roll_units,
            _ => 0,
        }
    }
}

/// All strips of one sweep direction
struct SweepVariant {
    axis: SweepAxis,
    coverings: Vec<StripCovering>,
    unpriced: usize,
}

impl SweepVariant {
    fn rolls(&self) -> u32 {
        self.coverings.iter().map(StripCovering::rolls).sum()
    }

    fn price(&self) -> u64 {
        self.coverings.iter().map(|c| c.result.price).sum()
    }
}

/// Covers one strip with the roll width along either side, keeping the one with
/// fewer rolls, then the lower price, then less waste.
fn cover_strip(ctx: &PricingContext<'_>, strip: Strip, pet: bool) -> Option<StripCovering> {
    [Axis::Width, Axis::Height]
        .into_iter()
        .filter_map(|axis| cover_roll(ctx, strip.width, strip.height, pet, Some(axis)))
        .map(|result| StripCovering { strip, result })
        .min_by(|a, b| {
            a.rolls()
                .cmp(&b.rolls())
                .then_with(|| a.result.price.cmp(&b.result.price))
                .then_with(|| a.result.waste_percent.cmp(&b.result.waste_percent))
        })
}

fn cover_sweep(
    ctx: &PricingContext<'_>,
    footprint: &Footprint,
    axis: SweepAxis,
    pet: bool,
) -> SweepVariant {
    let strips = decompose(&footprint.pieces, axis);
    let mut coverings = Vec::with_capacity(strips.len());
    let mut unpriced = 0;

    for strip in strips {
        match cover_strip(ctx, strip, pet) {
            Some(covering) => coverings.push(covering),
            None => {
                warn!(?axis, ?strip, "strip could not be covered with rolls");
                unpriced += 1;
            }
        }
    }

    SweepVariant {
        axis,
        coverings,
        unpriced,
    }
}

/// Whether `candidate` should replace `current`. Prices within the configured
/// tolerance count as equal and keep `current`.
fn sweep_is_better(candidate: &SweepVariant, current: &SweepVariant, tolerance: u64) -> bool {
    if candidate.unpriced != current.unpriced {
        return candidate.unpriced < current.unpriced;
    }
    if candidate.rolls() != current.rolls() {
        return candidate.rolls() < current.rolls();
    }
    candidate.price() + tolerance < current.price()
}

/// Adds a line to `items`, merging rolls into an equal roll line already present.
fn merge_line_item(items: &mut Vec<LineItem>, item: LineItem) {
    if let LineItem::Roll {
        thickness,
        width,
        roll_length,
        count,
        split_count,
        units,
    } = &item
    {
        let existing = items.iter_mut().find_map(|existing| match existing {
            LineItem::Roll {
                thickness: t,
                width: w,
                roll_length: l,
                count: c,
                split_count: s,
                units: u,
            } if t == thickness && w == width && l == roll_length && s == split_count => {
                Some((c, u))
            }
            _ => None,
        });
        if let Some((c, u)) = existing {
            *c += count;
            if let (Some(total), Some(more)) = (u, units) {
                *total += more;
            }
            return;
        }
    }
    items.push(item);
}

fn cover_roll_strips(
    ctx: &PricingContext<'_>,
    footprint: &Footprint,
    pet: bool,
) -> Option<CoverageResult> {
    let horizontal = cover_sweep(ctx, footprint, SweepAxis::Y, pet);
    let vertical = cover_sweep(ctx, footprint, SweepAxis::X, pet);

    let tolerance = ctx.config.variant_price_tolerance;
    let variant = if sweep_is_better(&vertical, &horizontal, tolerance) {
        vertical
    } else {
        horizontal
    };
    if variant.coverings.is_empty() {
        return None;
    }
    if variant.unpriced > 0 {
        warn!(
            unpriced = variant.unpriced,
            "complex space only partly covered"
        );
    }

    let rolls = variant.rolls();
    let roll_units: u32 = variant.coverings.iter().map(StripCovering::roll_units).sum();
    let price = variant.price();
    let used_area: u64 = variant
        .coverings
        .iter()
        .map(|c| u64::from(c.result.coverage_width) * u64::from(c.result.coverage_height))
        .sum();

    let mut breakdown = Vec::new();
    let mut shipping_memos: Vec<ShippingMemo> = Vec::new();
    let mut rects = Vec::new();

    for covering in variant.coverings {
        for item in covering.result.breakdown {
            merge_line_item(&mut breakdown, item);
        }
        for memo in covering.result.shipping_memos {
            if !shipping_memos.contains(&memo) {
                shipping_memos.push(memo);
            }
        }
        if let Some(plan) = &covering.result.roll_plan {
            rects.extend(roll_stripes(
                plan,
                (covering.strip.x, covering.strip.y),
                covering.strip.piece_index,
            ));
        }
    }

    debug!(
        sweep = ?variant.axis,
        stripes = rects.len(),
        rolls,
        price,
        "complex roll covering"
    );

    Some(CoverageResult {
        label: format!("{} - {}", ctx.catalog.name, ctx.thickness_label()),
        price,
        breakdown,
        coverage_width: footprint.width,
        coverage_height: footprint.height,
        waste_percent: waste_percent(used_area, footprint.piece_area()),
        fit_messages: Vec::new(),
        counts: UnitCounts::Rolls { rolls, roll_units },
        roll_plan: None,
        shipping_memos,
        visualization: complex_layout(footprint, rects),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: u32, h: u32, index: u32) -> PieceRect {
        PieceRect { x, y, w, h, index }
    }

    fn footprint(pieces: Vec<PieceRect>) -> Footprint {
        let width = pieces.iter().map(|p| p.x as u32 + p.w).max().unwrap();
        let height = pieces.iter().map(|p| p.y as u32 + p.h).max().unwrap();
        Footprint {
            names: vec![String::new(); pieces.len()],
            pieces,
            width,
            height,
        }
    }

    #[test]
    fn test_loose_cells_need_half_a_cell_of_reach() {
        let fp = footprint(vec![rect(0, 0, 120, 100, 0)]);

        let loose = occupy_cells(&fp, 50, FitMode::Loose);
        assert_eq!(loose[0], vec![Some(0), Some(0), None]);

        let exact = occupy_cells(&fp, 50, FitMode::Exact);
        assert_eq!(exact[0], vec![Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_overlapping_cells_go_to_lowest_index() {
        let fp = footprint(vec![rect(0, 0, 100, 100, 2), rect(50, 0, 100, 100, 1)]);
        let cells = occupy_cells(&fp, 50, FitMode::Exact);
        assert_eq!(cells[0], vec![Some(2), Some(1), Some(1)]);
    }

    fn baby_roll_17() -> PriceCatalog {
        Catalog::builtin().product("baby-roll").unwrap().clone()
    }

    fn covering(rolls: u32, price: u64) -> StripCovering {
        let catalog = baby_roll_17();
        let config = EstimatorConfig::default();
        let ctx = PricingContext::new("baby-roll", "17", &catalog, &config);
        let mut result = cover_roll(&ctx, 110, 300, false, None).unwrap();
        result.price = price;
        result.counts = UnitCounts::Rolls {
            rolls,
            roll_units: rolls * 6,
        };
        StripCovering {
            strip: Strip {
                x: 0,
                y: 0,
                width: 110,
                height: 300,
                piece_index: 0,
            },
            result,
        }
    }

    fn variant(axis: SweepAxis, coverings: Vec<StripCovering>, unpriced: usize) -> SweepVariant {
        SweepVariant {
            axis,
            coverings,
            unpriced,
        }
    }

    #[test]
    fn test_tied_sweeps_keep_horizontal_strips() {
        let horizontal = variant(SweepAxis::Y, vec![covering(2, 100_000)], 0);
        let vertical = variant(SweepAxis::X, vec![covering(1, 50_000), covering(1, 50_000)], 0);
        assert!(!sweep_is_better(&vertical, &horizontal, 100));
    }

    #[test]
    fn test_fewer_rolls_beat_a_lower_price() {
        let horizontal = variant(SweepAxis::Y, vec![covering(3, 100_000)], 0);
        let vertical = variant(SweepAxis::X, vec![covering(2, 150_000)], 0);
        assert!(sweep_is_better(&vertical, &horizontal, 100));
        assert!(!sweep_is_better(&horizontal, &vertical, 100));
    }

    #[test]
    fn test_price_difference_within_tolerance_keeps_horizontal() {
        let horizontal = variant(SweepAxis::Y, vec![covering(2, 100_000)], 0);

        let close = variant(SweepAxis::X, vec![covering(2, 99_950)], 0);
        assert!(!sweep_is_better(&close, &horizontal, 100));

        let cheaper = variant(SweepAxis::X, vec![covering(2, 99_800)], 0);
        assert!(sweep_is_better(&cheaper, &horizontal, 100));
        assert!(!sweep_is_better(&cheaper, &horizontal, 500));
    }

    #[test]
    fn test_fewer_unpriced_strips_win_first() {
        let horizontal = variant(SweepAxis::Y, vec![covering(1, 20_000)], 1);
        let vertical = variant(SweepAxis::X, vec![covering(3, 300_000)], 0);
        assert!(sweep_is_better(&vertical, &horizontal, 100));
        assert!(!sweep_is_better(&horizontal, &vertical, 100));
    }

    #[test]
    fn test_l_shape_picks_cheaper_vertical_sweep() {
        let catalog = baby_roll_17();
        let config = EstimatorConfig::default();
        let ctx = PricingContext::new("baby-roll", "17", &catalog, &config);
        let fp = footprint(vec![rect(0, 0, 300, 200, 0), rect(300, 50, 100, 100, 1)]);

        // bands 300x50, 400x100, 300x50, each one roll laid across the band
        let horizontal = cover_sweep(&ctx, &fp, SweepAxis::Y, false);
        assert_eq!(horizontal.rolls(), 3);
        assert_eq!(horizontal.price(), 2 * 10_700 * 6 + 13_800 * 8);

        // 300x200 takes 70cm + 140cm rolls 3m long, 100x100 one 110cm roll
        let vertical = cover_sweep(&ctx, &fp, SweepAxis::X, false);
        assert_eq!(vertical.rolls(), 3);
        assert_eq!(vertical.price(), (10_700 + 18_200) * 6 + 13_800 * 2);

        assert!(sweep_is_better(&vertical, &horizontal, config.variant_price_tolerance));

        let result = cover_roll_strips(&ctx, &fp, false).unwrap();
        assert_eq!(result.price, vertical.price());
        assert_eq!(
            result.counts,
            UnitCounts::Rolls {
                rolls: 3,
                roll_units: 6 + 6 + 2,
            }
        );
    }

    #[test]
    fn test_oversized_footprint_has_no_tile_grid() {
        let catalog = Catalog::builtin().product("puzzle").unwrap().clone();
        let config = EstimatorConfig::default();
        let ctx = PricingContext::new("puzzle", "25", &catalog, &config);
        let fp = footprint(vec![
            rect(0, 0, 100, 100, 0),
            rect(2 * MAX_DIMENSION_CM as i32, 0, 100, 100, 1),
        ]);

        assert!(cover_tile_grid(&ctx, &fp, TileGrid::Hybrid, FitMode::Exact).is_none());
    }

    #[test]
    fn test_hundred_tiles_use_a_hundred_grid() {
        let catalog = Catalog::builtin().product("puzzle").unwrap().clone();
        let config = EstimatorConfig::default();
        let ctx = PricingContext::new("puzzle", "25", &catalog, &config);
        let fp = footprint(vec![rect(0, 0, 200, 100, 0), rect(200, 0, 50, 100, 1)]);

        let result =
            cover_tile_grid(&ctx, &fp, TileGrid::Single(TileSize::Cm100), FitMode::Exact).unwrap();
        assert_eq!(
            result.counts,
            UnitCounts::SquareTiles {
                size: TileSize::Cm100,
                nx: 3,
                ny: 1,
                tiles: 3,
                packs: 3,
            }
        );
        assert_eq!(result.price, 3 * 17_900);
        assert!(result.visualization.rects.iter().all(|r| r.width == 100));
    }

    #[test]
    fn test_merge_line_item_sums_equal_rolls() {
        let roll = |count| LineItem::Roll {
            thickness: "17T".to_string(),
            width: 110,
            roll_length: 300,
            count,
            split_count: 1,
            units: Some(6 * count),
        };
        let mut items = Vec::new();
        merge_line_item(&mut items, roll(1));
        merge_line_item(&mut items, roll(2));
        assert_eq!(items, vec![roll(3)]);
    }
}
