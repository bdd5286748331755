use super::*;

fn visualization(
    kind: VisualKind,
    space: Extent,
    coverage: Extent,
    rects: Vec<PlacedRect>,
) -> Visualization {
    Visualization {
        kind,
        space,
        coverage,
        pieces: Vec::new(),
        rects,
        width_axis: None,
        grid_minor: GRID_MINOR_CM,
        grid_major: GRID_MAJOR_CM,
    }
}

fn tile_rect(x: u32, y: u32, size: u32, color_index: u32) -> PlacedRect {
    PlacedRect {
        x: x as i32,
        y: y as i32,
        width: size,
        height: size,
        color_index,
        label: format!("{size}cm"),
    }
}

/// Tiles laid in a grid from the top left corner.
fn tile_grid(
    origin_x: u32,
    origin_y: u32,
    cols: u32,
    rows: u32,
    size: u32,
    color_index: u32,
) -> Vec<PlacedRect> {
    (0..rows)
        .flat_map(|row| {
            (0..cols).map(move |col| {
                tile_rect(origin_x + col * size, origin_y + row * size, size, color_index)
            })
        })
        .collect()
}

pub(super) fn square_tile_layout(space: Extent, coverage: Extent, tile: u32) -> Visualization {
    let rects = tile_grid(0, 0, coverage.width / tile, coverage.height / tile, tile, 0);
    visualization(VisualKind::Tiles, space, coverage, rects)
}

/// The 100cm block in the top left, 50cm tiles in the right strip, the bottom
/// strip and the corner between them.
pub(super) fn hybrid_layout(space: Extent, plan: &HybridPlan) -> Visualization {
    let block = Extent {
        width: plan.n100x * 100,
        height: plan.n100y * 100,
    };

    let mut rects = tile_grid(0, 0, plan.n100x, plan.n100y, 100, 0);
    if plan.n100y > 0 {
        rects.extend(tile_grid(block.width, 0, plan.remainder_cols, plan.n100y * 2, 50, 1));
    }
    if plan.n100x > 0 {
        rects.extend(tile_grid(0, block.height, plan.n100x * 2, plan.remainder_rows, 50, 1));
    }
    rects.extend(tile_grid(
        block.width,
        block.height,
        plan.remainder_cols,
        plan.remainder_rows,
        50,
        1,
    ));

    let coverage = if plan.tiles_100 + plan.tiles_50 > 0 {
        plan.coverage()
    } else {
        Extent::default()
    };
    visualization(VisualKind::Tiles, space, coverage, rects)
}

/// One rectangle per physical roll of `plan`, placed side by side across the
/// width axis and end to end along the length, offset by `origin`.
pub(super) fn roll_stripes(
    plan: &RollPlan,
    origin: (i32, i32),
    color_index: u32,
) -> Vec<PlacedRect> {
    let mut stripes = Vec::new();
    let mut across = 0u32;

    for solution in &plan.combination.solutions {
        for _ in 0..solution.count {
            for split in 0..plan.split_count {
                let along = split * plan.roll_length;
                let (x, y, width, height) = match plan.width_axis {
                    Axis::Width => (across, along, solution.width, plan.roll_length),
                    Axis::Height => (along, across, plan.roll_length, solution.width),
                };
                stripes.push(PlacedRect {
                    x: origin.0 + x as i32,
                    y: origin.1 + y as i32,
                    width,
                    height,
                    color_index,
                    label: format!("{}×{}cm", solution.width, plan.roll_length),
                });
            }
            across += solution.width;
        }
    }

    stripes
}

pub(super) fn roll_layout(space: Extent, coverage: Extent, plan: &RollPlan) -> Visualization {
    Visualization {
        width_axis: Some(plan.width_axis),
        ..visualization(VisualKind::Rolls, space, coverage, roll_stripes(plan, (0, 0), 0))
    }
}

pub(super) fn complex_layout(footprint: &Footprint, rects: Vec<PlacedRect>) -> Visualization {
    let extent = Extent {
        width: footprint.width,
        height: footprint.height,
    };
    Visualization {
        pieces: footprint.placed_pieces(),
        ..visualization(VisualKind::Complex, extent, extent, rects)
    }
}
