//! Integer rounding, fit messages and rectangle-union decomposition.

use crate::config::MAX_DIMENSION_CM;
use crate::types::{Axis, FitContext, FitMessage, Piece, PlacedPiece};

/// Integer division rounding up. `b` is a positive unit length.
pub fn ceil_div(a: u32, b: u32) -> u32 {
    a.div_ceil(b)
}

/// Integer division rounding down. `b` is a positive unit length.
pub fn floor_div(a: u32, b: u32) -> u32 {
    a / b
}

/// Normalizes user input to a whole number of centimeters in `0..=MAX_DIMENSION_CM`.
pub fn clamp_dimension(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.trunc().min(f64::from(MAX_DIMENSION_CM)) as u32
}

/// Normalizes a position, which may be negative, to whole centimeters within
/// `MAX_DIMENSION_CM` of the origin.
pub fn clamp_coordinate(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let max = f64::from(MAX_DIMENSION_CM);
    value.trunc().clamp(-max, max) as i32
}

/// Whether a rectangle is small enough for the coverage engines.
pub fn within_dimension_limit(width: u32, height: u32) -> bool {
    width <= MAX_DIMENSION_CM && height <= MAX_DIMENSION_CM
}

/// Percentage of the used area that is not needed, rounded half up.
/// Negative when the covering is smaller than the requested area.
pub fn waste_percent(used_area: u64, actual_area: u64) -> i32 {
    if used_area == 0 {
        return 0;
    }
    let ratio = (used_area as f64 - actual_area as f64) / used_area as f64 * 100.0;
    (ratio + 0.5).floor() as i32
}

/// Compares a covering against the requested rectangle, one message per axis
/// that differs, or a single exact-fit message.
pub fn fit_messages(
    actual_width: u32,
    actual_height: u32,
    coverage_width: u32,
    coverage_height: u32,
    context: FitContext,
) -> Vec<FitMessage> {
    let mut messages = Vec::with_capacity(2);

    for (axis, actual, coverage) in [
        (Axis::Width, actual_width, coverage_width),
        (Axis::Height, actual_height, coverage_height),
    ] {
        if coverage > actual {
            messages.push(FitMessage::TrimRequired {
                axis,
                delta: coverage - actual,
            });
        } else if coverage < actual {
            messages.push(FitMessage::GapRemaining {
                axis,
                delta: actual - coverage,
                context,
            });
        }
    }

    if messages.is_empty() {
        messages.push(FitMessage::ExactFit);
    }
    messages
}

/// A normalized piece of a complex footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub index: u32,
}

impl PieceRect {
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }

    fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.w)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.h)
    }
}

/// The pieces of a complex space, re-based so the bounding box starts at the origin.
/// Pieces with a zero dimension are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub pieces: Vec<PieceRect>,
    pub names: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub fn from_pieces(pieces: &[Piece]) -> Option<Self> {
        let mut rects = Vec::new();
        let mut names = Vec::new();

        for (position, piece) in pieces.iter().enumerate() {
            let rect = PieceRect {
                x: clamp_coordinate(piece.x),
                y: clamp_coordinate(piece.y),
                w: clamp_dimension(piece.w),
                h: clamp_dimension(piece.h),
                index: piece.index.unwrap_or(position as u32),
            };
            if rect.w > 0 && rect.h > 0 {
                rects.push(rect);
                names.push(piece.name.clone());
            }
        }

        let min_x = rects.iter().map(|r| i64::from(r.x)).min()?;
        let min_y = rects.iter().map(|r| i64::from(r.y)).min()?;
        let max_x = rects.iter().map(PieceRect::right).max()?;
        let max_y = rects.iter().map(PieceRect::bottom).max()?;

        for rect in &mut rects {
            rect.x = (i64::from(rect.x) - min_x) as i32;
            rect.y = (i64::from(rect.y) - min_y) as i32;
        }

        Some(Self {
            pieces: rects,
            names,
            width: u32::try_from(max_x - min_x).ok()?,
            height: u32::try_from(max_y - min_y).ok()?,
        })
    }

    /// Sum of piece areas, overlaps counted twice
    pub fn piece_area(&self) -> u64 {
        self.pieces.iter().map(PieceRect::area).sum()
    }

    pub fn placed_pieces(&self) -> Vec<PlacedPiece> {
        self.pieces
            .iter()
            .zip(&self.names)
            .map(|(rect, name)| PlacedPiece {
                name: name.clone(),
                x: rect.x,
                y: rect.y,
                width: rect.w,
                height: rect.h,
                index: rect.index,
            })
            .collect()
    }
}

/// Direction in which the union of pieces is cut into strips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAxis {
    /// Vertical strips between consecutive x edges
    X,
    /// Horizontal bands between consecutive y edges
    Y,
}

/// Output rectangle of a sweep, tagged with the lowest index of the pieces it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub piece_index: u32,
}

impl Strip {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Splits the union of `pieces` into disjoint rectangles. Edges along the sweep axis
/// form strips; inside each strip the cross intervals of the covering pieces are merged
/// into maximal runs, one rectangle per run.
pub fn decompose(pieces: &[PieceRect], axis: SweepAxis) -> Vec<Strip> {
    // (along_start, along_end, across_start, across_end, index)
    let spans: Vec<(i64, i64, i64, i64, u32)> = pieces
        .iter()
        .filter(|p| p.w > 0 && p.h > 0)
        .map(|p| match axis {
            SweepAxis::X => (i64::from(p.x), p.right(), i64::from(p.y), p.bottom(), p.index),
            SweepAxis::Y => (i64::from(p.y), p.bottom(), i64::from(p.x), p.right(), p.index),
        })
        .collect();

    let mut edges: Vec<i64> = spans.iter().flat_map(|s| [s.0, s.1]).collect();
    edges.sort_unstable();
    edges.dedup();

    let mut strips = Vec::new();
    for pair in edges.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        let mut intervals: Vec<(i64, i64, u32)> = spans
            .iter()
            .filter(|s| s.0 <= start && s.1 >= end)
            .map(|s| (s.2, s.3, s.4))
            .collect();
        if intervals.is_empty() {
            continue;
        }
        intervals.sort_unstable();

        let mut runs: Vec<(i64, i64, u32)> = Vec::new();
        for (lo, hi, index) in intervals {
            match runs.last_mut() {
                Some(run) if lo <= run.1 => {
                    run.1 = run.1.max(hi);
                    run.2 = run.2.min(index);
                }
                _ => runs.push((lo, hi, index)),
            }
        }

        for (lo, hi, index) in runs {
            if hi <= lo {
                continue;
            }
            let (along, across) = ((end - start) as u32, (hi - lo) as u32);
            strips.push(match axis {
                SweepAxis::X => Strip {
                    x: start as i32,
                    y: lo as i32,
                    width: along,
                    height: across,
                    piece_index: index,
                },
                SweepAxis::Y => Strip {
                    x: lo as i32,
                    y: start as i32,
                    width: across,
                    height: along,
                    piece_index: index,
                },
            });
        }
    }

    strips
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rect(x: i32, y: i32, w: u32, h: u32, index: u32) -> PieceRect {
        PieceRect { x, y, w, h, index }
    }

    /// Union area by counting 10cm cells, every test coordinate is a multiple of 10.
    fn union_area(pieces: &[PieceRect]) -> u64 {
        let mut cells = HashSet::new();
        for p in pieces {
            for cx in (p.x..p.x + p.w as i32).step_by(10) {
                for cy in (p.y..p.y + p.h as i32).step_by(10) {
                    cells.insert((cx, cy));
                }
            }
        }
        cells.len() as u64 * 100
    }

    #[test]
    fn test_rounding_division() {
        assert_eq!(ceil_div(0, 50), 0);
        assert_eq!(ceil_div(1, 50), 1);
        assert_eq!(ceil_div(100, 50), 2);
        assert_eq!(ceil_div(101, 50), 3);
        assert_eq!(floor_div(99, 50), 1);
        assert_eq!(floor_div(49, 50), 0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_dimension(-5.0), 0);
        assert_eq!(clamp_dimension(f64::NAN), 0);
        assert_eq!(clamp_dimension(123.9), 123);
        assert_eq!(clamp_coordinate(-40.7), -40);
        assert_eq!(clamp_coordinate(f64::INFINITY), 0);
        assert_eq!(clamp_dimension(1e12), MAX_DIMENSION_CM);
        assert_eq!(clamp_coordinate(-2e9), -(MAX_DIMENSION_CM as i32));
    }

    #[test]
    fn test_waste_percent_rounds_half_up() {
        assert_eq!(waste_percent(0, 100), 0);
        assert_eq!(waste_percent(200, 100), 50);
        assert_eq!(waste_percent(80_000, 76_000), 5);
        assert_eq!(waste_percent(60_000, 64_000), -7);
    }

    #[test]
    fn test_fit_messages_trim_on_both_axes() {
        let messages = fit_messages(300, 200, 320, 220, FitContext::Tile);
        assert_eq!(
            messages,
            vec![
                FitMessage::TrimRequired {
                    axis: Axis::Width,
                    delta: 20
                },
                FitMessage::TrimRequired {
                    axis: Axis::Height,
                    delta: 20
                },
            ]
        );
    }

    #[test]
    fn test_fit_messages_exact_and_mixed() {
        assert_eq!(
            fit_messages(300, 200, 300, 200, FitContext::Tile),
            vec![FitMessage::ExactFit]
        );

        let mixed = fit_messages(320, 200, 300, 250, FitContext::Roll);
        assert_eq!(mixed.len(), 2);
        assert!(mixed[0].leaves_gap());
        assert!(mixed[1].needs_trim());
        assert_eq!(mixed[0].to_string(), "Mat is short by 20cm along the width");
    }

    #[test]
    fn test_footprint_rebases_negative_positions() {
        let pieces = vec![
            Piece {
                id: "a".into(),
                name: "living".into(),
                x: -100.0,
                y: -50.0,
                w: 200.0,
                h: 100.0,
                index: None,
            },
            Piece {
                id: "b".into(),
                name: "hall".into(),
                x: 100.0,
                y: 0.0,
                w: 100.0,
                h: 200.0,
                index: None,
            },
            Piece {
                id: "c".into(),
                name: "ignored".into(),
                x: 900.0,
                y: 900.0,
                w: 0.0,
                h: 50.0,
                index: None,
            },
        ];

        let footprint = Footprint::from_pieces(&pieces).unwrap();
        assert_eq!(footprint.width, 300);
        assert_eq!(footprint.height, 250);
        assert_eq!(footprint.pieces[0], rect(0, 0, 200, 100, 0));
        assert_eq!(footprint.pieces[1], rect(200, 50, 100, 200, 1));
        assert_eq!(footprint.names, vec!["living", "hall"]);
    }

    #[test]
    fn test_footprint_of_distant_pieces_stays_bounded() {
        let piece = |x: f64| Piece {
            id: String::new(),
            name: String::new(),
            x,
            y: 0.0,
            w: 1e10,
            h: 100.0,
            index: None,
        };

        let footprint = Footprint::from_pieces(&[piece(-2e9), piece(2e9)]).unwrap();
        assert_eq!(footprint.width, 3 * MAX_DIMENSION_CM);
        assert_eq!(footprint.height, 100);
        assert_eq!(footprint.pieces[1].x, 2 * MAX_DIMENSION_CM as i32);
    }

    #[test]
    fn test_sweeps_of_l_shape() {
        let pieces = [rect(0, 0, 300, 200, 0), rect(300, 50, 100, 100, 1)];

        let vertical = decompose(&pieces, SweepAxis::X);
        let horizontal = decompose(&pieces, SweepAxis::Y);

        assert_eq!(vertical.len(), 2);
        assert_eq!(horizontal.len(), 3);
        assert_eq!(
            horizontal[1],
            Strip {
                x: 0,
                y: 50,
                width: 400,
                height: 100,
                piece_index: 0
            }
        );
    }

    #[test]
    fn test_sweeps_conserve_union_area_with_overlaps() {
        let layouts = [
            vec![rect(0, 0, 300, 200, 0), rect(300, 50, 100, 100, 1)],
            vec![rect(0, 0, 200, 200, 1), rect(100, 100, 200, 200, 0)],
            vec![
                rect(0, 0, 400, 100, 0),
                rect(150, 0, 100, 300, 1),
                rect(-50, 250, 500, 60, 2),
            ],
            vec![rect(0, 0, 100, 100, 0), rect(200, 200, 100, 100, 1)],
            vec![rect(10, 10, 80, 80, 0), rect(10, 10, 80, 80, 1)],
        ];

        for pieces in &layouts {
            let expected = union_area(pieces);
            for axis in [SweepAxis::X, SweepAxis::Y] {
                let strips = decompose(pieces, axis);
                let total: u64 = strips.iter().map(Strip::area).sum();
                assert_eq!(total, expected, "{axis:?} sweep of {pieces:?}");
            }
        }
    }

    #[test]
    fn test_overlap_keeps_lowest_index() {
        let pieces = [rect(0, 0, 200, 100, 3), rect(0, 0, 200, 100, 1)];
        let strips = decompose(&pieces, SweepAxis::Y);
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].piece_index, 1);
    }
}
