use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::EstimatorConfig;

/// Side length of a square tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileSize {
    Cm50,
    Cm100,
}

impl TileSize {
    pub fn cm(self) -> u32 {
        match self {
            TileSize::Cm50 => 50,
            TileSize::Cm100 => 100,
        }
    }
}

/// What a space is covered with. Serialized as the product tag strings
/// (`tile-square-50`, `tile-square-100`, `hybrid-tile`, `roll-baby`, `roll-pet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProductKind {
    SquareTile(TileSize),
    /// 100cm tiles first, remainder filled with 50cm tiles
    HybridTile,
    /// Cut-to-length roll goods. Pet rolls are cut to order and carry a shipping memo.
    RollMat { pet: bool },
}

impl ProductKind {
    pub fn is_roll(self) -> bool {
        matches!(self, ProductKind::RollMat { .. })
    }

    pub fn tag(self) -> &'static str {
        match self {
            ProductKind::SquareTile(TileSize::Cm50) => "tile-square-50",
            ProductKind::SquareTile(TileSize::Cm100) => "tile-square-100",
            ProductKind::HybridTile => "hybrid-tile",
            ProductKind::RollMat { pet: false } => "roll-baby",
            ProductKind::RollMat { pet: true } => "roll-pet",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tile-square-50" => Ok(ProductKind::SquareTile(TileSize::Cm50)),
            "tile-square-100" => Ok(ProductKind::SquareTile(TileSize::Cm100)),
            "hybrid-tile" => Ok(ProductKind::HybridTile),
            "roll-baby" => Ok(ProductKind::RollMat { pet: false }),
            "roll-pet" => Ok(ProductKind::RollMat { pet: true }),
            other => Err(format!("unknown product type '{other}'")),
        }
    }
}

impl TryFrom<String> for ProductKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProductKind> for String {
    fn from(kind: ProductKind) -> Self {
        kind.tag().to_string()
    }
}

/// Feasibility policy of a tile covering. Roll coverings resolve the same way
/// in every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcMode {
    /// Never exceed the space, gaps allowed
    Loose,
    /// Never leave a gap, overshoot allowed
    Exact,
    #[default]
    Auto,
}

impl CalcMode {
    /// The bound used by engines without an auto heuristic
    pub fn bound(self) -> FitMode {
        match self {
            CalcMode::Exact => FitMode::Exact,
            CalcMode::Loose | CalcMode::Auto => FitMode::Loose,
        }
    }
}

/// Axis of a rectangle. Also names which side of a space the roll width runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

/// One rectangle of a complex space's footprint, as entered by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    /// Overlap priority, lower wins. Defaults to the position in the piece list.
    #[serde(default)]
    pub index: Option<u32>,
}

/// A space the customer wants covered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub product_type: ProductKind,
    #[serde(default)]
    pub calc_mode: CalcMode,
    #[serde(default)]
    pub pieces: Vec<Piece>,
}

/// Input: what the frontend provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// Catalog product id, e.g. `puzzle` or `baby-roll`
    pub product: String,
    pub thickness: String,
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub config: EstimatorConfig,
}

/// A roll width and how many rolls of it run side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidthCount {
    pub width: u32,
    pub count: u32,
}

/// Hard bound a covering is computed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Loose,
    Exact,
}

/// Candidate set of at most two distinct roll widths covering a target width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthCombination {
    pub mode: FitMode,
    pub solutions: Vec<WidthCount>,
    pub total_width: u32,
    /// Signed difference to the target, negative is a shortfall
    pub waste: i64,
    pub waste_percent: f64,
    pub roll_count: u32,
    /// Average catalog priority of the widths involved, lower is preferred
    pub priority: f64,
    pub same_width: bool,
    #[serde(default)]
    pub preferred: bool,
}

/// Which kind of covering a gap message comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitContext {
    Tile,
    Roll,
}

/// How a covering relates to the requested rectangle along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitMessage {
    ExactFit,
    TrimRequired {
        axis: Axis,
        delta: u32,
    },
    GapRemaining {
        axis: Axis,
        delta: u32,
        context: FitContext,
    },
}

impl FitMessage {
    pub fn needs_trim(&self) -> bool {
        matches!(self, FitMessage::TrimRequired { .. })
    }

    pub fn leaves_gap(&self) -> bool {
        matches!(self, FitMessage::GapRemaining { .. })
    }
}

impl fmt::Display for FitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMessage::ExactFit => write!(f, "Exact fit, no trimming needed"),
            FitMessage::TrimRequired { axis, delta } => {
                write!(f, "Trim required: {delta}cm along the {axis}")
            }
            FitMessage::GapRemaining {
                axis,
                delta,
                context: FitContext::Tile,
            } => write!(f, "{delta}cm of space left over along the {axis}"),
            FitMessage::GapRemaining {
                axis,
                delta,
                context: FitContext::Roll,
            } => write!(f, "Mat is short by {delta}cm along the {axis}"),
        }
    }
}

/// One purchasable line of a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    Tiles100 {
        thickness: String,
        pieces: u32,
    },
    TilePacks50 {
        thickness: String,
        packs: u32,
        /// Tiles actually laid, may be fewer than `packs * 4`
        tiles: u32,
    },
    Roll {
        thickness: String,
        width: u32,
        roll_length: u32,
        count: u32,
        split_count: u32,
        /// Number of 50cm units, set for rolls sold per unit length
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<u32>,
    },
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItem::Tiles100 { thickness, pieces } => {
                write!(f, "{thickness} 100×100cm 1pcs: {pieces}")
            }
            LineItem::TilePacks50 {
                thickness,
                packs,
                tiles,
            } => {
                if *tiles == packs * 4 {
                    write!(f, "{thickness} 50×50cm 4pcs: {packs}")
                } else {
                    write!(f, "{thickness} 50×50cm 4pcs: {packs} ({tiles} tiles used)")
                }
            }
            LineItem::Roll {
                thickness,
                width,
                roll_length,
                count,
                split_count,
                units: Some(units),
            } => write!(
                f,
                "{thickness} - {width}cm × 50cm × {units} ({roll_length}cm × {})",
                count * split_count
            ),
            LineItem::Roll {
                thickness,
                width,
                roll_length,
                count,
                split_count,
                units: None,
            } => {
                if *split_count > 1 {
                    write!(
                        f,
                        "{thickness} - {width}cm × {roll_length}cm × {count} × {split_count} rolls"
                    )
                } else {
                    write!(f, "{thickness} - {width}cm × {roll_length}cm × {count}")
                }
            }
        }
    }
}

/// A cut-to-order request for one roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRequest {
    pub width: u32,
    pub length: u32,
    pub rolls: u32,
}

/// Shipping memo attached to cut-to-order roll purchases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMemo {
    pub cuts: Vec<CutRequest>,
}

impl fmt::Display for ShippingMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shipping memo: please cut ")?;
        for (i, cut) in self.cuts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{}cm wide {} × {} rolls",
                cut.width,
                format_meters(cut.length),
                cut.rolls
            )?;
        }
        Ok(())
    }
}

/// Formats a centimeter length as meters, `250` → `2.5m`
pub fn format_meters(cm: u32) -> String {
    if cm % 100 == 0 {
        format!("{}m", cm / 100)
    } else if cm % 10 == 0 {
        format!("{}.{}m", cm / 100, (cm % 100) / 10)
    } else {
        format!("{}.{:02}m", cm / 100, cm % 100)
    }
}

/// Width and height of an area in cm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// A placed tile or roll stripe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Index of the originating piece, used for coloring
    pub color_index: u32,
    pub label: String,
}

/// A piece re-based so the footprint's bounding box starts at the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Tiles,
    Rolls,
    Complex,
}

/// Geometry a renderer needs to draw a space's layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub kind: VisualKind,
    pub space: Extent,
    pub coverage: Extent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pieces: Vec<PlacedPiece>,
    pub rects: Vec<PlacedRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_axis: Option<Axis>,
    pub grid_minor: u32,
    pub grid_major: u32,
}

/// Purchased unit counts, by product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitCounts {
    SquareTiles {
        size: TileSize,
        nx: u32,
        ny: u32,
        tiles: u32,
        /// Purchased units: 4-packs for 50cm tiles, single pieces for 100cm tiles
        packs: u32,
    },
    Hybrid {
        tiles_100: u32,
        tiles_50: u32,
        packs_50: u32,
    },
    Rolls {
        rolls: u32,
        roll_units: u32,
    },
}

/// How a simple rectangle is covered with rolls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollPlan {
    pub width_axis: Axis,
    pub target_width: u32,
    pub target_length: u32,
    /// Length after 50cm rounding, before splitting
    pub calculated_length: u32,
    /// Length of each physical roll
    pub roll_length: u32,
    pub split_count: u32,
    pub used_width: u32,
    pub combination: WidthCombination,
}

/// Output of an engine for one rectangle or complex space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub label: String,
    pub price: u64,
    pub breakdown: Vec<LineItem>,
    pub coverage_width: u32,
    pub coverage_height: u32,
    pub waste_percent: i32,
    pub fit_messages: Vec<FitMessage>,
    pub counts: UnitCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_plan: Option<RollPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shipping_memos: Vec<ShippingMemo>,
    pub visualization: Visualization,
}

/// Result for one space of the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceEstimate {
    pub index: usize,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub product_type: ProductKind,
    pub calc_mode: CalcMode,
    pub result: CoverageResult,
}

/// Totals over all priced spaces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub active_spaces: u32,
    pub total_price: u64,
    pub tiles_100: u32,
    pub packs_50: u32,
    pub total_rolls: u32,
    pub total_roll_units: u32,
    pub spaces_needing_trim: u32,
    pub spaces_with_gap: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shipping_memos: Vec<ShippingMemo>,
}

impl Summary {
    /// One-line fit category over all spaces, `None` when nothing was priced
    pub fn fit_note(&self) -> Option<String> {
        if self.active_spaces == 0 {
            return None;
        }
        let mut parts = Vec::new();
        if self.spaces_needing_trim > 0 {
            parts.push(format!("trimming needed: {}", self.spaces_needing_trim));
        }
        if self.spaces_with_gap > 0 {
            parts.push(format!("gap left: {}", self.spaces_with_gap));
        }
        if parts.is_empty() {
            Some("Every space fits exactly.".to_string())
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Output: what the estimator returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub product: String,
    pub thickness: String,
    pub spaces: Vec<SpaceEstimate>,
    pub summary: Summary,
}

/// Error type for estimation
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("Unknown product '{0}'")]
    UnknownProduct(String),

    #[error("Product '{product}' has no thickness '{thickness}'")]
    UnknownThickness { product: String, thickness: String },

    #[error("Product '{product}' cannot price spaces of type {kind}")]
    UnsupportedProduct { product: String, kind: ProductKind },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
