use super::*;

impl Estimator {
    /// Totals prices and purchased units over the priced spaces.
    pub(super) fn calculate_summary(&self, spaces: &[SpaceEstimate]) -> Summary {
        let mut summary = Summary::default();

        for space in spaces {
            let result = &space.result;
            summary.active_spaces += 1;
            summary.total_price += result.price;

            match result.counts {
                UnitCounts::SquareTiles {
                    size: TileSize::Cm100,
                    packs,
                    ..
                } => summary.tiles_100 += packs,
                UnitCounts::SquareTiles {
                    size: TileSize::Cm50,
                    packs,
                    ..
                } => summary.packs_50 += packs,
                UnitCounts::Hybrid {
                    tiles_100,
                    packs_50,
                    ..
                } => {
                    summary.tiles_100 += tiles_100;
                    summary.packs_50 += packs_50;
                }
                UnitCounts::Rolls { rolls, roll_units } => {
                    summary.total_rolls += rolls;
                    summary.total_roll_units += roll_units;
                }
            }

            if result.fit_messages.iter().any(FitMessage::needs_trim) {
                summary.spaces_needing_trim += 1;
            }
            if result.fit_messages.iter().any(FitMessage::leaves_gap) {
                summary.spaces_with_gap += 1;
            }

            summary
                .shipping_memos
                .extend(result.shipping_memos.iter().cloned());
        }

        debug!(
            product = %self.request.product,
            spaces = summary.active_spaces,
            total_price = summary.total_price,
            "estimate summary"
        );

        summary
    }
}
