use matcalc_core::{Catalog, EstimateRequest, Estimator, FitMessage, UnitCounts};
use pretty_assertions::assert_eq;

fn estimate(json: &str) -> matcalc_core::Estimate {
    let request: EstimateRequest = serde_json::from_str(json).unwrap();
    Estimator::new(request, &Catalog::builtin())
        .unwrap()
        .estimate()
}

#[test]
fn test_tile_request_from_json() {
    let estimate = estimate(
        r#"{
            "product": "puzzle",
            "thickness": "25plus",
            "spaces": [
                {"name": "living room", "width": 300, "height": 200,
                 "product_type": "tile-square-100", "calc_mode": "exact"},
                {"name": "hall", "width": 280, "height": 180,
                 "product_type": "hybrid-tile"}
            ]
        }"#,
    );

    assert_eq!(estimate.spaces.len(), 2);

    let living = &estimate.spaces[0].result;
    assert_eq!(living.label, "100cm tiles - 25T Plus+");
    assert_eq!(living.price, 6 * 22_800);
    assert_eq!(living.fit_messages, vec![FitMessage::ExactFit]);

    // auto: loose tiling falls 30cm short on both axes, so both round up
    let hall = &estimate.spaces[1].result;
    assert_eq!(
        hall.counts,
        UnitCounts::Hybrid {
            tiles_100: 2,
            tiles_50: 16,
            packs_50: 4,
        }
    );
    assert_eq!((hall.coverage_width, hall.coverage_height), (300, 200));
    assert!(hall.fit_messages.iter().all(FitMessage::needs_trim));

    assert_eq!(estimate.summary.total_price, (6 + 2 + 4) * 22_800);
    assert_eq!(estimate.summary.spaces_needing_trim, 1);
    assert_eq!(
        estimate.summary.fit_note().as_deref(),
        Some("trimming needed: 1")
    );
}

#[test]
fn test_complex_pet_roll_request() {
    let estimate = estimate(
        r#"{
            "product": "pet-roll",
            "thickness": "9",
            "spaces": [{
                "name": "ground floor",
                "product_type": "roll-pet",
                "calc_mode": "exact",
                "pieces": [
                    {"name": "living", "x": 0, "y": 0, "w": 300, "h": 200},
                    {"name": "nook", "x": 300, "y": 50, "w": 100, "h": 100}
                ]
            }]
        }"#,
    );

    let space = &estimate.spaces[0];
    assert_eq!((space.width, space.height), (400, 200));
    assert!(!space.result.shipping_memos.is_empty());
    assert!(!estimate.summary.shipping_memos.is_empty());
    assert!(estimate.summary.total_rolls > 0);
    assert_eq!(estimate.summary.total_price, space.result.price);
}

#[test]
fn test_result_serializes_tagged_variants() {
    let estimate = estimate(
        r#"{
            "product": "baby-roll",
            "thickness": "17",
            "spaces": [{"width": 110, "height": 300, "product_type": "roll-baby"}]
        }"#,
    );

    let value = serde_json::to_value(&estimate).unwrap();
    let result = &value["spaces"][0]["result"];
    assert_eq!(value["spaces"][0]["product_type"], "roll-baby");
    assert_eq!(result["breakdown"][0]["kind"], "roll");
    assert_eq!(result["counts"]["kind"], "rolls");
    assert_eq!(result["fit_messages"][0]["kind"], "exact_fit");
    assert_eq!(result["visualization"]["width_axis"], "width");
}
