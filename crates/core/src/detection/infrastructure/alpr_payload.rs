use serde::Deserialize;

use crate::detection::domain::detection_error::DetectionError;
use crate::shared::plate_region::PlateRegion;

#[derive(Deserialize)]
struct AlprPayload {
    #[serde(default)]
    plates: Vec<PlatePayload>,
}

#[derive(Deserialize)]
struct PlatePayload {
    #[serde(rename = "warpedBox", default)]
    warped_box: Vec<f64>,
}

/// Extracts plate polygons from the engine's JSON result.
///
/// Each plate's `warpedBox` is a flat `[x0, y0, x1, y1, ...]` list. Boxes
/// that cannot form a polygon are dropped with a warning; the remaining
/// plates are still returned.
pub fn parse_plate_regions(json: &str) -> Result<Vec<PlateRegion>, DetectionError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let payload: AlprPayload =
        serde_json::from_str(json).map_err(|e| DetectionError::Payload(e.to_string()))?;

    let mut regions = Vec::with_capacity(payload.plates.len());
    for (i, plate) in payload.plates.iter().enumerate() {
        match PlateRegion::from_flat(&plate.warped_box) {
            Some(region) => regions.push(region),
            None => log::warn!(
                "Ignoring plate {i}: warpedBox has {} values",
                plate.warped_box.len()
            ),
        }
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::plate_region::Point;

    #[test]
    fn test_parses_vendor_style_payload() {
        let json = r#"{
            "duration": 12,
            "frame_id": 0,
            "plates": [
                {
                    "confidences": [90.1, 99.8],
                    "text": "3PEDLM4",
                    "warpedBox": [10.0, 20.0, 60.0, 20.0, 60.0, 40.0, 10.0, 40.0]
                },
                {
                    "warpedBox": [100, 100, 150, 100, 150, 120, 100, 120]
                }
            ]
        }"#;
        let regions = parse_plate_regions(json).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].points()[2], Point::new(60.0, 40.0));
        assert_eq!(regions[1].points().len(), 4);
    }

    #[test]
    fn test_empty_string_means_no_plates() {
        assert!(parse_plate_regions("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_plates_key_means_no_plates() {
        assert!(parse_plate_regions(r#"{ "duration": 3 }"#).unwrap().is_empty());
    }

    #[test]
    fn test_odd_length_box_is_skipped() {
        let json = r#"{ "plates": [
            { "warpedBox": [1, 2, 3] },
            { "warpedBox": [0, 0, 10, 0, 10, 10] }
        ] }"#;
        let regions = parse_plate_regions(json).unwrap();
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_payload_error() {
        let err = parse_plate_regions("{ plates: ").unwrap_err();
        assert!(matches!(err, DetectionError::Payload(_)));
    }
}
