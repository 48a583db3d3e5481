// End-to-end pipeline runs against a scripted detector. The page image
// encodes each column's position in its red channel, so the detector can
// recover which crop it was handed and answer in that crop's local frame,
// the same way a real collaborator answers relative to the tile it sees.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use plan_vision::detector::{DetectionQuery, Detector, DetectorError};
use plan_vision::pipeline::{DetectionHints, PipelineConfig, PlanPipeline};
use std::sync::{Arc, Mutex};

// The simulated object sits at page pixels x 1600..1800, y 10..90, inside
// the 3000x100 test page. With 1500px tiles and 300px overlap the page
// splits into tiles at offsets 0, 1200 and 1500: the first tile cannot see
// the object, the other two both can and will report it.
const OBJECT_LEFT: f64 = 1600.0;
const OBJECT_RIGHT: f64 = 1800.0;
const PAGE_WIDTH: u32 = 3000;
const PAGE_HEIGHT: u32 = 100;

/// Builds the wide test page with the column position encoded per pixel.
fn position_coded_page() -> DynamicImage {
    let mut page = RgbaImage::new(PAGE_WIDTH, PAGE_HEIGHT);
    for (x, _y, pixel) in page.enumerate_pixels_mut() {
        *pixel = Rgba([(x / 12) as u8, 0, 0, 255]);
    }
    DynamicImage::ImageRgba8(page)
}

struct ScriptedDetector {
    /// Tile offset whose calls are rejected outright, if any.
    fail_at_offset: Option<u32>,
    /// Offsets of every crop seen, shared with the test body.
    calls: Arc<Mutex<Vec<u32>>>,
}

impl ScriptedDetector {
    fn new(fail_at_offset: Option<u32>) -> (Self, Arc<Mutex<Vec<u32>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (Self { fail_at_offset, calls: calls.clone() }, calls)
    }
}

impl Detector for ScriptedDetector {
    async fn detect(&self, query: DetectionQuery<'_>) -> Result<String, DetectorError> {
        let (width, height) = query.image.dimensions();

        if (width, height) == (800, 600) {
            // The whole small page, not a tile crop.
            self.calls.lock().unwrap().push(u32::MAX);
            return Ok(r#"[{"type": "Rooftop Unit", "tag": "RTU-1", "bbox": [100, 100, 300, 300], "confidence": 0.92}]"#.into());
        }

        let offset = query.image.get_pixel(0, 0)[0] as u32 * 12;
        self.calls.lock().unwrap().push(offset);

        if Some(offset) == self.fail_at_offset {
            return Err(DetectorError::Permanent("malformed request".into()));
        }

        let tile_left = offset as f64;
        let tile_right = tile_left + width as f64;
        if OBJECT_LEFT < tile_left || OBJECT_RIGHT > tile_right {
            return Ok("[]".into());
        }

        // Report the object in this tile's local 0-1000 frame. The later
        // tile reads the tag slightly less confidently.
        let xmin = (OBJECT_LEFT - tile_left) / width as f64 * 1000.0;
        let xmax = (OBJECT_RIGHT - tile_left) / width as f64 * 1000.0;
        let confidence = if offset == 1200 { 0.9 } else { 0.8 };
        Ok(format!(
            r#"[{{"type": "Water Source Heat Pump", "tag": "WSHP-1", "bbox": [100.0, {xmin:.6}, 900.0, {xmax:.6}], "confidence": {confidence}}}]"#
        ))
    }
}

#[tokio::test]
async fn overlapping_tiles_report_one_object_once() {
    let (detector, _calls) = ScriptedDetector::new(None);
    let pipeline = PlanPipeline::new(detector, PipelineConfig::default());
    let pages = vec![position_coded_page()];

    let detections = pipeline
        .locate_equipment(&pages, &["Water Source Heat Pump".into()], &DetectionHints::default())
        .await
        .unwrap();

    assert_eq!(detections.len(), 1, "two tile reports of one object must merge");
    let survivor = &detections[0];
    assert_eq!(survivor.tag.as_deref(), Some("WSHP-1"));
    assert_eq!(survivor.confidence, 0.9, "the higher-confidence reading wins");
    assert_eq!(survivor.page, Some(1));

    // Both tiles resolved to the same page-frame box: x 1600..1800 of 3000
    // is 533.3..600.0 on the page scale, y 10..90 of 100 is 100..900.
    assert!((survivor.bbox.xmin - 533.333).abs() < 0.01);
    assert!((survivor.bbox.xmax - 600.0).abs() < 0.01);
    assert!((survivor.bbox.ymin - 100.0).abs() < 0.01);
    assert!((survivor.bbox.ymax - 900.0).abs() < 0.01);
}

#[tokio::test]
async fn a_failed_tile_costs_only_its_own_contribution() {
    // The tile at offset 1500 rejects every call; the object is still seen
    // by the tile at offset 1200.
    let (detector, _calls) = ScriptedDetector::new(Some(1500));
    let pipeline = PlanPipeline::new(detector, PipelineConfig::default());
    let pages = vec![position_coded_page()];

    let detections = pipeline
        .locate_equipment(&pages, &["Water Source Heat Pump".into()], &DetectionHints::default())
        .await
        .unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].confidence, 0.9);
}

#[tokio::test]
async fn a_failed_tile_can_leave_the_lower_confidence_reading() {
    let (detector, _calls) = ScriptedDetector::new(Some(1200));
    let pipeline = PlanPipeline::new(detector, PipelineConfig::default());
    let pages = vec![position_coded_page()];

    let detections = pipeline
        .locate_equipment(&pages, &["Water Source Heat Pump".into()], &DetectionHints::default())
        .await
        .unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].confidence, 0.8);
}

#[tokio::test]
async fn small_and_large_pages_mix_in_one_request() {
    let (detector, calls) = ScriptedDetector::new(None);
    let pipeline = PlanPipeline::new(detector, PipelineConfig::default());
    let pages = vec![DynamicImage::new_rgba8(800, 600), position_coded_page()];

    let detections = pipeline
        .locate_equipment(&pages, &["Rooftop Unit".into(), "Water Source Heat Pump".into()], &DetectionHints::default())
        .await
        .unwrap();

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].tag.as_deref(), Some("RTU-1"));
    assert_eq!(detections[0].page, Some(1));
    assert_eq!(detections[1].tag.as_deref(), Some("WSHP-1"));
    assert_eq!(detections[1].page, Some(2));

    // One whole-page call plus one call per tile of the wide page.
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    assert!(calls.contains(&u32::MAX));
}
