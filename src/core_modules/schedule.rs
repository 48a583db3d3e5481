// Typed records for the schedule-extraction response. A mechanical schedule
// lists each equipment type once; the collaborator reports those entries as
// an array, which flows through the same tolerant parse boundary as
// detections.

use crate::core_modules::detection::BBox;
use crate::core_modules::response_parser;
use serde::{Deserialize, Serialize};

/// One equipment entry lifted from a mechanical schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentType {
    /// Human-readable equipment name (e.g. "Water Source Heat Pump").
    #[serde(rename = "type")]
    pub kind: String,
    /// The prefix its tags share (e.g. "WSHP").
    pub tag_prefix: String,
    /// True for typical entries (many instances, usually alphabetical tags);
    /// false for instance-based entries (unique numeric tags like RTU-1).
    pub is_typical: bool,
    /// Example tags observed in the schedule.
    #[serde(default)]
    pub tags: Vec<String>,
    /// 1-based page the entry was found on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Where the entry sits in the schedule image, 0-1000 frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// Parses a schedule-extraction response through the tolerant array boundary.
pub fn parse_equipment_types(text: &str) -> Vec<EquipmentType> {
    response_parser::parse_array(text)
}
