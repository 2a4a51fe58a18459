//! Physical page units and grid constants
//!
//! All measurements follow A4 paper with half-inch margins, converted to CSS
//! pixels at 96 DPI.

use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters to CSS pixels at 96 DPI
pub const MM_TO_PX: f32 = 3.779_527_6;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 0.5 inch
pub const MARGIN_MM: f32 = 12.7;

/// Gap between sections on the same grid line
pub const SECTION_GAP_PX: f32 = 4.0;
/// Border width around a section
pub const BOX_BORDER_PX: f32 = 1.0;
/// Margin between adjacent boxes
pub const BOX_MARGIN_PX: f32 = 2.0;
/// Inner padding of the section container
pub const SECTION_PADDING_PX: f32 = 8.0;

/// Default recalculation quiet window after a measurement
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Longest a dirty layout waits under a continuous stream of measurements
pub const DEFAULT_MAX_WAIT_MS: u64 = 500;

/// Convert millimeters to pixels
pub fn mm_to_px(mm: f32) -> f32 {
    mm * MM_TO_PX
}

/// Size of a character box in a grid section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoxSize {
    #[serde(rename = "SIZE_8MM", alias = "8mm")]
    Size8mm,
    #[default]
    #[serde(rename = "SIZE_10MM", alias = "10mm")]
    Size10mm,
    #[serde(rename = "SIZE_12MM", alias = "12mm")]
    Size12mm,
}

impl BoxSize {
    /// Edge length in millimeters
    pub fn mm(&self) -> f32 {
        match self {
            BoxSize::Size8mm => 8.0,
            BoxSize::Size10mm => 10.0,
            BoxSize::Size12mm => 12.0,
        }
    }

    /// Edge length in pixels
    pub fn px(&self) -> f32 {
        mm_to_px(self.mm())
    }

    /// Number of boxes that fit across the usable width of an A4 page
    pub fn max_per_line(&self) -> usize {
        match self {
            BoxSize::Size8mm => 23,
            BoxSize::Size10mm => 18,
            BoxSize::Size12mm => 15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoxSize::Size8mm => "SIZE_8MM",
            BoxSize::Size10mm => "SIZE_10MM",
            BoxSize::Size12mm => "SIZE_12MM",
        }
    }
}

impl fmt::Display for BoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoxSize {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SIZE_8MM" | "8mm" => Ok(BoxSize::Size8mm),
            "SIZE_10MM" | "10mm" => Ok(BoxSize::Size10mm),
            "SIZE_12MM" | "12mm" => Ok(BoxSize::Size12mm),
            other => Err(SheetError::InvalidBoxSize(other.to_string())),
        }
    }
}

/// Physical page geometry in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::uniform(A4_WIDTH_MM, A4_HEIGHT_MM, MARGIN_MM)
    }
}

impl PageGeometry {
    /// Geometry with the same margin on every side
    pub fn uniform(page_width_mm: f32, page_height_mm: f32, margin_mm: f32) -> Self {
        Self {
            page_width_mm,
            page_height_mm,
            margin_top_mm: margin_mm,
            margin_bottom_mm: margin_mm,
            margin_left_mm: margin_mm,
            margin_right_mm: margin_mm,
        }
    }

    pub fn page_width_px(&self) -> f32 {
        mm_to_px(self.page_width_mm)
    }

    pub fn page_height_px(&self) -> f32 {
        mm_to_px(self.page_height_mm)
    }

    /// Usable content width in pixels
    pub fn content_width_px(&self) -> f32 {
        mm_to_px(self.page_width_mm - self.margin_left_mm - self.margin_right_mm)
    }

    /// Usable content height in pixels
    pub fn content_height_px(&self) -> f32 {
        mm_to_px(self.page_height_mm - self.margin_top_mm - self.margin_bottom_mm)
    }

    /// Reject geometry that leaves no usable area
    pub fn validate(&self) -> Result<()> {
        let margins = [
            self.margin_top_mm,
            self.margin_bottom_mm,
            self.margin_left_mm,
            self.margin_right_mm,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(SheetError::InvalidGeometry(format!(
                "margins must be finite and non-negative: {:?}",
                margins
            )));
        }

        let width = self.content_width_px();
        let height = self.content_height_px();
        if !(width.is_finite() && width > 0.0) || !(height.is_finite() && height > 0.0) {
            return Err(SheetError::InvalidGeometry(format!(
                "usable area is {}x{} px",
                width, height
            )));
        }
        Ok(())
    }
}

/// Host-supplied layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub debounce_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_mm: MARGIN_MM,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
        }
    }
}

impl LayoutConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::uniform(self.page_width_mm, self.page_height_mm, self.margin_mm)
    }
}
