#![warn(missing_docs)]

//! Structural-standards tables for the steelcheck rule engine.
//!
//! Numeric minimums and standard size series used by both the detector
//! (to find violations) and the corrector (to select replacement sizes).
//! Defaults are standards-derived for millimeter models; projects in
//! other jurisdictions override the tables per run.

use serde::{Deserialize, Serialize};

/// Which dimension a suggestion is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    /// Plate thickness.
    PlateThickness,
    /// Bolt diameter.
    BoltDiameter,
    /// Weld leg size.
    WeldSize,
    /// Anchor diameter.
    AnchorDiameter,
    /// Anchor embedment depth.
    AnchorEmbedment,
}

/// Numeric rule tables, all lengths in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    /// Standard bolt diameters, ascending.
    pub bolt_diameters: Vec<f64>,
    /// Standard plate thickness series, ascending.
    pub plate_thicknesses: Vec<f64>,
    /// Standard weld leg sizes, ascending.
    pub weld_sizes: Vec<f64>,
    /// Minimum weld leg size per adjoining plate thickness:
    /// `(max_plate_thickness, min_weld_size)` rows, ascending by thickness.
    pub weld_minimums: Vec<(f64, f64)>,
    /// Minimum bolt edge distance as a multiple of diameter.
    pub bolt_edge_factor: f64,
    /// Minimum bolt spacing as a multiple of diameter.
    pub bolt_spacing_factor: f64,
    /// Minimum base-plate thickness.
    pub base_plate_min_thickness: f64,
    /// Minimum base-plate plan dimension.
    pub base_plate_min_plan: f64,
    /// Minimum anchor embedment depth.
    pub anchor_min_embedment: f64,
    /// Minimum anchor edge distance.
    pub anchor_min_edge: f64,
    /// Minimum anchor spacing.
    pub anchor_min_spacing: f64,
    /// Hard clearance between unconnected members; closer is an
    /// intersection.
    pub member_clearance: f64,
    /// Soft clearance; closer than this (but outside the hard clearance)
    /// is a near-miss.
    pub member_near_miss: f64,
    /// Maximum member slenderness ratio (length over least bearing
    /// dimension).
    pub max_slenderness: f64,
    /// Maximum member span.
    pub max_span: f64,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            bolt_diameters: vec![12.0, 16.0, 20.0, 24.0, 30.0, 36.0],
            plate_thicknesses: vec![6.0, 8.0, 10.0, 12.7, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0],
            weld_sizes: vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 16.0],
            weld_minimums: vec![(6.0, 3.0), (12.0, 5.0), (20.0, 6.0), (f64::INFINITY, 8.0)],
            bolt_edge_factor: 1.5,
            bolt_spacing_factor: 3.0,
            base_plate_min_thickness: 12.7,
            base_plate_min_plan: 150.0,
            anchor_min_embedment: 200.0,
            anchor_min_edge: 50.0,
            anchor_min_spacing: 100.0,
            member_clearance: 10.0,
            member_near_miss: 50.0,
            max_slenderness: 300.0,
            max_span: 20_000.0,
        }
    }
}

impl RuleTables {
    /// Minimum weld leg size for the given adjoining plate thickness.
    pub fn min_weld_size(&self, plate_thickness: f64) -> f64 {
        for &(max_thickness, min_size) in &self.weld_minimums {
            if plate_thickness <= max_thickness {
                return min_size;
            }
        }
        // Table rows end with an infinity sentinel; unreachable in practice.
        self.weld_minimums.last().map(|r| r.1).unwrap_or(8.0)
    }

    /// True when `diameter` is a standard bolt diameter.
    pub fn is_standard_bolt(&self, diameter: f64) -> bool {
        self.bolt_diameters
            .iter()
            .any(|&d| (d - diameter).abs() < 1e-6)
    }

    /// The size series for a category, ascending.
    pub fn series(&self, category: SizeCategory) -> &[f64] {
        match category {
            SizeCategory::PlateThickness => &self.plate_thicknesses,
            SizeCategory::BoltDiameter | SizeCategory::AnchorDiameter => &self.bolt_diameters,
            SizeCategory::WeldSize => &self.weld_sizes,
            // Embedment has no discrete series; handled by the minimum.
            SizeCategory::AnchorEmbedment => &[],
        }
    }

    /// Smallest standard size `>= minimum` in the category's series.
    ///
    /// Returns the series maximum when the minimum exceeds every entry,
    /// and the raw minimum for categories without a series. Never
    /// returns a value below `minimum` while the series can satisfy it.
    pub fn next_size_up(&self, category: SizeCategory, minimum: f64) -> f64 {
        let series = self.series(category);
        series
            .iter()
            .copied()
            .find(|&s| s >= minimum - 1e-9)
            .or_else(|| series.last().copied())
            .unwrap_or(minimum)
    }
}

/// Port for an external dimension-suggestion service.
///
/// Implementations are synchronous and may simply return `None`; the
/// corrector always falls back to the standards tables, so a slow or
/// absent service never stalls correction.
pub trait DimensionSuggester {
    /// Suggest a size for the given load, material grade, and category.
    fn suggest(&self, load: f64, grade: &str, category: SizeCategory) -> Option<f64>;
}

/// The deterministic fallback: suggestions straight from the tables.
#[derive(Debug, Clone, Default)]
pub struct TableSuggester {
    tables: RuleTables,
}

impl TableSuggester {
    /// Build a suggester over the given tables.
    pub fn new(tables: RuleTables) -> Self {
        Self { tables }
    }
}

impl DimensionSuggester for TableSuggester {
    fn suggest(&self, _load: f64, _grade: &str, category: SizeCategory) -> Option<f64> {
        match category {
            SizeCategory::PlateThickness => Some(self.tables.base_plate_min_thickness),
            SizeCategory::AnchorEmbedment => Some(self.tables.anchor_min_embedment),
            _ => self.tables.series(category).first().copied(),
        }
    }
}
