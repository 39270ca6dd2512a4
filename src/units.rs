//! Display units for model measurements.
//!
//! Every value is held in meters and converted to the selected unit on
//! demand, so switching units back and forth never accumulates rounding.

use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Deserializer};

use crate::math::Aabb;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::AsRefStr, strum::EnumIter,
)]
pub enum UnitScale {
    #[strum(serialize = "mm")]
    Millimeters,
    #[strum(serialize = "cm")]
    Centimeters,
    #[strum(serialize = "m")]
    Meters,
    #[strum(serialize = "in")]
    Inches,
    #[strum(serialize = "ft")]
    Feet,
    #[strum(serialize = "yd")]
    Yards,
    #[default]
    #[strum(serialize = "unknown", disabled)]
    Unknown,
}

impl UnitScale {
    /// How many of this unit make one meter. `None` for [`UnitScale::Unknown`].
    pub fn units_per_meter(self) -> Option<f64> {
        match self {
            UnitScale::Millimeters => Some(1000.0),
            UnitScale::Centimeters => Some(100.0),
            UnitScale::Meters => Some(1.0),
            UnitScale::Inches => Some(39.37),
            UnitScale::Feet => Some(3.281),
            UnitScale::Yards => Some(1.094),
            UnitScale::Unknown => None,
        }
    }

    pub fn meters_per_unit(self) -> Option<f64> {
        self.units_per_meter().map(|units| 1.0 / units)
    }

    pub fn from_meters(self, meters: f64) -> Option<f64> {
        self.units_per_meter().map(|units| meters * units)
    }

    pub fn full_name(self) -> &'static str {
        match self {
            UnitScale::Millimeters => "millimeters",
            UnitScale::Centimeters => "centimeters",
            UnitScale::Meters => "meters",
            UnitScale::Inches => "inches",
            UnitScale::Feet => "feet",
            UnitScale::Yards => "yards",
            UnitScale::Unknown => "unknown units",
        }
    }

    pub fn is_known(self) -> bool {
        self != UnitScale::Unknown
    }
}

impl UnitScale {
    /// Parses an abbreviation such as `"cm"`. Anything unrecognised is
    /// [`UnitScale::Unknown`].
    pub fn parse_or_unknown(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }

    /// Reads a catalog `scale` cell. Empty, null or unrecognised values are
    /// [`UnitScale::Unknown`].
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(Self::parse_or_unknown).unwrap_or_default())
    }
}

impl fmt::Display for UnitScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Width, height and depth of a model plus the grid cell size, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    width: f64,
    height: f64,
    depth: f64,
    grid_cell: f64,
}

impl Measurements {
    /// `extent` is the bounding box size per axis and `box_size` its diagonal,
    /// both in the model's own units. Returns `None` when the model's unit is
    /// unknown, in which case nothing should be displayed.
    pub fn new(extent: Vec3, box_size: f32, source: UnitScale, grid_divisions: u32) -> Option<Self> {
        let to_meters = source.meters_per_unit()?;
        let divisions = grid_divisions.max(1) as f64;

        Some(Self {
            width: extent.x as f64 * to_meters,
            height: extent.y as f64 * to_meters,
            depth: extent.z as f64 * to_meters,
            grid_cell: box_size as f64 / divisions * to_meters,
        })
    }

    pub fn from_bounds(bounds: &Aabb, source: UnitScale, grid_divisions: u32) -> Option<Self> {
        Self::new(bounds.size(), bounds.diagonal(), source, grid_divisions)
    }

    pub fn meters(&self) -> [f64; 3] {
        [self.width, self.height, self.depth]
    }

    /// Converts the stored meter values to `unit`. `None` for an unknown unit.
    pub fn display(&self, unit: UnitScale) -> Option<DisplayedMeasurements> {
        Some(DisplayedMeasurements {
            width: unit.from_meters(self.width)?,
            height: unit.from_meters(self.height)?,
            depth: unit.from_meters(self.depth)?,
            grid_cell: unit.from_meters(self.grid_cell)?,
            unit,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayedMeasurements {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub grid_cell: f64,
    pub unit: UnitScale,
}

impl DisplayedMeasurements {
    pub fn grid_key(&self) -> String {
        format!("{:.1} {}", self.grid_cell, self.unit.full_name())
    }
}

impl fmt::Display for DisplayedMeasurements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "width:  {:.1} {}", self.width, self.unit)?;
        writeln!(f, "height: {:.1} {}", self.height, self.unit)?;
        writeln!(f, "depth:  {:.1} {}", self.depth, self.unit)?;
        write!(f, "grid:   {}", self.grid_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPlane {
    /// Floor grid under the object.
    Horizontal,
    /// Back wall grid behind the object.
    Vertical,
}

/// Placement of a measurement grid sized to the object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOverlay {
    pub plane: GridPlane,
    pub size: f32,
    pub divisions: u32,
    pub position: Vec3,
    pub rotation: Quat,
}

impl GridOverlay {
    pub fn for_bounds(bounds: &Aabb, plane: GridPlane, divisions: u32) -> Self {
        let center = bounds.center();
        let extent = bounds.size();

        let (position, rotation) = match plane {
            GridPlane::Horizontal => (
                Vec3::new(center.x, center.y - extent.y / 2.0, center.z),
                Quat::IDENTITY,
            ),
            GridPlane::Vertical => (
                Vec3::new(center.x, center.y, center.z - extent.z / 2.0),
                Quat::from_rotation_x(90.0_f32.to_radians()),
            ),
        };

        Self {
            plane,
            size: bounds.diagonal(),
            divisions,
            position,
            rotation,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.size / self.divisions.max(1) as f32
    }
}
