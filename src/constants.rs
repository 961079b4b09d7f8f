//! # Constants and type definitions for nexingest
//!
//! This module centralizes the **node class names**, **attribute and field names**,
//! and the **common type aliases** used throughout the ingestion pipeline.
//!
//! ## Overview
//!
//! - Class labels of the hierarchical file tree (`NXentry`, `NXdata`, ...)
//! - Attribute names that carry axis, link and labelling information
//! - Field names read from detector-geometry subtrees
//! - Type aliases for physical quantities and identifiers
//!
//! The legacy dialects spell some fields in more than one way (e.g. the detector
//! identifier array); those alternatives are kept together here so that every
//! reader walks them in the same priority order.

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Identifier attached to one spectrum of the output data set
pub type GroupId = i64;

// -------------------------------------------------------------------------------------------------
// Node classes
// -------------------------------------------------------------------------------------------------

pub const CLASS_ENTRY: &str = "NXentry";
pub const CLASS_DATA: &str = "NXdata";
pub const CLASS_INSTRUMENT: &str = "NXinstrument";
pub const CLASS_DETECTOR: &str = "NXdetector";
pub const CLASS_GEOMETRY: &str = "NXgeometry";
pub const CLASS_SOURCE: &str = "NXsource";

/// Class label given to leaf fields by [`MemNode::field`](crate::node::MemNode::field)
pub const CLASS_FIELD: &str = "SDS";

// -------------------------------------------------------------------------------------------------
// Attributes
// -------------------------------------------------------------------------------------------------

pub const ATTR_AXIS: &str = "axis";
pub const ATTR_SIGNAL: &str = "signal";
pub const ATTR_LINK: &str = "link";
pub const ATTR_TARGET: &str = "target";
pub const ATTR_LABEL: &str = "label";
pub const ATTR_UNITS: &str = "units";
pub const ATTR_LONG_NAME: &str = "long_name";
pub const ATTR_HISTOGRAM_OFFSET: &str = "histogram_offset";
pub const ATTR_LAYOUT: &str = "layout";

/// Attributes that may name the detector subtree an axis field was linked from,
/// in lookup order.
pub const LINK_ATTRIBUTES: [&str; 2] = [ATTR_LINK, ATTR_TARGET];

// -------------------------------------------------------------------------------------------------
// Fields
// -------------------------------------------------------------------------------------------------

/// Name of the primary data field when no child carries `signal = 1`
pub const PRIMARY_DATA_FIELD: &str = "data";

/// Maximum number of declared axes on one data block
pub const MAX_AXES: usize = 4;

/// Legacy spellings of the explicit detector identifier array, in priority order
pub const DETECTOR_ID_FIELDS: [&str; 2] = ["id", "detector_number"];

pub const FIELD_DISTANCE: &str = "distance";
pub const FIELD_POLAR_ANGLE: &str = "polar_angle";
pub const FIELD_AZIMUTHAL_ANGLE: &str = "azimuthal_angle";
pub const FIELD_SOLID_ANGLE: &str = "solid_angle";
pub const FIELD_CRATE: &str = "crate";
pub const FIELD_SLOT: &str = "slot";
pub const FIELD_INPUT: &str = "input";
pub const FIELD_LAYOUT: &str = "layout";

/// Geometry fields whose shapes must agree inside one detector subtree
pub const GEOMETRY_FIELDS: [&str; 4] = [
    FIELD_DISTANCE,
    FIELD_AZIMUTHAL_ANGLE,
    FIELD_POLAR_ANGLE,
    FIELD_SOLID_ANGLE,
];

pub const FIELD_RUN_NUMBER: &str = "run_number";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DURATION: &str = "duration";
pub const FIELD_PROTON_CHARGE: &str = "proton_charge";

// -------------------------------------------------------------------------------------------------
// Attribute keys written to the output data set
// -------------------------------------------------------------------------------------------------

pub const DS_RUN_NUMBER: &str = "run_number";
pub const DS_RUN_TITLE: &str = "run_title";
pub const DS_NUMBER_OF_PULSES: &str = "number_of_pulses";
pub const DS_PROTON_CHARGE: &str = "proton_charge";
pub const DS_INITIAL_PATH: &str = "initial_path";
pub const DS_LABEL: &str = "label";
pub const DS_DATA_BLOCK: &str = "data_block";

/// Source pulses per second of duration, used to derive the number of pulses of a run
pub const PULSES_PER_SECOND: f64 = 30.0;

// -------------------------------------------------------------------------------------------------
// Override keys
// -------------------------------------------------------------------------------------------------

/// Override attribute remapping axis 1 of a data block to another field
pub const FIX_AXIS1: &str = "axis1";
/// Override attributes remapping the axes of a data block, indexed by axis slot
pub const FIX_AXES: [&str; MAX_AXES] = [FIX_AXIS1, "axis2", "axis3", "axis4"];
/// Override attribute replacing the link name of a data block
pub const FIX_LINK: &str = "link";
/// Override attribute replacing the initial flight path of an entry
pub const FIX_INITIAL_PATH: &str = "initial_path";
