//! # Output data set
//!
//! The [`DataSet`] is the aggregate the pipeline fills. It is owned by the caller;
//! the pipeline only appends [`Spectrum`]s to it and sets descriptive attributes.
//!
//! ## Overview
//!
//! - A **spectrum** is one row of a data block: its x values (bin boundaries or
//!   centres), its y values, a unique group identifier, and the optional geometry
//!   of the detector element that recorded it.
//! - **Attributes** are free-form `name → value` pairs, both at the data set level
//!   (run number, title, ...) and per spectrum (crate, slot, ...).
//! - Spectra are never removed or reordered once added.
pub mod detector_geometry;

use std::collections::BTreeMap;

use crate::constants::GroupId;
use crate::node::NxValue;

pub use detector_geometry::{DetectorGeometry, DetectorPosition};

/// Named attributes of a data set or a spectrum.
pub type AttributeMap = BTreeMap<String, NxValue>;

/// One row of a data block.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub group_id: GroupId,
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub geometry: Option<DetectorGeometry>,
    pub attributes: AttributeMap,
}

impl Spectrum {
    pub fn new(group_id: GroupId, x_values: Vec<f64>, y_values: Vec<f64>) -> Self {
        Spectrum {
            group_id,
            x_values,
            y_values,
            geometry: None,
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Option<DetectorGeometry>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<NxValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&NxValue> {
        self.attributes.get(name)
    }
}

/// Append-only collection of spectra with descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    pub title: String,
    pub x_label: String,
    pub x_units: String,
    pub y_units: String,
    attributes: AttributeMap,
    spectra: Vec<Spectrum>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spectrum(&mut self, spectrum: Spectrum) {
        self.spectra.push(spectrum);
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// First spectrum carrying `group_id`.
    pub fn spectrum_by_id(&self, group_id: GroupId) -> Option<&Spectrum> {
        self.spectra.iter().find(|s| s.group_id == group_id)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<NxValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&NxValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Spectra appended since `start`, for entry-level post processing.
    pub(crate) fn spectra_since_mut(&mut self, start: usize) -> &mut [Spectrum] {
        let start = start.min(self.spectra.len());
        &mut self.spectra[start..]
    }
}

#[cfg(test)]
mod dataset_test {
    use super::*;

    #[test]
    fn test_append_and_lookup() {
        let mut ds = DataSet::new();
        assert!(ds.is_empty());

        ds.add_spectrum(Spectrum::new(4, vec![0.0, 1.0], vec![5.0]).with_attribute("slot", 2_i64));
        ds.add_spectrum(Spectrum::new(5, vec![0.0, 1.0], vec![6.0]));

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectrum_by_id(5).unwrap().y_values, vec![6.0]);
        assert_eq!(
            ds.spectrum_by_id(4).unwrap().attribute("slot"),
            Some(&NxValue::Int(2))
        );
        assert!(ds.spectrum_by_id(6).is_none());

        for s in ds.spectra_since_mut(1) {
            s.attributes.insert("run_number".into(), NxValue::Int(1));
        }
        assert!(ds.spectra()[0].attribute("run_number").is_none());
        assert!(ds.spectra()[1].attribute("run_number").is_some());
        assert!(ds.spectra_since_mut(10).is_empty());
    }
}
