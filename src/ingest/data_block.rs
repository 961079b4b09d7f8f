//! # Data block processing
//!
//! Turns one data block into spectra of the output [`DataSet`]:
//!
//! 1. read the primary field and check it against the declared dimensions,
//! 2. read the fast axis (slot 0 of the [`DataBlockState`]), converting bin centres
//!    to boundaries when the field carries a `histogram_offset`,
//! 3. pick an identifier per row,
//! 4. attach the geometry of the resolved detector, if any.
//!
//! ## Identifiers
//!
//! When explicit identifiers are enabled, the first source whose length equals the
//! row count wins:
//!
//! * the integer `id`/`detector_number` array of the resolved detector,
//! * an integer second axis of the data block itself,
//! * otherwise `start_group_id, start_group_id + 1, ...`.
//!
//! The [`GroupIdCounter`] shared by all blocks of a file then moves past both the
//! rows just emitted and the largest explicit identifier used, so default
//! identifiers of later blocks never collide with earlier ones. A block whose
//! default identifiers would leave the `GroupId` range fails with
//! [`IngestError::GroupIdOverflow`].
//!
//! ## Geometry
//!
//! Missing `distance` or `polar_angle` means "no geometry" and is not an error.
//! Geometry arrays must either match the row count, hold a single value (broadcast
//! to every row) or, when the detector carries a layout hint, hold one value per
//! bank. Anything else fails the geometry attachment only: the spectra are still
//! emitted, without geometry, and the error is reported in the [`BlockOutcome`].
use tracing::{debug, warn};

use crate::constants::{
    GroupId, ATTR_HISTOGRAM_OFFSET, ATTR_LONG_NAME, ATTR_UNITS, DS_DATA_BLOCK, DS_LABEL,
    FIELD_AZIMUTHAL_ANGLE, FIELD_CRATE, FIELD_DISTANCE, FIELD_INPUT, FIELD_POLAR_ANGLE,
    FIELD_SLOT, FIELD_SOLID_ANGLE,
};
use crate::conversion::{
    angle_factor, histogram_from_centres, length_factor, scale_in_place, solid_angle_factor,
};
use crate::dataset::{DataSet, DetectorGeometry, Spectrum};
use crate::ingest_errors::IngestError;
use crate::node::{NxNode, NxValue};
use crate::state::{DataBlockState, DetectorState, StateRegistry};

use super::IngestOptions;

/// Monotonic source of default identifiers for the blocks of one file.
///
/// Once an advance would leave the `GroupId` range the counter is exhausted and
/// refuses further default assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIdCounter {
    next: GroupId,
    exhausted: bool,
}

impl GroupIdCounter {
    pub fn new(first: GroupId) -> Self {
        GroupIdCounter {
            next: first,
            exhausted: false,
        }
    }

    /// Next identifier available for a default assignment.
    pub fn peek(&self) -> GroupId {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Move past `count` identifiers and past `max_explicit`, if given.
    pub fn advance(&mut self, count: usize, max_explicit: Option<GroupId>) {
        let after_defaults = GroupId::try_from(count)
            .ok()
            .and_then(|count| self.next.checked_add(count));
        let next = match max_explicit {
            Some(max) => after_defaults
                .zip(max.checked_add(1))
                .map(|(defaults, explicit)| defaults.max(explicit)),
            None => after_defaults,
        };
        match next {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
    }
}

/// Where the identifiers of a block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    Detector,
    DataBlock,
    Default,
}

/// Result of processing one data block.
#[derive(Debug, PartialEq)]
pub struct BlockOutcome {
    pub emitted: usize,
    pub id_source: IdSource,
    /// Set when the spectra were emitted without their geometry.
    pub geometry_error: Option<IngestError>,
}

/// How a geometry array maps onto the rows of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowMap {
    PerRow,
    Broadcast,
    PerBank { pixels_per_bank: usize },
}

impl RowMap {
    fn new(len: usize, rows: usize, has_layout: bool) -> Option<Self> {
        if len == rows {
            Some(RowMap::PerRow)
        } else if len == 1 {
            Some(RowMap::Broadcast)
        } else if has_layout && len > 0 && rows % len == 0 {
            Some(RowMap::PerBank {
                pixels_per_bank: rows / len,
            })
        } else {
            None
        }
    }

    fn index(&self, row: usize) -> usize {
        match self {
            RowMap::PerRow => row,
            RowMap::Broadcast => 0,
            RowMap::PerBank { pixels_per_bank } => row / pixels_per_bank,
        }
    }
}

#[derive(Debug)]
struct GeometryColumn {
    values: Vec<f64>,
    map: RowMap,
}

impl GeometryColumn {
    fn at(&self, row: usize) -> f64 {
        self.values[self.map.index(row)]
    }
}

#[derive(Debug)]
struct GeometryTable {
    distance: GeometryColumn,
    polar: GeometryColumn,
    azimuthal: Option<GeometryColumn>,
    solid_angle: Option<GeometryColumn>,
}

impl GeometryTable {
    fn row(&self, row: usize) -> DetectorGeometry {
        DetectorGeometry::new(
            self.distance.at(row),
            self.polar.at(row),
            self.azimuthal.as_ref().map_or(0.0, |column| column.at(row)),
            self.solid_angle.as_ref().map(|column| column.at(row)),
        )
    }
}

/// Populates the data set from one data block.
#[derive(Debug, Clone, Copy)]
pub struct DataBlockProcessor<'a> {
    options: &'a IngestOptions,
    explicit_ids: bool,
}

impl<'a> DataBlockProcessor<'a> {
    /// Arguments
    /// ---------
    /// * `options`: ingestion options
    /// * `explicit_ids`: use identifier arrays of the detector or block when present;
    ///   `false` restricts the processor to default identifiers
    pub fn new(options: &'a IngestOptions, explicit_ids: bool) -> Self {
        DataBlockProcessor {
            options,
            explicit_ids,
        }
    }

    /// Emit the spectra of `data_node`.
    ///
    /// The block's [`DataBlockState`] (and the [`DetectorState`] when `detector_node` is
    /// given) must be the most recent of their kind in `states`.
    ///
    /// Arguments
    /// ---------
    /// * `data_node`: the data block
    /// * `detector_node`: the resolved detector subtree, if any
    /// * `states`: the session registry
    /// * `counter`: the default identifier counter of the entry
    /// * `ds`: the output data set
    ///
    /// Return
    /// ------
    /// * The number of spectra emitted and the identifier source used. A geometry
    ///   failure is carried in [`BlockOutcome::geometry_error`].
    /// * An error, and nothing emitted, when the primary data is missing or does not
    ///   match its dimensions.
    pub fn process<N: NxNode>(
        &self,
        data_node: &N,
        detector_node: Option<&N>,
        states: &StateRegistry,
        counter: &mut GroupIdCounter,
        ds: &mut DataSet,
    ) -> Result<BlockOutcome, IngestError> {
        let block = states
            .latest_data_block()
            .ok_or(IngestError::MissingState("data block"))?;
        let detector = match detector_node {
            Some(node) => Some((
                node,
                states
                    .latest_detector()
                    .ok_or(IngestError::MissingState("detector"))?,
            )),
            None => None,
        };

        let primary = block
            .primary_field
            .as_deref()
            .and_then(|name| data_node.child_by_name(name))
            .ok_or_else(|| IngestError::MissingPrimaryData(block.path.clone()))?;
        let values = primary
            .value()
            .and_then(NxValue::to_f64_vec)
            .ok_or_else(|| IngestError::MissingPrimaryData(block.path.clone()))?;

        if block.dimensions.is_empty() {
            return Err(IngestError::MissingDimensions(block.path.clone()));
        }
        let (rows, columns) = block.shape()?;
        let expected = rows * columns;
        if values.len() != expected {
            return Err(IngestError::DataLengthMismatch {
                block: block.path.clone(),
                dims: block.dimensions.to_vec(),
                expected,
                found: values.len(),
            });
        }

        let (ids, id_source) = self.assign_ids(data_node, detector, block, rows, counter)?;
        let x_values = self.read_fast_axis(data_node, block, columns);

        let mut geometry_error = None;
        let geometry = match detector {
            Some((node, state)) => match self.build_geometry(node, state, block, rows) {
                Ok(table) => table,
                Err(err) => {
                    warn!(block = %block.path, detector = %state.name, "{err}");
                    geometry_error = Some(err);
                    None
                }
            },
            None => None,
        };
        let hardware = detector
            .map(|(node, _)| {
                [FIELD_CRATE, FIELD_SLOT, FIELD_INPUT]
                    .map(|field| (field, node.field_i64s(field).unwrap_or_default()))
            })
            .unwrap_or_default();

        describe_data_set(ds, data_node, block, primary);

        for (row, group_id) in ids.iter().copied().enumerate() {
            let y_values = values[row * columns..(row + 1) * columns].to_vec();
            let mut spectrum = Spectrum::new(group_id, x_values.clone(), y_values)
                .with_geometry(geometry.as_ref().map(|table| table.row(row)))
                .with_attribute(DS_DATA_BLOCK, block.name.as_str());
            if let Some(label) = &block.label {
                spectrum = spectrum.with_attribute(DS_LABEL, label.as_str());
            }
            for (field, values) in &hardware {
                if let Some(value) = values.get(row) {
                    spectrum = spectrum.with_attribute(*field, *value);
                }
            }
            ds.add_spectrum(spectrum);
        }

        let max_explicit = match id_source {
            IdSource::Default => None,
            _ => ids.iter().copied().max(),
        };
        counter.advance(rows, max_explicit);

        debug!(
            block = %block.path,
            rows,
            columns,
            ?id_source,
            geometry = geometry.is_some(),
            "data block processed"
        );

        Ok(BlockOutcome {
            emitted: rows,
            id_source,
            geometry_error,
        })
    }

    fn read_fast_axis<N: NxNode>(
        &self,
        data_node: &N,
        block: &DataBlockState,
        columns: usize,
    ) -> Vec<f64> {
        let field = block
            .axis_name(0)
            .and_then(|name| data_node.child_by_name(name));
        let values = field
            .and_then(|field| field.value())
            .and_then(NxValue::to_f64_vec);

        match (field, values) {
            (Some(field), Some(values)) => {
                let offset = field
                    .f64_attribute(ATTR_HISTOGRAM_OFFSET)
                    .filter(|_| self.options.histogram_offsets);
                match offset {
                    Some(offset) => histogram_from_centres(values, offset),
                    None => values,
                }
            }
            _ => {
                debug!(block = %block.path, "no fast axis, using channel indices");
                (0..columns).map(|i| i as f64).collect()
            }
        }
    }

    fn assign_ids<N: NxNode>(
        &self,
        data_node: &N,
        detector: Option<(&N, &DetectorState)>,
        block: &DataBlockState,
        rows: usize,
        counter: &GroupIdCounter,
    ) -> Result<(Vec<GroupId>, IdSource), IngestError> {
        if self.explicit_ids {
            let detector_ids = detector.and_then(|(node, state)| {
                node.field_i64s(state.id_field_name.as_deref()?)
            });
            if let Some(ids) = detector_ids.filter(|ids| ids.len() == rows) {
                return Ok((ids, IdSource::Detector));
            }

            let block_ids = block
                .axis_name(1)
                .filter(|_| block.has_int_ids)
                .and_then(|name| data_node.field_i64s(name));
            if let Some(ids) = block_ids.filter(|ids| ids.len() == rows) {
                return Ok((ids, IdSource::DataBlock));
            }
        }

        let overflow = || IngestError::GroupIdOverflow(block.path.clone());
        if counter.is_exhausted() {
            return Err(overflow());
        }
        let start = block.start_group_id;
        let ids = (0..rows)
            .map(|row| {
                GroupId::try_from(row)
                    .ok()
                    .and_then(|row| start.checked_add(row))
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;
        Ok((ids, IdSource::Default))
    }

    fn build_geometry<N: NxNode>(
        &self,
        detector: &N,
        state: &DetectorState,
        block: &DataBlockState,
        rows: usize,
    ) -> Result<Option<GeometryTable>, IngestError> {
        let read = |field: &str, factor: fn(&str) -> f64| -> Option<Vec<f64>> {
            let node = detector.child_by_name(field)?;
            let mut values = node.value().and_then(NxValue::to_f64_vec)?;
            if self.options.convert_units {
                if let Some(units) = node.text_attribute(ATTR_UNITS) {
                    scale_in_place(&mut values, factor(&units));
                }
            }
            Some(values)
        };

        let (Some(distance), Some(polar)) = (
            read(FIELD_DISTANCE, length_factor),
            read(FIELD_POLAR_ANGLE, angle_factor),
        ) else {
            debug!(detector = %state.name, "no distance or polar angle, geometry skipped");
            return Ok(None);
        };
        state.geometry_shape()?;

        let has_layout = state.layout.is_some();
        let fit = |field: &str, values: Vec<f64>| -> Result<GeometryColumn, IngestError> {
            let map = RowMap::new(values.len(), rows, has_layout).ok_or_else(|| {
                IngestError::GeometryRowMismatch {
                    detector: state.name.clone(),
                    block: block.name.clone(),
                    field: field.to_string(),
                    rows,
                    len: values.len(),
                }
            })?;
            Ok(GeometryColumn { values, map })
        };

        let distance = fit(FIELD_DISTANCE, distance)?;
        let polar = fit(FIELD_POLAR_ANGLE, polar)?;
        let azimuthal = read(FIELD_AZIMUTHAL_ANGLE, angle_factor)
            .map(|values| fit(FIELD_AZIMUTHAL_ANGLE, values))
            .transpose()?;
        let solid_angle = read(FIELD_SOLID_ANGLE, solid_angle_factor)
            .map(|values| fit(FIELD_SOLID_ANGLE, values))
            .transpose()?;

        Ok(Some(GeometryTable {
            distance,
            polar,
            azimuthal,
            solid_angle,
        }))
    }
}

/// Fill the descriptive fields of the data set the first block leaves unset.
fn describe_data_set<N: NxNode>(
    ds: &mut DataSet,
    data_node: &N,
    block: &DataBlockState,
    primary: &N,
) {
    if ds.title.is_empty() {
        ds.title = block.name.clone();
    }
    if ds.x_label.is_empty() {
        if let Some(field) = block
            .axis_name(0)
            .and_then(|name| data_node.child_by_name(name))
        {
            ds.x_label = field
                .text_attribute(ATTR_LONG_NAME)
                .unwrap_or_else(|| field.name().to_string());
            ds.x_units = field.text_attribute(ATTR_UNITS).unwrap_or_default();
        }
    }
    if ds.y_units.is_empty() {
        ds.y_units = primary.text_attribute(ATTR_UNITS).unwrap_or_default();
    }
    if let Some(label) = &block.label {
        ds.set_attribute(DS_LABEL, label.as_str());
    }
}
