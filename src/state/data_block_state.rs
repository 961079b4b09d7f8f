use tracing::debug;

use crate::constants::{
    GroupId, ATTR_AXIS, ATTR_LABEL, ATTR_SIGNAL, FIX_AXES, FIX_LINK, LINK_ATTRIBUTES, MAX_AXES,
    PRIMARY_DATA_FIELD,
};
use crate::ingest::link_resolver::link_target_name;
use crate::ingest_errors::IngestError;
use crate::node::NxNode;

use super::{Dims, FileState};

/// What the pipeline knows about one data block.
///
/// Built once by [`DataBlockState::from_node`] and read-only afterwards.
///
/// # Fields
///
/// * `axis_names` - slot `i` holds the field declaring `axis = i + 1`; slot 0 is the fast axis
/// * `primary_field` - the field holding the counts (`signal = 1`, else `data`)
/// * `dimensions` - shape of the primary field
/// * `label` - `label` attribute of the primary field, merges blocks into one data set
/// * `has_int_ids` - the second axis is an integer array with one value per row
/// * `start_group_id` - first default identifier of this block
/// * `link_name` - the detector subtree the block's axis data was linked from
/// * `axis_overridden` - axis slot 0 was replaced by an override description
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlockState {
    pub name: String,
    pub path: String,
    pub axis_names: [Option<String>; MAX_AXES],
    pub primary_field: Option<String>,
    pub dimensions: Dims,
    pub label: Option<String>,
    pub has_int_ids: bool,
    pub start_group_id: GroupId,
    pub link_name: Option<String>,
    pub axis_overridden: bool,
}

/// The field holding a data block's counts.
pub(crate) fn primary_field<N: NxNode>(node: &N) -> Option<&N> {
    node.children()
        .find(|child| child.int_attribute(ATTR_SIGNAL) == Some(1))
        .or_else(|| node.child_by_name(PRIMARY_DATA_FIELD))
}

/// Value of the first link attribute carried by `node`.
fn link_attribute<N: NxNode>(node: &N) -> Option<String> {
    LINK_ATTRIBUTES
        .iter()
        .filter_map(|attr| node.text_attribute(attr))
        .find(|value| !value.trim().is_empty())
}

impl DataBlockState {
    /// Interpret the children of a data block.
    ///
    /// Arguments
    /// ---------
    /// * `node`: the data block
    /// * `path`: slash-separated path of the data block, used as override key
    /// * `start_group_id`: first default identifier available to this block
    /// * `file_state`: session state, consulted for `axis1..axis4` and `link` overrides
    pub fn from_node<N: NxNode>(
        node: &N,
        path: &str,
        start_group_id: GroupId,
        file_state: &FileState,
    ) -> Self {
        let mut axis_names: [Option<String>; MAX_AXES] = Default::default();
        for child in node.children() {
            let Some(axis) = child.int_attribute(ATTR_AXIS) else {
                continue;
            };
            if !(1..=MAX_AXES as i64).contains(&axis) {
                debug!(block = path, field = child.name(), axis, "ignoring out of range axis");
                continue;
            }
            let slot = &mut axis_names[(axis - 1) as usize];
            if slot.is_none() {
                *slot = Some(child.name().to_string());
            }
        }

        let mut axis_overridden = false;
        for (slot, key) in FIX_AXES.iter().enumerate() {
            if let Some(field) = file_state.fix_for(path, key, axis_names[slot].as_deref()) {
                debug!(block = path, axis = slot + 1, field, "axis overridden");
                axis_names[slot] = Some(field.to_string());
                axis_overridden |= slot == 0;
            }
        }

        let primary = primary_field(node);
        let dimensions: Dims = primary
            .map(|field| field.dimensions().iter().copied().collect())
            .unwrap_or_default();
        let label = primary.and_then(|field| field.text_attribute(ATTR_LABEL));

        let rows = Self::rows_of(&dimensions).unwrap_or(0);
        let has_int_ids = rows > 0
            && axis_names[1]
                .as_deref()
                .and_then(|name| node.child_by_name(name))
                .and_then(|field| field.value())
                .is_some_and(|value| value.is_integer() && value.len() == rows);

        let fast_axis = axis_names[0]
            .as_deref()
            .and_then(|name| node.child_by_name(name));
        let found = fast_axis
            .and_then(|field| link_attribute(field).map(|value| (value, field.name())))
            .or_else(|| {
                node.children()
                    .find_map(|child| link_attribute(child).map(|value| (value, child.name())))
            });
        let link_name = found.and_then(|(value, field)| link_target_name(&value, field));
        let link_name = match file_state.fix_for(path, FIX_LINK, link_name.as_deref()) {
            Some(fixed) => Some(fixed.to_string()),
            None => link_name,
        };

        DataBlockState {
            name: node.name().to_string(),
            path: path.to_string(),
            axis_names,
            primary_field: primary.map(|field| field.name().to_string()),
            dimensions,
            label,
            has_int_ids,
            start_group_id,
            link_name,
            axis_overridden,
        }
    }

    fn rows_of(dimensions: &[usize]) -> Option<usize> {
        match dimensions.split_last() {
            Some((_, leading)) => leading.iter().try_fold(1_usize, |acc, &d| acc.checked_mul(d)),
            None => Some(0),
        }
    }

    /// Number of spectra held by the block: the product of all but the last dimension.
    ///
    /// `None` when the product does not fit in a `usize`.
    pub fn rows(&self) -> Option<usize> {
        Self::rows_of(&self.dimensions)
    }

    /// Rows and columns of the primary field.
    ///
    /// Return
    /// ------
    /// * `(rows, columns)`, with `rows * columns` guaranteed to fit in a `usize`
    /// * [`IngestError::DimensionOverflow`] otherwise
    pub fn shape(&self) -> Result<(usize, usize), IngestError> {
        let columns = self.columns();
        self.rows()
            .filter(|rows| rows.checked_mul(columns).is_some())
            .map(|rows| (rows, columns))
            .ok_or_else(|| IngestError::DimensionOverflow {
                block: self.path.clone(),
                dims: self.dimensions.to_vec(),
            })
    }

    /// Length of one spectrum: the last dimension.
    pub fn columns(&self) -> usize {
        self.dimensions.last().copied().unwrap_or(0)
    }

    pub fn axis_name(&self, slot: usize) -> Option<&str> {
        self.axis_names.get(slot)?.as_deref()
    }
}
