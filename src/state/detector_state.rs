use crate::constants::{
    GroupId, ATTR_LAYOUT, CLASS_GEOMETRY, DETECTOR_ID_FIELDS, FIELD_LAYOUT, GEOMETRY_FIELDS,
};
use crate::ingest_errors::IngestError;
use crate::node::NxNode;

use super::Dims;

/// What the pipeline knows about one detector-geometry subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorState {
    pub name: String,
    pub path: String,
    pub has_int_ids: bool,
    /// Which of the legacy identifier fields was found.
    pub id_field_name: Option<String>,
    pub start_id: Option<GroupId>,
    pub end_id: Option<GroupId>,
    /// Shapes of the geometry fields present, in [`GEOMETRY_FIELDS`] order.
    pub geometry_dims: Vec<(&'static str, Dims)>,
    pub geometry_name: Option<String>,
    /// Optional `point`/`linear`/`area` hint.
    pub layout: Option<String>,
}

impl DetectorState {
    pub fn from_node<N: NxNode>(node: &N, path: &str) -> Self {
        let id_field = DETECTOR_ID_FIELDS.iter().find_map(|name| {
            let field = node.child_by_name(name)?;
            field.value()?.is_integer().then_some(field)
        });
        let ids = id_field
            .and_then(|field| field.value())
            .and_then(|value| value.to_i64_vec())
            .unwrap_or_default();

        let geometry_dims: Vec<(&'static str, Dims)> = GEOMETRY_FIELDS
            .iter()
            .filter_map(|name| {
                let field = node.child_by_name(name)?;
                Some((*name, field.dimensions().iter().copied().collect()))
            })
            .collect();

        let layout = node
            .field_text(FIELD_LAYOUT)
            .or_else(|| node.text_attribute(ATTR_LAYOUT))
            .map(|layout| layout.trim().to_lowercase())
            .filter(|layout| !layout.is_empty());

        DetectorState {
            name: node.name().to_string(),
            path: path.to_string(),
            has_int_ids: id_field.is_some(),
            id_field_name: id_field.map(|field| field.name().to_string()),
            start_id: ids.first().copied(),
            end_id: ids.last().copied(),
            geometry_dims,
            geometry_name: node
                .child_by_class(CLASS_GEOMETRY)
                .map(|geometry| geometry.name().to_string()),
            layout,
        }
    }

    /// Common shape of the geometry fields.
    ///
    /// Return
    /// ------
    /// * `Ok(None)` when the detector carries no geometry field
    /// * [`IngestError::GeometryShapeMismatch`] naming the first field whose shape differs
    pub fn geometry_shape(&self) -> Result<Option<&[usize]>, IngestError> {
        let Some((_, expected)) = self.geometry_dims.first() else {
            return Ok(None);
        };

        match self
            .geometry_dims
            .iter()
            .find(|(_, dims)| dims != expected)
        {
            Some((field, found)) => Err(IngestError::GeometryShapeMismatch {
                detector: self.name.clone(),
                field: field.to_string(),
                expected: expected.to_vec(),
                found: found.to_vec(),
            }),
            None => Ok(Some(expected.as_slice())),
        }
    }
}
