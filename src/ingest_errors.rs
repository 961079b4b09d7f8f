use thiserror::Error;

/// Failures raised while interpreting a node tree.
///
/// Structural errors (missing primary data, missing dimensions) are fatal to the
/// data block that raised them. Geometry errors are fatal to the attachment of
/// detector attributes only. Fixit errors come from loading an override file.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No primary data field in data block {0}")]
    MissingPrimaryData(String),

    #[error("Primary data field of {0} has no dimensions")]
    MissingDimensions(String),

    #[error("Data block {block} holds {found} values, dimensions {dims:?} need {expected}")]
    DataLengthMismatch {
        block: String,
        dims: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("Dimensions {dims:?} of data block {block} overflow the addressable size")]
    DimensionOverflow { block: String, dims: Vec<usize> },

    #[error("Default identifiers of data block {0} overflow the identifier range")]
    GroupIdOverflow(String),

    #[error("Detector {detector}: field {field} has shape {found:?}, expected {expected:?}")]
    GeometryShapeMismatch {
        detector: String,
        field: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Detector {detector}: {field} has {len} values for the {rows} rows of {block}")]
    GeometryRowMismatch {
        detector: String,
        block: String,
        field: String,
        rows: usize,
        len: usize,
    },

    #[error("No {0} state registered")]
    MissingState(&'static str),

    #[error("Unable to read fixit file: {0}")]
    FixitIo(#[from] std::io::Error),

    #[error("Malformed fixit document: {0}")]
    FixitParse(#[from] quick_xml::DeError),

    #[error("Invalid fixit entry: {0}")]
    InvalidFixitEntry(String),
}

impl PartialEq for IngestError {
    fn eq(&self, other: &Self) -> bool {
        use IngestError::*;
        match (self, other) {
            (MissingPrimaryData(a), MissingPrimaryData(b)) => a == b,
            (MissingDimensions(a), MissingDimensions(b)) => a == b,
            (
                DataLengthMismatch {
                    block: a,
                    dims: da,
                    expected: ea,
                    found: fa,
                },
                DataLengthMismatch {
                    block: b,
                    dims: db,
                    expected: eb,
                    found: fb,
                },
            ) => a == b && da == db && ea == eb && fa == fb,
            (
                DimensionOverflow { block: a, dims: da },
                DimensionOverflow { block: b, dims: db },
            ) => a == b && da == db,
            (GroupIdOverflow(a), GroupIdOverflow(b)) => a == b,
            (
                GeometryShapeMismatch {
                    detector: a,
                    field: fa,
                    expected: ea,
                    found: xa,
                },
                GeometryShapeMismatch {
                    detector: b,
                    field: fb,
                    expected: eb,
                    found: xb,
                },
            ) => a == b && fa == fb && ea == eb && xa == xb,
            (
                GeometryRowMismatch {
                    detector: a,
                    block: ba,
                    field: fa,
                    rows: ra,
                    len: la,
                },
                GeometryRowMismatch {
                    detector: b,
                    block: bb,
                    field: fb,
                    rows: rb,
                    len: lb,
                },
            ) => a == b && ba == bb && fa == fb && ra == rb && la == lb,
            (MissingState(a), MissingState(b)) => a == b,
            (InvalidFixitEntry(a), InvalidFixitEntry(b)) => a == b,

            // I/O and XML errors carry no comparable payload
            (FixitIo(_), FixitIo(_)) => true,
            (FixitParse(_), FixitParse(_)) => true,

            _ => false,
        }
    }
}

impl IngestError {
    /// `true` when the error only affected the attachment of detector geometry.
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            IngestError::GeometryShapeMismatch { .. } | IngestError::GeometryRowMismatch { .. }
        )
    }
}
