//! # Link resolution
//!
//! A data block written by a modern producer links its axis fields from the
//! detector subtree that recorded them, and the link leaves a `link`/`target`
//! attribute behind on the field. [`DataBlockState`] records the name found
//! there; this module turns it back into the detector node.
//!
//! Resolution is a first-match linear scan over the detector subtrees of one
//! instrument. A miss is not an error: monitors and older files simply carry no
//! geometry.
use crate::node::NxNode;
use crate::state::{DataBlockState, InstrumentState};

/// Name of the subtree a link attribute points to.
///
/// Arguments
/// ---------
/// * `value`: the attribute value, either a bare name or a slash-separated path
/// * `field_name`: the name of the field carrying the attribute
///
/// Return
/// ------
/// * For a path ending in `field_name`, the segment before it (the group the field
///   was linked from); otherwise the last segment. `None` for an empty value.
pub fn link_target_name(value: &str, field_name: &str) -> Option<String> {
    let mut segments = value
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .rev();

    let last = segments.next()?;
    if last == field_name {
        if let Some(parent) = segments.next() {
            return Some(parent.to_string());
        }
    }
    Some(last.to_string())
}

/// Find the detector subtree a data block is linked to.
///
/// Arguments
/// ---------
/// * `block`: the data block state carrying the link name
/// * `instrument`: the instrument node holding the detector subtrees
/// * `instrument_state`: the detector index built from `instrument`
///
/// Return
/// ------
/// * The first detector whose name equals the link name, `None` when the block has
///   no link name or nothing matches
pub fn resolve_detector<'n, N: NxNode>(
    block: &DataBlockState,
    instrument: &'n N,
    instrument_state: &InstrumentState,
) -> Option<&'n N> {
    let link_name = block.link_name.as_deref()?;
    instrument_state
        .detectors
        .iter()
        .find(|(_, name)| name == link_name)
        .and_then(|(index, _)| instrument.child(*index))
}
