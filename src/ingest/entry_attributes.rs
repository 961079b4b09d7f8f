//! # Run-level attributes
//!
//! After its data blocks are processed, an entry contributes its run metadata to
//! the data set and to every spectrum it emitted:
//!
//! | key                | source                                                  |
//! |--------------------|---------------------------------------------------------|
//! | `run_number`       | `run_number` field of the entry                         |
//! | `run_title`        | `title` field of the entry                              |
//! | `number_of_pulses` | `duration` field × 30 pulses per second                 |
//! | `proton_charge`    | `proton_charge` field, in picocoulomb                   |
//! | `initial_path`     | `initial_path` override, else distance of the `NXsource` |
use tracing::warn;

use crate::constants::{
    ATTR_UNITS, CLASS_SOURCE, DS_INITIAL_PATH, DS_NUMBER_OF_PULSES, DS_PROTON_CHARGE,
    DS_RUN_NUMBER, DS_RUN_TITLE, FIELD_DISTANCE, FIELD_DURATION, FIELD_PROTON_CHARGE,
    FIELD_RUN_NUMBER, FIELD_TITLE, FIX_INITIAL_PATH, PULSES_PER_SECOND,
};
use crate::conversion::{charge_factor, length_factor};
use crate::dataset::{AttributeMap, DataSet};
use crate::node::{NxNode, NxValue};
use crate::state::FileState;

use super::entry_processor::EntryContext;
use super::IngestOptions;

/// Value of `field`, scaled by the factor of its `units` attribute.
fn scaled_field<N: NxNode>(
    node: &N,
    field: &str,
    factor: fn(&str) -> f64,
    options: &IngestOptions,
) -> Option<f64> {
    let field = node.child_by_name(field)?;
    let value = field.value()?.as_f64()?;
    let factor = match field.text_attribute(ATTR_UNITS) {
        Some(units) if options.convert_units => factor(&units),
        _ => 1.0,
    };
    Some(value * factor)
}

fn initial_path<N: NxNode>(
    context: &EntryContext<'_, N>,
    file_state: &FileState,
    options: &IngestOptions,
) -> Option<f64> {
    let source_distance = context
        .instrument
        .and_then(|instrument| instrument.child_by_class(CLASS_SOURCE))
        .and_then(|source| scaled_field(source, FIELD_DISTANCE, length_factor, options))
        .map(f64::abs);

    let current = source_distance.map(|distance| distance.to_string());
    match file_state.fix_for(context.path, FIX_INITIAL_PATH, current.as_deref()) {
        Some(fixed) => match fixed.trim().parse::<f64>() {
            Ok(path) => Some(path),
            Err(_) => {
                warn!(entry = context.path, value = fixed, "unparsable initial path override");
                source_distance
            }
        },
        None => source_distance,
    }
}

/// Run-level attributes of an entry.
pub fn entry_attributes<N: NxNode>(
    context: &EntryContext<'_, N>,
    file_state: &FileState,
    options: &IngestOptions,
) -> AttributeMap {
    let entry = context.entry;
    let mut attributes = AttributeMap::new();

    if let Some(run_number) = entry
        .field_i64s(FIELD_RUN_NUMBER)
        .and_then(|values| values.first().copied())
    {
        attributes.insert(DS_RUN_NUMBER.into(), NxValue::Int(run_number));
    }
    if let Some(title) = entry
        .field_text(FIELD_TITLE)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
    {
        attributes.insert(DS_RUN_TITLE.into(), NxValue::Text(title));
    }
    if let Some(duration) = entry.field_f64(FIELD_DURATION) {
        let pulses = (duration * PULSES_PER_SECOND).round() as i64;
        attributes.insert(DS_NUMBER_OF_PULSES.into(), NxValue::Int(pulses));
    }
    if let Some(charge) = scaled_field(entry, FIELD_PROTON_CHARGE, charge_factor, options) {
        attributes.insert(DS_PROTON_CHARGE.into(), NxValue::Float(charge));
    }
    if let Some(path) = initial_path(context, file_state, options) {
        attributes.insert(DS_INITIAL_PATH.into(), NxValue::Float(path));
    }

    attributes
}

/// Copy the run-level attributes onto the data set and onto the spectra appended
/// since `first_spectrum`.
pub fn apply_entry_attributes<N: NxNode>(
    context: &EntryContext<'_, N>,
    file_state: &FileState,
    options: &IngestOptions,
    ds: &mut DataSet,
    first_spectrum: usize,
) {
    let attributes = entry_attributes(context, file_state, options);

    for (name, value) in &attributes {
        ds.set_attribute(name.as_str(), value.clone());
    }
    for spectrum in ds.spectra_since_mut(first_spectrum) {
        spectrum.attributes.extend(attributes.clone());
    }
}
