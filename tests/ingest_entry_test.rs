mod common;

use approx::assert_relative_eq;
use common::{data_block, detector, entry, instrument};
use itertools::Itertools;
use nexingest::ingest::{ingest_entry, BlockSelection, EntryStrategy, IngestOptions, IngestReport};
use nexingest::{DataSet, FileState, FixRecord, Fixit, IngestError, MemNode, NxValue};

fn ingest(entry: &MemNode, file_state: &mut FileState) -> (IngestReport, DataSet) {
    let mut ds = DataSet::new();
    let report = ingest_entry(
        entry,
        "/entry",
        file_state,
        &IngestOptions::default(),
        &BlockSelection::All,
        &mut ds,
    );
    assert!(file_state.registry().is_empty());
    (report, ds)
}

#[test]
fn test_default_ids_unique_and_increasing() {
    let entry = entry(
        "entry",
        [
            data_block("bank1", None, 3, 4),
            data_block("bank2", None, 2, 4),
            data_block("bank3", None, 5, 4),
        ],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert!(report.is_success(), "{}", report.error_message());
    assert_eq!(report.strategy, Some(EntryStrategy::LegacyUnlinked));
    assert_eq!(report.spectra_added, 10);

    let ids = ds.spectra().iter().map(|s| s.group_id).collect_vec();
    assert_eq!(ids, (1..=10).collect_vec());
    assert!(ids.iter().tuple_windows().all(|(a, b)| a < b));
}

#[test]
fn test_explicit_ids_take_precedence() {
    let entry = entry(
        "entry",
        [
            instrument([detector("bank1", Some(vec![1000, 1001, 1002]), 3)]),
            data_block("bank1", Some("bank1"), 3, 2),
            data_block("monitor", None, 1, 2),
        ],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert!(report.is_success(), "{}", report.error_message());
    assert_eq!(report.strategy, Some(EntryStrategy::LinkedModern));

    let ids = ds.spectra().iter().map(|s| s.group_id).collect_vec();
    // the monitor continues past the explicit identifiers
    assert_eq!(ids, vec![1000, 1001, 1002, 1003]);

    let geometry = ds.spectra()[1].geometry.unwrap();
    assert_relative_eq!(geometry.distance, 2.0);
    assert_relative_eq!(geometry.polar, 20.0_f64.to_radians());
    assert!(ds.spectra()[3].geometry.is_none());
}

#[test]
fn test_link_miss_is_tolerated() {
    let entry = entry(
        "entry",
        [
            instrument([detector("bank1", Some(vec![7, 8]), 2)]),
            data_block("bank9", Some("bank9"), 2, 3),
        ],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert!(report.is_success());
    assert_eq!(report.strategy, Some(EntryStrategy::LinkedModern));
    assert_eq!(ds.len(), 2);
    assert!(ds.spectra().iter().all(|s| s.geometry.is_none()));
    assert_eq!(ds.spectra()[0].group_id, 1);
}

#[test]
fn test_partial_failure_isolation() {
    let broken = MemNode::group("broken", "NXdata")
        .with_child(MemNode::field("time_of_flight", vec![1.0]).with_attr("axis", 1));
    let entry = entry(
        "entry",
        [broken, data_block("bank1", None, 2, 3)],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert!(!report.is_success());
    assert_eq!(
        report.first_error(),
        Some(&IngestError::MissingPrimaryData("/entry/broken".into()))
    );
    assert!(report.error_message().contains("/entry/broken"));
    assert_eq!(report.spectra_added, 2);
    assert_eq!(ds.len(), 2);
    assert!(ds
        .spectra()
        .iter()
        .all(|s| s.attribute("data_block") == Some(&NxValue::from("bank1"))));
}

#[test]
fn test_geometry_shape_mismatch_fails_attachment_only() {
    let bad_detector = MemNode::group("bank1", "NXdetector")
        .with_child(MemNode::field("distance", vec![2.0, 2.0]))
        .with_child(MemNode::field("polar_angle", vec![0.1, 0.2, 0.3]));
    let entry = entry(
        "entry",
        [
            instrument([bad_detector]),
            data_block("bank1", Some("bank1"), 2, 3),
        ],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert_eq!(ds.len(), 2);
    assert!(ds.spectra().iter().all(|s| s.geometry.is_none()));
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].is_geometry_error());
}

#[test]
fn test_oversized_block_does_not_abort_entry() {
    let huge = MemNode::group("huge", "NXdata").with_child(
        MemNode::field("data", vec![0.0; 8])
            .with_dims([usize::MAX, 4, 2])
            .with_attr("signal", 1),
    );
    let entry = entry("entry", [huge, data_block("bank1", None, 2, 3)]);

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert_eq!(
        report.errors,
        vec![IngestError::DimensionOverflow {
            block: "/entry/huge".into(),
            dims: vec![usize::MAX, 4, 2],
        }]
    );
    assert_eq!(report.spectra_added, 2);
    let ids = ds.spectra().iter().map(|s| s.group_id).collect_vec();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_explicit_id_at_range_end() {
    let entry = entry(
        "entry",
        [
            instrument([detector("bank1", Some(vec![i64::MAX]), 1)]),
            data_block("bank1", Some("bank1"), 1, 2),
            data_block("monitor", None, 1, 2),
        ],
    );

    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert_eq!(ds.len(), 1);
    assert_eq!(ds.spectra()[0].group_id, i64::MAX);
    assert_eq!(
        report.errors,
        vec![IngestError::GroupIdOverflow("/entry/monitor".into())]
    );
}

#[test]
fn test_no_data_node() {
    let entry = entry("entry", [instrument([])]);
    let (report, ds) = ingest(&entry, &mut FileState::new());

    assert!(report.is_success());
    assert_eq!(report.strategy, Some(EntryStrategy::NoDataNode));
    assert!(ds.is_empty());
    assert!(ds.attribute("run_number").is_none());
}

#[test]
fn test_fixit_override_selects_axis() {
    // axis attributes point at a bogus field; the override restores the real one
    let block = MemNode::group("bank1", "NXdata")
        .with_child(MemNode::field("bogus", vec![0.0]).with_attr("axis", 1))
        .with_child(MemNode::field("tof", vec![5.0, 6.0]).with_attr("units", "microsecond"))
        .with_child(MemNode::field("data", vec![1.0, 2.0]).with_attr("signal", 1));
    let entry = entry("entry", [block]);

    let mut file_state = FileState::new().with_file_name("/data/SCD_1.nxs").with_fixit(
        Fixit::default().with_run_fix("SCD_1.nxs", FixRecord::new("/entry/bank1", "axis1", "tof")),
    );
    let (report, ds) = ingest(&entry, &mut file_state);

    assert_eq!(report.strategy, Some(EntryStrategy::FixitOverridden));
    assert_eq!(ds.spectra()[0].x_values, vec![5.0, 6.0]);
    assert_eq!(ds.x_units, "microsecond");

    // the same tree under another file name keeps its dialect
    let mut other = FileState::new().with_file_name("other.nxs").with_fixit(
        Fixit::default().with_run_fix("SCD_1.nxs", FixRecord::new("/entry/bank1", "axis1", "tof")),
    );
    let (report, ds) = ingest(&entry, &mut other);
    assert_eq!(report.strategy, Some(EntryStrategy::LegacyUnlinked));
    assert_eq!(ds.spectra()[0].x_values, vec![0.0]);
}

#[test]
fn test_entry_attributes_reach_spectra() {
    let entry = entry(
        "entry",
        [
            instrument([detector("bank1", None, 2)]),
            data_block("bank1", Some("bank1"), 2, 2),
        ],
    );

    let (_, ds) = ingest(&entry, &mut FileState::new());

    assert_eq!(ds.attribute("run_number"), Some(&NxValue::Int(42)));
    assert_eq!(
        ds.attribute("run_title"),
        Some(&NxValue::from("integration run"))
    );
    assert_eq!(ds.attribute("initial_path"), Some(&NxValue::Float(9.5)));
    assert!(ds
        .spectra()
        .iter()
        .all(|s| s.attribute("run_number") == Some(&NxValue::Int(42))));
    assert_eq!(ds.title, "bank1");
    assert_eq!(ds.x_label, "Time of flight");
    assert_eq!(ds.y_units, "counts");
}
