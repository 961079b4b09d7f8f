mod common;

use common::{data_block, detector, entry, instrument, root};
use nexingest::ingest::{ingest_file, BlockSelection, EntryStrategy, IngestOptions};
use nexingest::{FileState, Fixit, MemNode, NxNode, NxValue};

fn labeled(block: MemNode, label: &str) -> MemNode {
    let name = block.name().to_string();
    let mut relabeled = MemNode::group(name, "NXdata");
    for child in block.children() {
        let child = if child.name() == "data" {
            child.clone().with_attr("label", label)
        } else {
            child.clone()
        };
        relabeled.push_child(child);
    }
    relabeled
}

#[test]
fn test_blocks_sharing_a_label_merge() {
    let tree = root([entry(
        "entry",
        [
            instrument([
                detector("bank1", Some(vec![1, 2]), 2),
                detector("bank2", Some(vec![3, 4, 5]), 3),
            ]),
            labeled(data_block("bank1", Some("bank1"), 2, 4), "banks"),
            data_block("monitor", None, 1, 4),
            labeled(data_block("bank2", Some("bank2"), 3, 4), "banks"),
        ],
    )]);

    let ingested = ingest_file(&tree, &mut FileState::new(), &IngestOptions::default());

    assert_eq!(ingested.len(), 2);

    let banks = &ingested[0];
    assert_eq!(banks.plan.selection, BlockSelection::Label("banks".into()));
    assert_eq!(banks.plan.blocks, vec!["bank1", "bank2"]);
    assert_eq!(banks.data_set.title, "banks");
    assert_eq!(banks.report.strategy, Some(EntryStrategy::LinkedModern));
    assert_eq!(banks.data_set.len(), 5);
    assert_eq!(
        banks.data_set.attribute("label"),
        Some(&NxValue::from("banks"))
    );
    let ids: Vec<_> = banks.data_set.spectra().iter().map(|s| s.group_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let monitor = &ingested[1];
    assert_eq!(monitor.plan.selection, BlockSelection::Block("monitor".into()));
    assert_eq!(monitor.report.strategy, Some(EntryStrategy::LegacyUnlinked));
    assert_eq!(monitor.data_set.len(), 1);
    // the monitor continues after the explicit bank identifiers
    assert_eq!(monitor.data_set.spectra()[0].group_id, 6);
}

#[test]
fn test_default_ids_unique_across_data_sets() {
    let tree = root([
        entry(
            "entry",
            [data_block("bank1", None, 2, 3), data_block("bank2", None, 2, 3)],
        ),
        entry("entry_1", [data_block("monitor", None, 3, 3)]),
    ]);

    let mut file_state = FileState::new();
    let ingested = ingest_file(&tree, &mut file_state, &IngestOptions::default());

    let ids: Vec<Vec<i64>> = ingested
        .iter()
        .map(|ds| ds.data_set.spectra().iter().map(|s| s.group_id).collect())
        .collect();
    assert_eq!(ids, vec![vec![1, 2], vec![3, 4], vec![5, 6, 7]]);
    assert!(ingested.iter().all(|ds| ds.report.is_success()));
}

#[test]
fn test_first_group_id_starts_the_file() {
    let tree = root([entry(
        "entry",
        [data_block("bank1", None, 2, 3), data_block("bank2", None, 1, 3)],
    )]);

    let options = IngestOptions::default().with_first_group_id(100);
    let ingested = ingest_file(&tree, &mut FileState::new(), &options);

    let ids: Vec<_> = ingested
        .iter()
        .flat_map(|ds| ds.data_set.spectra().iter().map(|s| s.group_id))
        .collect();
    assert_eq!(ids, vec![100, 101, 102]);
}

#[test]
fn test_strategy_is_selected_per_entry() {
    let tree = root([
        entry(
            "modern",
            [
                instrument([detector("bank1", None, 2)]),
                data_block("bank1", Some("bank1"), 2, 3),
            ],
        ),
        entry("legacy", [data_block("data", None, 2, 3)]),
        entry("empty", []),
    ]);

    let mut file_state = FileState::new();
    let ingested = ingest_file(&tree, &mut file_state, &IngestOptions::default());

    let strategies: Vec<_> = ingested
        .iter()
        .map(|ds| (ds.plan.entry_name.as_str(), ds.report.strategy))
        .collect();
    assert_eq!(
        strategies,
        vec![
            ("modern", Some(EntryStrategy::LinkedModern)),
            ("legacy", Some(EntryStrategy::LegacyUnlinked)),
        ]
    );
    assert!(ingested[0].data_set.spectra()[0].geometry.is_some());
    assert!(ingested[1].data_set.spectra()[0].geometry.is_none());
    assert!(file_state.registry().is_empty());
}

#[test]
fn test_fixit_document_drives_link_and_path() {
    let xml = r#"
        <Fixit>
          <Common>
            <Fix path="/entry" attribute="initial_path" value="11.0"/>
          </Common>
          <Runs>
            <Run filename="run_7.nxs">
              <Fix path="/entry/bank1" attribute="link" value="bank2" expected="bank1"/>
            </Run>
          </Runs>
        </Fixit>
    "#;
    let fixit = Fixit::from_xml_str(xml).unwrap();

    let tree = root([entry(
        "entry",
        [
            instrument([
                detector("bank1", Some(vec![10, 11]), 2),
                detector("bank2", Some(vec![20, 21]), 2),
            ]),
            data_block("bank1", Some("bank1"), 2, 3),
        ],
    )]);

    let mut file_state = FileState::new()
        .with_file_name("run_7.nxs")
        .with_fixit(fixit);
    let ingested = ingest_file(&tree, &mut file_state, &IngestOptions::default());

    let data_set = &ingested[0].data_set;
    let ids: Vec<_> = data_set.spectra().iter().map(|s| s.group_id).collect();
    assert_eq!(ids, vec![20, 21]);
    assert_eq!(
        data_set.attribute("initial_path"),
        Some(&NxValue::Float(11.0))
    );
}
