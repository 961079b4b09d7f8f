//! # Entry processors
//!
//! An entry processor walks the selected data blocks of one entry. For every block
//! it builds a [`DataBlockState`], optionally resolves the linked detector, pushes
//! both records for the duration of the block and hands over to the
//! [`DataBlockProcessor`].
//!
//! Two processors exist:
//!
//! * [`LinkedEntryProcessor`] resolves detector links and honours explicit
//!   identifier arrays. It serves the `LinkedModern` and `FixitOverridden`
//!   strategies.
//! * [`LegacyEntryProcessor`] serves `LegacyUnlinked` entries: no link resolution,
//!   default identifiers only, no geometry.
//!
//! A failing block is reported and skipped; the remaining blocks are still processed.
//! Default identifiers continue from the counter stored in the [`FileState`].
use tracing::warn;

use crate::dataset::DataSet;
use crate::node::{join_path, NxNode};
use crate::state::{DataBlockState, DetectorState, FileState, StateRecord};

use super::data_block::DataBlockProcessor;
use super::link_resolver::resolve_detector;
use super::{IngestOptions, IngestReport};

/// The nodes an entry processor works on.
#[derive(Debug)]
pub struct EntryContext<'a, N> {
    pub entry: &'a N,
    pub path: &'a str,
    pub instrument: Option<&'a N>,
    /// Data blocks selected for the output data set, in declaration order.
    pub blocks: &'a [&'a N],
}

/// Processing of all selected data blocks of one entry.
pub trait ProcessEntry {
    fn process_entry<N: NxNode>(
        &self,
        context: &EntryContext<'_, N>,
        file_state: &mut FileState,
        ds: &mut DataSet,
    ) -> IngestReport;
}

/// Link-aware processor.
#[derive(Debug, Clone, Copy)]
pub struct LinkedEntryProcessor<'a> {
    options: &'a IngestOptions,
}

impl<'a> LinkedEntryProcessor<'a> {
    pub fn new(options: &'a IngestOptions) -> Self {
        LinkedEntryProcessor { options }
    }
}

impl ProcessEntry for LinkedEntryProcessor<'_> {
    fn process_entry<N: NxNode>(
        &self,
        context: &EntryContext<'_, N>,
        file_state: &mut FileState,
        ds: &mut DataSet,
    ) -> IngestReport {
        process_blocks(context, file_state, ds, self.options, true)
    }
}

/// Processor for files predating the link convention.
#[derive(Debug, Clone, Copy)]
pub struct LegacyEntryProcessor<'a> {
    options: &'a IngestOptions,
}

impl<'a> LegacyEntryProcessor<'a> {
    pub fn new(options: &'a IngestOptions) -> Self {
        LegacyEntryProcessor { options }
    }
}

impl ProcessEntry for LegacyEntryProcessor<'_> {
    fn process_entry<N: NxNode>(
        &self,
        context: &EntryContext<'_, N>,
        file_state: &mut FileState,
        ds: &mut DataSet,
    ) -> IngestReport {
        process_blocks(context, file_state, ds, self.options, false)
    }
}

fn process_blocks<N: NxNode>(
    context: &EntryContext<'_, N>,
    file_state: &mut FileState,
    ds: &mut DataSet,
    options: &IngestOptions,
    link_aware: bool,
) -> IngestReport {
    let mut report = IngestReport::default();
    let mut counter = file_state.group_ids(options.first_group_id);
    let processor = DataBlockProcessor::new(options, link_aware);

    for &block in context.blocks {
        let path = join_path(context.path, block.name());
        let state = DataBlockState::from_node(block, &path, counter.peek(), file_state);

        let detector = match (
            link_aware,
            context.instrument,
            file_state.registry().latest_instrument(),
        ) {
            (true, Some(instrument), Some(instrument_state)) => {
                resolve_detector(&state, instrument, instrument_state)
                    .map(|node| (node, join_path(&instrument_state.path, node.name())))
            }
            _ => None,
        };
        if link_aware && detector.is_none() {
            if let Some(link) = &state.link_name {
                warn!(block = %path, link = %link, "linked detector not found, no geometry attached");
            }
        }

        let result = file_state.scoped(StateRecord::DataBlock(state), |fs| match &detector {
            Some((node, detector_path)) => {
                let detector_state = DetectorState::from_node(*node, detector_path);
                fs.scoped(StateRecord::Detector(detector_state), |fs| {
                    processor.process(block, Some(*node), fs.registry(), &mut counter, ds)
                })
            }
            None => processor.process(block, None, fs.registry(), &mut counter, ds),
        });

        match result {
            Ok(outcome) => {
                report.spectra_added += outcome.emitted;
                if let Some(err) = outcome.geometry_error {
                    report.push_error(err);
                }
            }
            Err(err) => report.push_error(err),
        }
    }

    file_state.set_group_ids(counter);
    report
}

#[cfg(test)]
mod entry_processor_test {
    use super::*;
    use crate::ingest_errors::IngestError;
    use crate::node::MemNode;
    use crate::state::{EntryState, InstrumentState};

    fn entry() -> MemNode {
        MemNode::group("entry", "NXentry")
            .with_child(
                MemNode::group("instrument", "NXinstrument").with_child(
                    MemNode::group("bank1", "NXdetector")
                        .with_child(MemNode::field("id", vec![40_i64, 41]))
                        .with_child(MemNode::field("distance", vec![1.0, 1.0]))
                        .with_child(MemNode::field("polar_angle", vec![0.1, 0.2])),
                ),
            )
            .with_child(
                MemNode::group("broken", "NXdata")
                    .with_child(MemNode::field("tof", vec![1.0]).with_attr("axis", 1)),
            )
            .with_child(
                MemNode::group("bank1", "NXdata")
                    .with_child(
                        MemNode::field("tof", vec![1.0, 2.0])
                            .with_attr("axis", 1)
                            .with_attr("link", "bank1"),
                    )
                    .with_child(MemNode::field("data", vec![1.0; 4]).with_dims([2, 2])),
            )
    }

    fn run(processor: &impl ProcessEntry, entry: &MemNode) -> (IngestReport, DataSet) {
        let instrument = entry.child_by_name("instrument").unwrap();
        let blocks: Vec<&MemNode> = entry
            .children()
            .filter(|child| child.class() == "NXdata")
            .collect();
        let context = EntryContext {
            entry,
            path: "/entry",
            instrument: Some(instrument),
            blocks: &blocks,
        };

        let mut file_state = FileState::new();
        let mut ds = DataSet::new();
        let report = file_state.scoped(
            StateRecord::Entry(EntryState::new("entry", "/entry")),
            |fs| {
                let state = InstrumentState::from_node(instrument, "/entry/instrument");
                fs.scoped(StateRecord::Instrument(state), |fs| {
                    processor.process_entry(&context, fs, &mut ds)
                })
            },
        );
        assert!(file_state.registry().is_empty());
        (report, ds)
    }

    #[test]
    fn test_linked_processor() {
        let options = IngestOptions::default();
        let (report, ds) = run(&LinkedEntryProcessor::new(&options), &entry());

        assert_eq!(report.spectra_added, 2);
        assert_eq!(
            report.errors,
            vec![IngestError::MissingPrimaryData("/entry/broken".into())]
        );
        let ids: Vec<_> = ds.spectra().iter().map(|s| s.group_id).collect();
        assert_eq!(ids, vec![40, 41]);
        assert!(ds.spectra().iter().all(|s| s.geometry.is_some()));
    }

    #[test]
    fn test_legacy_processor() {
        let options = IngestOptions::default().with_first_group_id(10);
        let (report, ds) = run(&LegacyEntryProcessor::new(&options), &entry());

        assert_eq!(report.spectra_added, 2);
        assert!(!report.is_success());
        let ids: Vec<_> = ds.spectra().iter().map(|s| s.group_id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(ds.spectra().iter().all(|s| s.geometry.is_none()));
    }
}
