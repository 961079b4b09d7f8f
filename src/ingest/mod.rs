//! # Ingestion pipeline
//!
//! Entry points that turn a node tree into [`DataSet`]s.
//!
//! ## Overview
//!
//! [`ingest_entry`] processes one entry into a caller-owned data set:
//!
//! 1. push the entry (and its instrument, if any) on the session registry,
//! 2. collect the data blocks matching the [`BlockSelection`],
//! 3. summarize them in [`EntryFacts`] and [`classify`] the entry,
//! 4. delegate to the [`LinkedEntryProcessor`] or the [`LegacyEntryProcessor`],
//! 5. copy the run-level attributes onto the new spectra.
//!
//! [`ingest_file`] walks every entry of a root node, plans one data set per label
//! group with [`plan_data_sets`] and runs [`ingest_entry`] for each plan.
//!
//! ## Errors
//!
//! Nothing here aborts on malformed input. Each failure is logged and recorded in
//! the returned [`IngestReport`]; the caller decides whether the accumulated
//! messages are fatal.
//!
//! ```rust
//! use nexingest::ingest::{ingest_entry, BlockSelection, IngestOptions};
//! use nexingest::{DataSet, FileState, MemNode};
//!
//! let entry = MemNode::group("entry", "NXentry").with_child(
//!     MemNode::group("monitor", "NXdata")
//!         .with_child(MemNode::field("data", vec![3.0, 4.0, 5.0])),
//! );
//!
//! let mut ds = DataSet::new();
//! let report = ingest_entry(
//!     &entry,
//!     "/entry",
//!     &mut FileState::new(),
//!     &IngestOptions::default(),
//!     &BlockSelection::All,
//!     &mut ds,
//! );
//!
//! assert!(report.is_success());
//! assert_eq!(ds.spectra()[0].y_values, vec![3.0, 4.0, 5.0]);
//! ```
pub mod data_block;
pub mod entry_attributes;
pub mod entry_processor;
pub mod link_resolver;
pub mod planner;
pub mod strategy;

use itertools::Itertools;
use tracing::{debug, warn};

use crate::constants::{GroupId, CLASS_DATA, CLASS_ENTRY, CLASS_INSTRUMENT};
use crate::dataset::DataSet;
use crate::ingest_errors::IngestError;
use crate::node::{join_path, NxNode};
use crate::state::{EntryState, FileRecord, FileState, InstrumentState, StateRecord};

use entry_attributes::apply_entry_attributes;
use entry_processor::{EntryContext, LegacyEntryProcessor, LinkedEntryProcessor, ProcessEntry};

pub use planner::{plan_data_sets, BlockSelection, DataSetPlan};
pub use strategy::{classify, EntryFacts, EntryStrategy};

/// Options of an ingestion run.
///
/// # Fields
///
/// * `first_group_id` - first default identifier of a file session (default 1); later
///   entries and data sets continue from the session counter
/// * `convert_units` - convert distances to meters, angles to radians and charges to
///   picocoulomb using the `units` attributes (default `true`)
/// * `histogram_offsets` - turn bin centres into boundaries for axis fields carrying a
///   `histogram_offset` attribute (default `true`)
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub first_group_id: GroupId,
    pub convert_units: bool,
    pub histogram_offsets: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            first_group_id: 1,
            convert_units: true,
            histogram_offsets: true,
        }
    }
}

impl IngestOptions {
    pub fn with_first_group_id(mut self, first_group_id: GroupId) -> Self {
        self.first_group_id = first_group_id;
        self
    }

    pub fn with_convert_units(mut self, convert_units: bool) -> Self {
        self.convert_units = convert_units;
        self
    }

    pub fn with_histogram_offsets(mut self, histogram_offsets: bool) -> Self {
        self.histogram_offsets = histogram_offsets;
        self
    }
}

/// Outcome of an ingestion step.
#[derive(Debug, Default, PartialEq)]
pub struct IngestReport {
    /// Strategy selected for the entry, once classified.
    pub strategy: Option<EntryStrategy>,
    pub spectra_added: usize,
    pub errors: Vec<IngestError>,
}

impl IngestReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&IngestError> {
        self.errors.first()
    }

    /// All error messages, joined with `"; "`.
    pub fn error_message(&self) -> String {
        self.errors.iter().join("; ")
    }

    pub fn push_error(&mut self, err: IngestError) {
        warn!("{err}");
        self.errors.push(err);
    }
}

/// Ingest one entry into `ds`.
///
/// Arguments
/// ---------
/// * `entry`: the entry node
/// * `entry_path`: its slash-separated path, e.g. `"/entry"`
/// * `file_state`: session state; its registry is restored to its previous depth on
///   return, its default identifier counter keeps advancing
/// * `options`: ingestion options
/// * `selection`: the data blocks to visit
/// * `ds`: the output data set, appended to
///
/// Return
/// ------
/// * The selected strategy, the number of spectra added and the errors met.
///   An entry without data block succeeds with zero spectra.
pub fn ingest_entry<N: NxNode>(
    entry: &N,
    entry_path: &str,
    file_state: &mut FileState,
    options: &IngestOptions,
    selection: &BlockSelection,
    ds: &mut DataSet,
) -> IngestReport {
    let record = StateRecord::Entry(EntryState::new(entry.name(), entry_path));
    file_state.scoped(record, |fs| match entry.child_by_class(CLASS_INSTRUMENT) {
        Some(instrument) => {
            let path = join_path(entry_path, instrument.name());
            let state = InstrumentState::from_node(instrument, &path);
            fs.scoped(StateRecord::Instrument(state), |fs| {
                run_entry(entry, entry_path, Some(instrument), fs, options, selection, ds)
            })
        }
        None => run_entry(entry, entry_path, None, fs, options, selection, ds),
    })
}

fn run_entry<N: NxNode>(
    entry: &N,
    entry_path: &str,
    instrument: Option<&N>,
    file_state: &mut FileState,
    options: &IngestOptions,
    selection: &BlockSelection,
    ds: &mut DataSet,
) -> IngestReport {
    let blocks: Vec<&N> = entry
        .children()
        .filter(|child| child.class() == CLASS_DATA && selection.matches(*child))
        .collect();

    let facts = EntryFacts::gather(entry_path, &blocks, file_state);
    let strategy = classify(&facts);
    debug!(entry = entry_path, ?strategy, ?facts, "entry strategy selected");

    let context = EntryContext {
        entry,
        path: entry_path,
        instrument,
        blocks: &blocks,
    };
    let first_spectrum = ds.len();

    let mut report = match strategy {
        EntryStrategy::NoDataNode => IngestReport::default(),
        EntryStrategy::LinkedModern | EntryStrategy::FixitOverridden => {
            LinkedEntryProcessor::new(options).process_entry(&context, file_state, ds)
        }
        EntryStrategy::LegacyUnlinked => {
            LegacyEntryProcessor::new(options).process_entry(&context, file_state, ds)
        }
    };

    if strategy != EntryStrategy::NoDataNode {
        apply_entry_attributes(&context, file_state, options, ds, first_spectrum);
    }
    report.strategy = Some(strategy);
    report
}

/// One data set produced by [`ingest_file`].
#[derive(Debug, PartialEq)]
pub struct IngestedDataSet {
    pub plan: DataSetPlan,
    pub data_set: DataSet,
    pub report: IngestReport,
}

/// Ingest every entry below `root`.
///
/// Entries are processed one after another in declaration order; each entry yields
/// one data set per [`DataSetPlan`]. Entries without data blocks yield nothing.
/// Default identifiers are unique across all data sets of the file.
pub fn ingest_file<N: NxNode>(
    root: &N,
    file_state: &mut FileState,
    options: &IngestOptions,
) -> Vec<IngestedDataSet> {
    let record = StateRecord::File(FileRecord {
        root_name: root.name().to_string(),
        file_name: file_state.file_name().map(str::to_string),
    });

    file_state.scoped(record, |fs| {
        let mut ingested = Vec::new();

        for entry in root.children().filter(|child| child.class() == CLASS_ENTRY) {
            let entry_path = join_path("", entry.name());
            let plans = plan_data_sets(entry);
            if plans.is_empty() {
                debug!(entry = %entry_path, "entry holds no data block");
                continue;
            }

            for plan in plans {
                let mut data_set = DataSet::new();
                data_set.title = plan.title.clone();
                let report = ingest_entry(
                    entry,
                    &entry_path,
                    fs,
                    options,
                    &plan.selection,
                    &mut data_set,
                );
                ingested.push(IngestedDataSet {
                    plan,
                    data_set,
                    report,
                });
            }
        }

        ingested
    })
}
