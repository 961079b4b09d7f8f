//! # Interpretation state
//!
//! While descending a file tree (file → entry → instrument → data block → detector)
//! the pipeline records what it learned about each visited subtree in a typed
//! [`StateRecord`]. Records live on a [`StateRegistry`] stack owned by the
//! [`FileState`] of the interpretation session.
//!
//! ## Scoping
//!
//! Records are pushed on entry to a subtree and dropped when the call that pushed
//! them returns. [`FileState::scoped`] enforces this: whatever the closure pushes
//! (and forgets to pop) is truncated away on return, so nothing below a data block
//! outlives the block.
//!
//! ## Lookup
//!
//! Components query "the most recent record of kind X" through the `latest_*`
//! helpers of [`StateRegistry`] instead of inspecting record types at run time.
//!
//! ## Overrides
//!
//! A [`FileState`] optionally owns a [`Fixit`] description. [`FileState::fix_for`]
//! is the single entry point the records use to consult it.
//!
//! ## Identifiers
//!
//! The session also carries the default identifier counter, so that default
//! identifiers never repeat within one file.
pub mod data_block_state;
pub mod detector_state;

use smallvec::SmallVec;

use crate::fixit::Fixit;
use crate::ingest::data_block::GroupIdCounter;
use crate::node::NxNode;

pub use data_block_state::DataBlockState;
pub use detector_state::DetectorState;

use crate::constants::{GroupId, CLASS_DETECTOR};

/// Shape of a field; at most four dimensions in practice.
pub type Dims = SmallVec<[usize; 4]>;

/// Identification of the interpreted file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub root_name: String,
    pub file_name: Option<String>,
}

/// Per-entry record.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryState {
    pub name: String,
    pub path: String,
}

impl EntryState {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        EntryState {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Per-instrument record: the detector subtrees a link name may refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentState {
    pub name: String,
    pub path: String,
    /// `(child index, name)` of every detector subtree, in declaration order.
    pub detectors: Vec<(usize, String)>,
}

impl InstrumentState {
    pub fn from_node<N: NxNode>(node: &N, path: &str) -> Self {
        let detectors = node
            .children()
            .enumerate()
            .filter(|(_, child)| child.class() == CLASS_DETECTOR)
            .map(|(index, child)| (index, child.name().to_string()))
            .collect();

        InstrumentState {
            name: node.name().to_string(),
            path: path.to_string(),
            detectors,
        }
    }
}

/// One record of the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum StateRecord {
    File(FileRecord),
    Entry(EntryState),
    Instrument(InstrumentState),
    DataBlock(DataBlockState),
    Detector(DetectorState),
}

/// Stack of the records pushed during descent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateRegistry {
    records: Vec<StateRecord>,
}

impl StateRegistry {
    pub fn push(&mut self, record: StateRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<StateRecord> {
        self.records.pop()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn truncate(&mut self, depth: usize) {
        self.records.truncate(depth);
    }

    /// Records from the most recent to the oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = &StateRecord> {
        self.records.iter().rev()
    }

    pub fn latest_file(&self) -> Option<&FileRecord> {
        self.iter_recent().find_map(|record| match record {
            StateRecord::File(state) => Some(state),
            _ => None,
        })
    }

    pub fn latest_entry(&self) -> Option<&EntryState> {
        self.iter_recent().find_map(|record| match record {
            StateRecord::Entry(state) => Some(state),
            _ => None,
        })
    }

    pub fn latest_instrument(&self) -> Option<&InstrumentState> {
        self.iter_recent().find_map(|record| match record {
            StateRecord::Instrument(state) => Some(state),
            _ => None,
        })
    }

    pub fn latest_data_block(&self) -> Option<&DataBlockState> {
        self.iter_recent().find_map(|record| match record {
            StateRecord::DataBlock(state) => Some(state),
            _ => None,
        })
    }

    pub fn latest_detector(&self) -> Option<&DetectorState> {
        self.iter_recent().find_map(|record| match record {
            StateRecord::Detector(state) => Some(state),
            _ => None,
        })
    }
}

/// State of one file-interpretation session.
///
/// A session owns its registry and the default identifier counter; independent
/// files must use independent `FileState`s.
#[derive(Debug, Clone, Default)]
pub struct FileState {
    file_name: Option<String>,
    fixit: Option<Fixit>,
    registry: StateRegistry,
    group_ids: Option<GroupIdCounter>,
}

impl FileState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the interpreted file; selects the run-specific fixes.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_fixit(mut self, fixit: Fixit) -> Self {
        self.fixit = Some(fixit);
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn fixit(&self) -> Option<&Fixit> {
        self.fixit.as_ref()
    }

    /// Replacement value for `attribute` at `path`, if an override applies.
    pub fn fix_for(&self, path: &str, attribute: &str, current: Option<&str>) -> Option<&str> {
        self.fixit
            .as_ref()?
            .lookup(self.file_name.as_deref(), path, attribute, current)
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    /// Default identifier counter of the session.
    ///
    /// Starts at `first` until a data block stores a counter with
    /// [`FileState::set_group_ids`]; from then on `first` is ignored, so default
    /// identifiers stay unique across the entries and data sets of one file.
    pub fn group_ids(&self, first: GroupId) -> GroupIdCounter {
        self.group_ids.unwrap_or_else(|| GroupIdCounter::new(first))
    }

    pub fn set_group_ids(&mut self, counter: GroupIdCounter) {
        self.group_ids = Some(counter);
    }

    /// Run `f` with `record` pushed on the registry.
    ///
    /// The registry is restored to its previous depth when `f` returns, which
    /// discards `record` and anything `f` pushed on top of it.
    pub fn scoped<R>(&mut self, record: StateRecord, f: impl FnOnce(&mut FileState) -> R) -> R {
        let depth = self.registry.len();
        self.registry.push(record);
        let result = f(self);
        self.registry.truncate(depth);
        result
    }
}

#[cfg(test)]
mod state_test {
    use super::*;
    use crate::fixit::FixRecord;
    use crate::node::MemNode;

    #[test]
    fn test_scoped_restores_depth() {
        let mut state = FileState::new();
        let depth = state.scoped(
            StateRecord::Entry(EntryState::new("entry", "/entry")),
            |fs| {
                assert_eq!(fs.registry().latest_entry().unwrap().name, "entry");
                fs.scoped(
                    StateRecord::Entry(EntryState::new("inner", "/inner")),
                    |fs| {
                        // leaked push, truncated by the enclosing scope
                        fs.registry.push(StateRecord::Entry(EntryState::new("x", "/x")));
                        fs.registry().len()
                    },
                )
            },
        );

        assert_eq!(depth, 3);
        assert!(state.registry().is_empty());
        assert!(state.registry().latest_entry().is_none());
    }

    #[test]
    fn test_latest_lookup_is_most_recent() {
        let mut registry = StateRegistry::default();
        registry.push(StateRecord::File(FileRecord {
            root_name: "root".into(),
            file_name: None,
        }));
        registry.push(StateRecord::Entry(EntryState::new("a", "/a")));
        registry.push(StateRecord::Entry(EntryState::new("b", "/b")));

        assert_eq!(registry.latest_entry().unwrap().name, "b");
        assert_eq!(registry.latest_file().unwrap().root_name, "root");
        assert!(registry.latest_detector().is_none());

        registry.pop();
        assert_eq!(registry.latest_entry().unwrap().name, "a");
    }

    #[test]
    fn test_instrument_lists_detectors() {
        let instrument = MemNode::group("instrument", "NXinstrument")
            .with_child(MemNode::group("source", "NXsource"))
            .with_child(MemNode::group("bank1", "NXdetector"))
            .with_child(MemNode::group("bank2", "NXdetector"));

        let state = InstrumentState::from_node(&instrument, "/entry/instrument");
        assert_eq!(
            state.detectors,
            vec![(1, "bank1".to_string()), (2, "bank2".to_string())]
        );
    }

    #[test]
    fn test_fix_for() {
        let state = FileState::new()
            .with_file_name("run.nxs")
            .with_fixit(Fixit::default().with_run_fix(
                "run.nxs",
                FixRecord::new("/entry/data", "axis1", "tof"),
            ));

        assert_eq!(state.fix_for("/entry/data", "axis1", None), Some("tof"));
        assert_eq!(FileState::new().fix_for("/entry/data", "axis1", None), None);
    }

    #[test]
    fn test_group_ids_persist_in_session() {
        let mut state = FileState::new();
        assert_eq!(state.group_ids(10).peek(), 10);

        let mut counter = state.group_ids(10);
        counter.advance(4, None);
        state.set_group_ids(counter);

        assert_eq!(state.group_ids(10).peek(), 14);
        assert_eq!(state.group_ids(1).peek(), 14);
    }
}
