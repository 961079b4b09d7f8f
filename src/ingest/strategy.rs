//! # Entry strategy selection
//!
//! Files in circulation come in several dialects. Before processing an entry, the
//! pipeline summarizes what metadata the entry actually carries in an
//! [`EntryFacts`] and maps it to an [`EntryStrategy`] with the pure function
//! [`classify`]:
//!
//! | data block | axis override | link name | strategy            |
//! |------------|---------------|-----------|---------------------|
//! | no         | any           | any       | `NoDataNode`        |
//! | yes        | yes           | any       | `FixitOverridden`   |
//! | yes        | no            | yes       | `LinkedModern`      |
//! | yes        | no            | no        | `LegacyUnlinked`    |
//!
//! The selection is made per entry: a single file may mix dialects.
use crate::constants::CLASS_DATA;
use crate::node::{join_path, NxNode};
use crate::state::{DataBlockState, FileState};

/// Processing strategy of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStrategy {
    /// The entry has no data block; nothing to ingest.
    NoDataNode,
    /// Data blocks name their detector subtree through a link attribute.
    LinkedModern,
    /// An override description remaps the fast axis of a data block.
    FixitOverridden,
    /// Data blocks predate the link convention.
    LegacyUnlinked,
}

impl EntryStrategy {
    /// Whether the strategy resolves detector links.
    pub fn is_link_aware(&self) -> bool {
        matches!(
            self,
            EntryStrategy::LinkedModern | EntryStrategy::FixitOverridden
        )
    }
}

/// What metadata an entry carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFacts {
    pub has_data_block: bool,
    pub has_axis_override: bool,
    pub has_link_name: bool,
}

impl EntryFacts {
    /// Summarize the data blocks selected for an entry.
    ///
    /// Arguments
    /// ---------
    /// * `entry_path`: path of the entry, prefix of the data block paths
    /// * `blocks`: the data blocks that will be processed
    /// * `file_state`: session state holding the override description
    pub fn gather<N: NxNode>(entry_path: &str, blocks: &[&N], file_state: &FileState) -> Self {
        let states: Vec<DataBlockState> = blocks
            .iter()
            .filter(|block| block.class() == CLASS_DATA)
            .map(|block| {
                let path = join_path(entry_path, block.name());
                DataBlockState::from_node(*block, &path, 0, file_state)
            })
            .collect();

        EntryFacts {
            has_data_block: !states.is_empty(),
            has_axis_override: states.iter().any(|state| state.axis_overridden),
            has_link_name: states.iter().any(|state| state.link_name.is_some()),
        }
    }
}

/// Pick the strategy for an entry.
pub fn classify(facts: &EntryFacts) -> EntryStrategy {
    if !facts.has_data_block {
        EntryStrategy::NoDataNode
    } else if facts.has_axis_override {
        EntryStrategy::FixitOverridden
    } else if facts.has_link_name {
        EntryStrategy::LinkedModern
    } else {
        EntryStrategy::LegacyUnlinked
    }
}
