//! # Data set planning
//!
//! One entry may hold several data blocks that belong to different output data
//! sets. Blocks whose primary field carries the same `label` attribute are merged
//! into one [`DataSetPlan`]; every unlabeled block gets a plan of its own.
use crate::constants::{ATTR_LABEL, CLASS_DATA};
use crate::node::NxNode;
use crate::state::data_block_state::primary_field;

/// Which data blocks of an entry an ingestion run visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSelection {
    All,
    /// Blocks whose primary field carries this `label`.
    Label(String),
    /// Blocks with this name.
    Block(String),
}

impl BlockSelection {
    pub fn matches<N: NxNode>(&self, block: &N) -> bool {
        match self {
            BlockSelection::All => true,
            BlockSelection::Label(label) => block_label(block).as_deref() == Some(label.as_str()),
            BlockSelection::Block(name) => block.name() == name,
        }
    }
}

fn block_label<N: NxNode>(block: &N) -> Option<String> {
    primary_field(block)?
        .text_attribute(ATTR_LABEL)
        .filter(|label| !label.trim().is_empty())
}

/// One output data set of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetPlan {
    pub entry_name: String,
    pub title: String,
    pub selection: BlockSelection,
    /// Names of the data blocks merged into the data set.
    pub blocks: Vec<String>,
}

/// Group the data blocks of `entry` into output data sets, in order of first appearance.
pub fn plan_data_sets<N: NxNode>(entry: &N) -> Vec<DataSetPlan> {
    let mut plans: Vec<DataSetPlan> = Vec::new();

    for block in entry.children().filter(|child| child.class() == CLASS_DATA) {
        let (selection, title) = match block_label(block) {
            Some(label) => (BlockSelection::Label(label.clone()), label),
            None => (
                BlockSelection::Block(block.name().to_string()),
                block.name().to_string(),
            ),
        };

        match plans.iter_mut().find(|plan| plan.selection == selection) {
            Some(plan) => plan.blocks.push(block.name().to_string()),
            None => plans.push(DataSetPlan {
                entry_name: entry.name().to_string(),
                title,
                selection,
                blocks: vec![block.name().to_string()],
            }),
        }
    }

    plans
}
