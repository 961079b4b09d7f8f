#![allow(dead_code)]

use nexingest::MemNode;

/// Counts of a `rows × columns` block, `row * 100 + column`.
pub fn counts(rows: usize, columns: usize) -> Vec<f64> {
    (0..rows)
        .flat_map(|row| (0..columns).map(move |col| (row * 100 + col) as f64))
        .collect()
}

/// A data block with a fast time-of-flight axis, optionally linked to `link`.
pub fn data_block(name: &str, link: Option<&str>, rows: usize, columns: usize) -> MemNode {
    let tof: Vec<f64> = (0..columns).map(|c| 10.0 * (c + 1) as f64).collect();
    let mut axis = MemNode::field("time_of_flight", tof)
        .with_attr("axis", 1)
        .with_attr("units", "microsecond")
        .with_attr("long_name", "Time of flight");
    if let Some(link) = link {
        axis = axis.with_attr(
            "target",
            format!("/entry/instrument/{link}/time_of_flight"),
        );
    }

    MemNode::group(name, "NXdata").with_child(axis).with_child(
        MemNode::field("data", counts(rows, columns))
            .with_dims([rows, columns])
            .with_attr("signal", 1)
            .with_attr("units", "counts"),
    )
}

/// A detector subtree with `rows` elements at 2 m, polar angles in degrees.
pub fn detector(name: &str, ids: Option<Vec<i64>>, rows: usize) -> MemNode {
    let mut node = MemNode::group(name, "NXdetector")
        .with_child(MemNode::field("distance", vec![200.0; rows]).with_attr("units", "cm"))
        .with_child(
            MemNode::field(
                "polar_angle",
                (0..rows).map(|r| 10.0 * (r + 1) as f64).collect::<Vec<_>>(),
            )
            .with_attr("units", "degree"),
        )
        .with_child(MemNode::field("azimuthal_angle", vec![0.0; rows]));
    if let Some(ids) = ids {
        node = node.with_child(MemNode::field("detector_number", ids));
    }
    node
}

pub fn instrument(detectors: impl IntoIterator<Item = MemNode>) -> MemNode {
    MemNode::group("instrument", "NXinstrument")
        .with_child(
            MemNode::group("moderator", "NXsource")
                .with_child(MemNode::field("distance", -9.5).with_attr("units", "m")),
        )
        .with_children(detectors)
}

pub fn entry(name: &str, children: impl IntoIterator<Item = MemNode>) -> MemNode {
    MemNode::group(name, "NXentry")
        .with_child(MemNode::field("run_number", 42_i64))
        .with_child(MemNode::field("title", "integration run"))
        .with_children(children)
}

pub fn root(entries: impl IntoIterator<Item = MemNode>) -> MemNode {
    MemNode::group("root", "NXroot").with_children(entries)
}
