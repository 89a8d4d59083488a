//! Net-centric views of a [`Board`], grouping connected pads by net name,
//! plus the name classifiers shared by the netlist and board views.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::board::Board;

static POWER_NET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\+\d|\+\d\.\d|\+3\.3V|\+5V|VBAT|VCC|VDD|VDDA|AVDD|DVDD|IOVDD|VSS|GND|AGND|PGND|VUSB|VBUS|VREG|VREF)",
    )
    .unwrap()
});

/// One connected pad, as seen from the net it belongs to
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadNode<'b> {
    pub ref_des: &'b str,
    pub value: &'b str,
    pub footprint_id: &'b str,
    pub pad: &'b str,
    pub pin_function: &'b str,
}

/// The hierarchical sheet a net name belongs to.
///
/// `/MCU/SDA` belongs to `MCU`; names without a leading `/` (power rails,
/// `Net-(...)` auto names) and a bare `/` are `GLOBAL`.
pub fn sheet_of_net(net: &str) -> &str {
    net.strip_prefix('/')
        .and_then(|rest| rest.split('/').find(|part| !part.is_empty()))
        .unwrap_or("GLOBAL")
}

/// `true` for a reference designator of the form `U<digits>`.
pub fn is_ic_ref(ref_des: &str) -> bool {
    ref_des
        .strip_prefix('U')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// `true` when the net name starts like a supply or ground rail, e.g. `+3V3`,
/// `VDD_CORE` or `GND`. Case-insensitive; sheet-local names such as
/// `/MCU/VDD` do not match.
pub fn is_power_net(name: &str) -> bool {
    POWER_NET.is_match(name)
}

/// Connected pads grouped by net name, each group sorted by reference and
/// then pad number. Unconnected pads are left out.
pub fn net_nodes(board: &Board) -> BTreeMap<&str, Vec<PadNode<'_>>> {
    let mut nets: BTreeMap<&str, Vec<PadNode>> = BTreeMap::new();
    for fp in &board.footprints {
        for pad in fp.pads.iter().filter(|pad| pad.is_connected()) {
            nets.entry(pad.net_name.as_str()).or_default().push(PadNode {
                ref_des: &fp.ref_des,
                value: &fp.value,
                footprint_id: &fp.id,
                pad: &pad.number,
                pin_function: &pad.pin_function,
            });
        }
    }
    for nodes in nets.values_mut() {
        nodes.sort_by(|a, b| (a.ref_des, a.pad).cmp(&(b.ref_des, b.pad)));
    }
    nets
}

/// Net names grouped by [`sheet_of_net`], sorted within each sheet.
pub fn nets_by_sheet(board: &Board) -> BTreeMap<&str, Vec<&str>> {
    let mut sheets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for net in net_nodes(board).into_keys() {
        sheets.entry(sheet_of_net(net)).or_default().push(net);
    }
    sheets
}

/// Number of connected pads on each net.
pub fn net_pad_counts(board: &Board) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for pad in board.footprints.iter().flat_map(|fp| &fp.pads) {
        if pad.is_connected() {
            *counts.entry(pad.net_name.as_str()).or_insert(0) += 1;
        }
    }
    counts
}
