use std::collections::BTreeMap;

use crate::{error::SchemaError, sexpr::SExpr};

use super::{Board, Footprint, Pad};

const ROOT: &str = "kicad_pcb";

/// `(net <id> <name> ...)` with both arguments as atoms
fn net_decl<'b>(item: &'b SExpr) -> Option<(&'b str, &'b str)> {
    Some((item.atom_arg(0)?, item.atom_arg(1)?))
}

/// `(property "Reference" "U36" (at ...) ...)` with a non-empty name
fn property<'b>(item: &'b SExpr) -> Option<(&'b str, &'b str)> {
    if !item.is_tagged("property") || item.args().len() < 2 {
        return None;
    }
    let name = item.atom_arg(0).unwrap_or_default();
    let value = item.atom_arg(1).unwrap_or_default();
    (!name.is_empty()).then_some((name, value))
}

/// `(pad "30" smd rect ... (net 115 "/RP2350A/XIN") (pinfunction "XIN") (pintype "input"))`
fn parse_pad(item: &SExpr) -> Pad {
    let mut pad = Pad {
        number: item.atom_arg(0).unwrap_or_default().to_owned(),
        ..Default::default()
    };
    for sub in item.args().iter().skip(1) {
        match sub.tag() {
            Some("net") => {
                if let Some((id, name)) = net_decl(sub) {
                    pad.net_id = Some(id.to_owned());
                    pad.net_name = name.to_owned();
                }
            }
            Some("pinfunction") => {
                if let Some(function) = sub.atom_arg(0) {
                    pad.pin_function = function.to_owned();
                }
            }
            Some("pintype") => {
                if let Some(typ) = sub.atom_arg(0) {
                    pad.pin_type = typ.to_owned();
                }
            }
            _ => {}
        }
    }
    pad
}

/// Returns `None` for footprints without a reference (graphics, logos).
fn parse_footprint(item: &SExpr) -> Option<Footprint> {
    let mut fp = Footprint {
        id: item.atom_arg(0).unwrap_or_default().to_owned(),
        ..Default::default()
    };

    for sub in item.args().iter().skip(1) {
        if let Some((name, value)) = property(sub) {
            match name {
                "Reference" => fp.ref_des = value.to_owned(),
                "Value" => fp.value = value.to_owned(),
                _ => {}
            }
            fp.properties.insert(name.to_owned(), value.to_owned());
            continue;
        }
        if sub.is_tagged("pad") {
            fp.pads.push(parse_pad(sub));
        }
    }

    if fp.ref_des.is_empty() {
        tracing::trace!(id = %fp.id, "skipping footprint without reference");
        None
    } else {
        Some(fp)
    }
}

pub(super) fn extract(root: &SExpr) -> Result<Board, SchemaError> {
    if !root.is_tagged(ROOT) {
        return Err(SchemaError::InvalidRoot {
            expected: ROOT,
            found: root.tag().map(str::to_owned),
        });
    }

    let mut nets = BTreeMap::new();
    let mut footprints = Vec::new();

    for item in root.args() {
        match item.tag() {
            Some("net") => {
                if let Some((id, name)) = net_decl(item) {
                    nets.insert(id.to_owned(), name.to_owned());
                }
            }
            Some("footprint") => footprints.extend(parse_footprint(item)),
            _ => {}
        }
    }

    tracing::debug!(
        footprints = footprints.len(),
        nets = nets.len(),
        "extracted board"
    );
    Ok(Board { footprints, nets })
}
