use std::collections::BTreeMap;

use crate::{
    connectivity::is_ic_ref,
    error::{ParseError, SchemaError},
    sexpr::SExpr,
};

mod parser;

/// The board view: footprints in document order plus the net id table.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub footprints: Vec<Footprint>,
    /// Net id to net name, from the top-level `net` declarations
    pub nets: BTreeMap<String, String>,
}

/// A placed footprint that carries a reference designator
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    /// Library identifier, e.g. `Resistor_SMD:R_0603_1608Metric`
    pub id: String,
    pub ref_des: String,
    pub value: String,
    pub properties: BTreeMap<String, String>,
    pub pads: Vec<Pad>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pad {
    /// Pad numbers may be alphanumeric, e.g. `A1` on a BGA
    pub number: String,
    /// `None` for an unconnected pad
    pub net_id: Option<String>,
    /// Empty for an unconnected pad
    pub net_name: String,
    pub pin_function: String,
    pub pin_type: String,
}

impl Pad {
    pub fn is_connected(&self) -> bool {
        !self.net_name.is_empty()
    }
}

impl Footprint {
    /// The first pad with the given number. Through-hole parts with
    /// several copper shapes may repeat a number.
    pub fn pad(&self, number: &str) -> Option<&Pad> {
        self.pads.iter().find(|pad| pad.number == number)
    }

    pub fn is_ic(&self) -> bool {
        is_ic_ref(&self.ref_des)
    }
}

impl Board {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let root = SExpr::parse(input)?;
        Ok(Board::try_from(&root)?)
    }

    pub fn net_name(&self, id: &str) -> Option<&str> {
        self.nets.get(id).map(String::as_str)
    }

    pub fn footprint(&self, ref_des: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.ref_des == ref_des)
    }

    /// Pads whose inline net disagrees with the net table: either the id is
    /// not declared, or it is declared under a different name.
    pub fn net_mismatches(&self) -> impl Iterator<Item = (&Footprint, &Pad)> + '_ {
        self.footprints.iter().flat_map(move |fp| {
            fp.pads.iter().filter_map(move |pad| {
                let id = pad.net_id.as_deref()?;
                match self.net_name(id) {
                    Some(name) if name == pad.net_name => None,
                    _ => Some((fp, pad)),
                }
            })
        })
    }
}

impl<'a> TryFrom<&SExpr<'a>> for Board {
    type Error = SchemaError;

    fn try_from(root: &SExpr<'a>) -> Result<Self, Self::Error> {
        parser::extract(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_from_file() {
        let i = &test_data!("small.kicad_pcb");
        let board = Board::parse(i).unwrap();

        let refs: Vec<_> = board.footprints.iter().map(|fp| fp.ref_des.as_str()).collect();
        assert_eq!(refs, vec!["U1", "R1", "J1"]);
        assert_eq!(board.nets.len(), 5);
        assert_eq!(board.net_name("0"), Some(""));
        assert_eq!(board.net_name("3"), Some("/MCU/SDA"));

        let u1 = board.footprint("U1").unwrap();
        assert_eq!(u1.id, "Package_DFN_QFN:QFN-56-1EP_7x7mm_P0.4mm");
        assert_eq!(u1.value, "RP2040");
        assert_eq!(u1.properties["LCSC"], "C2040");
        let pad = u1.pad("1").unwrap();
        assert_eq!(pad.net_id.as_deref(), Some("1"));
        assert_eq!(pad.net_name, "+3V3");
        assert_eq!(pad.pin_function, "IOVDD");
        assert_eq!(pad.pin_type, "power_in");

        let j1 = board.footprint("J1").unwrap();
        let nc = j1.pad("3").unwrap();
        assert!(!nc.is_connected());
        assert_eq!(nc.net_id, None);

        assert_eq!(board.net_mismatches().count(), 0);

        let ics: Vec<_> = board
            .footprints
            .iter()
            .filter(|fp| fp.is_ic())
            .map(|fp| fp.ref_des.as_str())
            .collect();
        assert_eq!(ics, vec!["U1"]);
    }

    #[test]
    fn net_mismatches_flags_undeclared_and_renamed_ids() {
        let board = Board::parse(
            r#"(kicad_pcb (net 0 "") (net 1 "GND")
                 (footprint "R" (property "Reference" "R1")
                   (pad "1" smd rect (net 1 "GND"))
                   (pad "2" smd rect (net 1 "AGND"))
                   (pad "3" smd rect (net 7 "VBUS"))
                   (pad "4" smd rect)))"#,
        )
        .unwrap();
        let flagged: Vec<_> = board
            .net_mismatches()
            .map(|(fp, pad)| (fp.ref_des.as_str(), pad.number.as_str()))
            .collect();
        assert_eq!(flagged, vec![("R1", "2"), ("R1", "3")]);
    }

    #[test]
    fn parse_rejects_netlist_root() {
        let err = Board::parse("(export (components) (nets))").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Schema(SchemaError::InvalidRoot { expected: "kicad_pcb", .. })
        ));
    }
}
