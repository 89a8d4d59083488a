//! Reads KiCad netlist exports (`.net`) and board files (`.kicad_pcb`) into a
//! cross-referenced model of components, footprints, pads and nets.
//!
//! Both formats share one S-expression grammar. Text is first tokenized and
//! parsed into a schema-free [`SExpr`] tree, then one of two extractors walks
//! the tree:
//!
//! - [`NetList`]: components keyed by reference designator, with every pin
//!   linked to its net and pin function.
//! - [`Board`]: footprints with their pads and the net id table.
//!
//! ```
//! use kicad_connectivity::NetList;
//!
//! let netlist = NetList::parse(
//!     r#"(export
//!          (components (comp (ref "R1") (value "10k")))
//!          (nets (net (code "1") (name "GND") (node (ref "R1") (pin "2")))))"#,
//! )?;
//! assert_eq!(netlist.components["R1"].connections["2"], "GND");
//! # Ok::<(), kicad_connectivity::ParseError>(())
//! ```

use std::path::Path;

/// Reads a fixture from `resources/test/`.
#[cfg(test)]
macro_rules! test_data {
    ($fname:expr) => {
        std::fs::read_to_string(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/test/",
            $fname
        ))
        .unwrap()
    };
}

pub mod board;
pub mod connectivity;
mod error;
pub mod netlist;
pub mod sexpr;

pub use board::{Board, Footprint, Pad};
pub use error::{ParseError, SchemaError, StructureError};
pub use netlist::{Component, Net, NetList, Node};
pub use sexpr::{parse_tokens, tokenize, SExpr, Token};

/// Reads a file as UTF-8, replacing invalid sequences.
fn read_lossy(path: &Path) -> Result<String, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_owned(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read file");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn read_netlist(path: impl AsRef<Path>) -> Result<NetList, ParseError> {
    NetList::parse(&read_lossy(path.as_ref())?)
}

pub fn read_board(path: impl AsRef<Path>) -> Result<Board, ParseError> {
    Board::parse(&read_lossy(path.as_ref())?)
}
