use std::collections::BTreeMap;

use crate::{
    connectivity::{is_ic_ref, is_power_net},
    error::ParseError,
    sexpr::SExpr,
};

mod parser;

/// The netlist view: components keyed by reference designator, and nets in
/// document order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetList {
    pub components: BTreeMap<String, Component>,
    pub nets: Vec<Net>,
}

/// A component in the schematic
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub ref_des: String,
    pub value: String,
    pub footprint: String,
    pub datasheet: String,
    pub description: String,
    pub sheet_name: String,
    pub sheet_file: String,
    pub fields: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    pub lib: String,
    pub part: String,
    /// Pin number to the name of the net on that pin
    pub connections: BTreeMap<String, String>,
    /// Pin number to pin function, for nodes that declare one
    pub pin_functions: BTreeMap<String, String>,
}

impl Component {
    /// Looks `name` up in the properties, then in the fields.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .or_else(|| self.fields.get(name))
            .map(String::as_str)
    }

    pub fn is_ic(&self) -> bool {
        is_ic_ref(&self.ref_des)
    }

    /// The sheet name, falling back to the sheet file, then `UNKNOWN`.
    pub fn sheet(&self) -> &str {
        [&self.sheet_name, &self.sheet_file]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or("UNKNOWN", String::as_str)
    }

    /// The `Datasheet` field when the symbol has one, else the `datasheet`
    /// pair.
    pub fn datasheet_link(&self) -> &str {
        self.fields.get("Datasheet").unwrap_or(&self.datasheet)
    }
}

/// A node connects a net to a pin.
///
/// Holds every `(key value)` pair of the node record; `ref` and `pin` are
/// always present.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    attributes: BTreeMap<String, String>,
}

impl Node {
    /// Returns `None` unless both `ref` and `pin` are present.
    pub fn from_attributes(attributes: BTreeMap<String, String>) -> Option<Self> {
        if attributes.contains_key("ref") && attributes.contains_key("pin") {
            Some(Node { attributes })
        } else {
            None
        }
    }

    pub fn reference(&self) -> &str {
        self.get("ref").unwrap_or_default()
    }

    pub fn pin(&self) -> &str {
        self.get("pin").unwrap_or_default()
    }

    pub fn function(&self) -> Option<&str> {
        self.get("pinfunction")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// A net
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Net {
    /// May be empty, in which case the net cannot be looked up by name
    pub name: String,
    /// Numeric id, kept as written
    pub code: String,
    pub class: String,
    pub nodes: Vec<Node>,
}

impl NetList {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let root = SExpr::parse(input)?;
        Ok(NetList::try_from(&root)?)
    }

    pub fn component(&self, ref_des: &str) -> Option<&Component> {
        self.components.get(ref_des)
    }

    /// Nets keyed by name. A later net with the same name replaces an
    /// earlier one.
    pub fn net_index(&self) -> BTreeMap<&str, &Net> {
        self.nets
            .iter()
            .map(|net| (net.name.as_str(), net))
            .collect()
    }

    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.iter().rev().find(|net| net.name == name)
    }

    /// Components with an IC reference, in reference order.
    pub fn ics(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.values().filter(|c| c.is_ic())
    }

    /// ICs grouped by [`Component::sheet`].
    pub fn ics_by_sheet(&self) -> BTreeMap<&str, Vec<&Component>> {
        let mut sheets: BTreeMap<&str, Vec<&Component>> = BTreeMap::new();
        for ic in self.ics() {
            sheets.entry(ic.sheet()).or_default().push(ic);
        }
        sheets
    }

    /// Sorted, deduplicated names of nets that look like supply rails.
    pub fn power_nets(&self) -> Vec<&str> {
        self.net_index()
            .into_keys()
            .filter(|name| is_power_net(name))
            .collect()
    }
}

impl<'a> TryFrom<&SExpr<'a>> for NetList {
    type Error = crate::error::SchemaError;

    fn try_from(root: &SExpr<'a>) -> Result<Self, Self::Error> {
        parser::extract(root)
    }
}
