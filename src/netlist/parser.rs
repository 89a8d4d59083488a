use std::collections::{BTreeMap, HashMap};

use crate::{error::SchemaError, sexpr::SExpr};

use super::{Component, Net, NetList, Node};

const ROOT: &str = "export";

/// Top-level sections keyed by tag. The first section with a given tag wins.
fn sections<'b, 'a>(root: &'b SExpr<'a>) -> Result<HashMap<&'b str, &'b SExpr<'a>>, SchemaError> {
    if !root.is_tagged(ROOT) {
        return Err(SchemaError::InvalidRoot {
            expected: ROOT,
            found: root.tag().map(str::to_owned),
        });
    }
    let mut sections = HashMap::new();
    for item in root.args() {
        if let Some(tag) = item.tag() {
            sections.entry(tag).or_insert(item);
        }
    }
    Ok(sections)
}

fn parse_component(item: &SExpr) -> Option<Component> {
    let mut comp = Component::default();

    for sub in item.args() {
        if let Some((key, value)) = sub.pair() {
            let target = match key {
                "ref" => &mut comp.ref_des,
                "value" => &mut comp.value,
                "footprint" => &mut comp.footprint,
                "datasheet" => &mut comp.datasheet,
                "description" => &mut comp.description,
                _ => continue,
            };
            *target = value.to_owned();
            continue;
        }
        match sub.tag() {
            Some("fields") => {
                for field in sub.children("field") {
                    let mut name = "";
                    let mut text = "";
                    for fsub in field.args() {
                        match (fsub.pair(), fsub.as_atom()) {
                            (Some(("name", n)), _) => name = n,
                            (_, Some(t)) => text = t,
                            _ => {}
                        }
                    }
                    if !name.is_empty() {
                        comp.fields.insert(name.to_owned(), text.to_owned());
                    }
                }
            }
            Some("property") => {
                let mut name = "";
                let mut value = "";
                for psub in sub.args() {
                    match psub.pair() {
                        Some(("name", n)) => name = n,
                        Some(("value", v)) => value = v,
                        _ => {}
                    }
                }
                if !name.is_empty() {
                    match name {
                        "Sheetname" => comp.sheet_name = value.to_owned(),
                        "Sheetfile" => comp.sheet_file = value.to_owned(),
                        _ => {}
                    }
                    comp.properties.insert(name.to_owned(), value.to_owned());
                }
            }
            Some("libsource") => {
                for lsub in sub.args() {
                    match lsub.pair() {
                        Some(("lib", lib)) => comp.lib = lib.to_owned(),
                        Some(("part", part)) => comp.part = part.to_owned(),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    if comp.ref_des.is_empty() {
        tracing::trace!("skipping component record without ref");
        None
    } else {
        Some(comp)
    }
}

/// Later records with the same ref replace earlier ones.
fn parse_components(section: &SExpr) -> BTreeMap<String, Component> {
    section
        .children("comp")
        .filter_map(parse_component)
        .map(|comp| (comp.ref_des.clone(), comp))
        .collect()
}

fn parse_net(item: &SExpr) -> Net {
    let mut net = Net::default();

    for sub in item.args() {
        if let Some((key, value)) = sub.pair() {
            match key {
                "name" => net.name = value.to_owned(),
                "code" => net.code = value.to_owned(),
                "class" => net.class = value.to_owned(),
                _ => {}
            }
            continue;
        }
        if sub.is_tagged("node") {
            let attributes = sub
                .args()
                .iter()
                .filter_map(SExpr::pair)
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            match Node::from_attributes(attributes) {
                Some(node) => net.nodes.push(node),
                None => tracing::trace!(net = %net.name, "skipping node without ref and pin"),
            }
        }
    }
    net
}

fn parse_nets(section: &SExpr) -> Vec<Net> {
    section.children("net").map(parse_net).collect()
}

/// Records, for every node of every net, the net name and pin function on
/// the component the node refers to. Nodes naming unknown components, or
/// with an empty ref or pin, are ignored.
fn link_nets(
    mut components: BTreeMap<String, Component>,
    nets: &[Net],
) -> BTreeMap<String, Component> {
    for net in nets {
        for node in &net.nodes {
            let (reference, pin) = (node.reference(), node.pin());
            if reference.is_empty() || pin.is_empty() {
                continue;
            }
            let Some(comp) = components.get_mut(reference) else {
                tracing::trace!(reference, net = %net.name, "node refers to unknown component");
                continue;
            };
            comp.connections.insert(pin.to_owned(), net.name.clone());
            if let Some(function) = node.function() {
                comp.pin_functions.insert(pin.to_owned(), function.to_owned());
            }
        }
    }
    components
}

pub(super) fn extract(root: &SExpr) -> Result<NetList, SchemaError> {
    let sections = sections(root)?;
    let section = |name: &str| {
        sections
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::MissingSection(name.to_owned()))
    };
    let components = parse_components(section("components")?);
    let nets = parse_nets(section("nets")?);

    let components = link_nets(components, &nets);
    tracing::debug!(
        components = components.len(),
        nets = nets.len(),
        "extracted netlist"
    );
    Ok(NetList { components, nets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn extract_str(input: &str) -> Result<NetList, SchemaError> {
        extract(&SExpr::parse(input).unwrap())
    }

    const CROSS_LINK: &str = r#"
        (export (version "E")
          (components
            (comp (ref "U1") (value "MCU"))
            (comp (ref "U2") (value "FLASH")))
          (nets
            (net (code "1") (name "N1") (class "Default")
              (node (ref "U1") (pin "1") (pintype "power_in"))
              (node (ref "U2") (pin "3") (pinfunction "VCC"))
              (node (ref "U9") (pin "4"))
              (node (ref "U1"))
              (node (pin "7")))))
    "#;

    #[test]
    fn cross_links_pins_to_nets() {
        let netlist = extract_str(CROSS_LINK).unwrap();

        let u1 = &netlist.components["U1"];
        let u2 = &netlist.components["U2"];
        assert_eq!(u1.connections["1"], "N1");
        assert_eq!(u2.connections["3"], "N1");
        assert!(u1.pin_functions.is_empty());
        assert_eq!(u2.pin_functions["3"], "VCC");
        assert!(!netlist.components.contains_key("U9"));
    }

    #[test]
    fn keeps_nodes_with_ref_and_pin_in_order() {
        let netlist = extract_str(CROSS_LINK).unwrap();
        let net = &netlist.nets[0];
        let refs: Vec<_> = net.nodes.iter().map(|n| (n.reference(), n.pin())).collect();
        assert_eq!(refs, vec![("U1", "1"), ("U2", "3"), ("U9", "4")]);
        assert_eq!(net.code, "1");
        assert_eq!(net.class, "Default");
    }

    #[test]
    fn first_section_wins() {
        let netlist = extract_str(
            r#"(export
                 (components (comp (ref "R1")))
                 (components (comp (ref "R2")))
                 (nets)
                 (nets (net (name "X") (node (ref "R1") (pin "1")))))"#,
        )
        .unwrap();
        assert_eq!(netlist.components.keys().collect::<Vec<_>>(), vec!["R1"]);
        assert!(netlist.nets.is_empty());
        assert!(netlist.components["R1"].connections.is_empty());
    }

    #[rstest]
    #[case("(export (nets))", "components")]
    #[case("(export (components))", "nets")]
    #[case("(export components nets)", "components")]
    fn missing_section(#[case] input: &str, #[case] name: &str) {
        assert_eq!(
            extract_str(input),
            Err(SchemaError::MissingSection(name.to_owned()))
        );
    }

    #[rstest]
    #[case("(kicad_pcb (components) (nets))", Some("kicad_pcb"))]
    #[case("((export) (components) (nets))", None)]
    #[case("export", None)]
    fn invalid_root(#[case] input: &str, #[case] found: Option<&str>) {
        assert_eq!(
            extract_str(input),
            Err(SchemaError::InvalidRoot {
                expected: "export",
                found: found.map(str::to_owned),
            })
        );
    }

    #[test]
    fn component_without_ref_is_dropped() {
        let netlist = extract_str(
            r#"(export (components (comp (value "10k")) (comp (ref "") (value "1k"))) (nets))"#,
        )
        .unwrap();
        assert!(netlist.components.is_empty());
    }

    #[test]
    fn duplicate_refs_keep_last_record() {
        let netlist = extract_str(
            r#"(export (components (comp (ref "C1") (value "100n")) (comp (ref "C1") (value "1u"))) (nets))"#,
        )
        .unwrap();
        assert_eq!(netlist.components["C1"].value, "1u");
    }

    #[test]
    fn fields_properties_and_libsource() {
        let netlist = extract_str(
            r#"(export
                 (components
                   (comp (ref "U3")
                     (fields
                       (field (name "Footprint") "QFN-56")
                       (field (name "LCSC") "C1")
                       (field (name "LCSC") "C2")
                       (field "orphan text")
                       (field (name "Empty")))
                     (libsource (lib "Device") (part "R") (description "Resistor"))
                     (property (name "Sheetname") (value "Power"))
                     (property (name "Sheetfile") (value "power.kicad_sch"))
                     (property (name "dnp"))
                     (property (value "nameless"))
                     (value "RP2040") (value "RP2040B0")))
                 (nets))"#,
        )
        .unwrap();
        let u3 = &netlist.components["U3"];
        assert_eq!(u3.fields["Footprint"], "QFN-56");
        assert_eq!(u3.fields["LCSC"], "C2");
        assert_eq!(u3.fields["Empty"], "");
        assert_eq!(u3.fields.len(), 3);
        assert_eq!(u3.lib, "Device");
        assert_eq!(u3.part, "R");
        assert_eq!(u3.sheet_name, "Power");
        assert_eq!(u3.sheet_file, "power.kicad_sch");
        assert_eq!(u3.properties["dnp"], "");
        assert_eq!(u3.properties.len(), 3);
        assert_eq!(u3.value, "RP2040B0");
        assert_eq!(u3.description, "");
    }

    #[test]
    fn pair_with_extra_atoms_is_not_a_value() {
        let netlist = extract_str(
            r#"(export (components (comp (ref "R1") (value "1k" "extra"))) (nets))"#,
        )
        .unwrap();
        assert_eq!(netlist.components["R1"].value, "");
    }

    #[test]
    fn unnamed_net_still_links() {
        let netlist = extract_str(
            r#"(export (components (comp (ref "R1"))) (nets (net (code "9") (node (ref "R1") (pin "2")))))"#,
        )
        .unwrap();
        assert_eq!(netlist.nets[0].name, "");
        assert_eq!(netlist.components["R1"].connections["2"], "");
    }

    #[rstest]
    #[case(r#"(node (ref "") (pin "1"))"#, "", "1")]
    #[case(r#"(node (ref "R1") (pin ""))"#, "R1", "")]
    fn empty_ref_or_pin_stays_in_net_but_is_not_linked(
        #[case] node: &str,
        #[case] reference: &str,
        #[case] pin: &str,
    ) {
        let input = format!(
            r#"(export (components (comp (ref "R1")) (comp (ref "R2")))
                 (nets (net (code "1") (name "VBUS") {node} (node (ref "R2") (pin "2")))))"#
        );
        let netlist = extract_str(&input).unwrap();

        let nodes = &netlist.nets[0].nodes;
        assert_eq!(nodes.len(), 2);
        assert_eq!((nodes[0].reference(), nodes[0].pin()), (reference, pin));

        assert!(netlist.components["R1"].connections.is_empty());
        assert_eq!(netlist.components["R2"].connections["2"], "VBUS");
        assert!(!netlist.components.contains_key(""));
    }

    #[test]
    fn later_net_overwrites_pin_connection() {
        let netlist = extract_str(
            r#"(export (components (comp (ref "R1")))
                 (nets (net (name "A") (node (ref "R1") (pin "1")))
                       (net (name "B") (node (ref "R1") (pin "1")))))"#,
        )
        .unwrap();
        assert_eq!(netlist.components["R1"].connections["1"], "B");
    }

    #[test]
    fn extraction_is_repeatable() {
        let root = SExpr::parse(CROSS_LINK).unwrap();
        assert_eq!(extract(&root), extract(&root));
    }
}
