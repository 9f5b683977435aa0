//! # arcstate-dot
//!
//! GraphViz DOT rendering of a compiled topology.
//!
//! The output is byte-stable: states appear in the builder's
//! first-appearance order, destinations in event-kind order within each
//! source state, and parallel arcs sharing endpoints collapse into one edge
//! labeled with the sorted event kinds.

use arcstate_core::{EventKind, StateId, Topology};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders `topology` as a GraphViz digraph named `name`.
///
/// Node identifiers are `"<name>.<STATE>"` with the bare state as display
/// label. Edge labels joining several event kinds separate them with a
/// literal `\n` escape so GraphViz breaks the line, sorted lexicographically.
/// Multi-arc transitions contribute one edge per declared target.
pub fn export_dot<O, S: StateId, K: EventKind, E>(
    topology: &Topology<O, S, K, E>,
    name: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph {name} {{");
    let _ = writeln!(out, "graph [ label=\"{name}\", fontsize=24, fontname=Helvetica];");
    let _ = writeln!(out, "node [fontsize=12, fontname=Helvetica];");
    let _ = writeln!(out, "edge [fontsize=9, fontcolor=blue, fontname=Arial];");
    let _ = writeln!(out);

    for state in topology.states() {
        let label = format!("{state:?}");
        let _ = writeln!(out, "\"{name}.{label}\" [ label = {label} ];");
    }
    let _ = writeln!(out);

    for from in topology.states() {
        // Merge parallel arcs per destination; first appearance fixes the
        // edge order, the label set is sorted independently.
        let mut dest_order: Vec<S> = Vec::new();
        let mut labels: HashMap<S, Vec<String>> = HashMap::new();
        for (on, transition) in topology.arcs_from(from) {
            for dest in transition.destinations() {
                if !dest_order.contains(&dest) {
                    dest_order.push(dest);
                }
                labels.entry(dest).or_default().push(format!("{on:?}"));
            }
        }

        for dest in dest_order {
            let mut kinds = labels.remove(&dest).unwrap_or_default();
            kinds.sort();
            kinds.dedup();
            let label = kinds.join(",\\n");
            let _ = writeln!(
                out,
                "\"{name}.{from:?}\" -> \"{name}.{dest:?}\" [ label = \"{label}\" ];"
            );
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcstate_core::TopologyBuilder;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Light {
        Red,
        Green,
        Broken,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Pulse {
        Go,
        Stop,
        Hold,
        Short,
    }

    struct Tick;

    fn sample() -> Arc<Topology<(), Light, Pulse, Tick>> {
        let mut builder = TopologyBuilder::new(Light::Red);
        builder
            .add_single_arc(Light::Red, Light::Green, Pulse::Go, |_, _| Ok(()))
            .unwrap()
            .add_single_arc(Light::Green, Light::Red, Pulse::Stop, |_, _| Ok(()))
            .unwrap()
            // parallel arc sharing endpoints with Stop, must merge
            .add_single_arc(Light::Green, Light::Red, Pulse::Hold, |_, _| Ok(()))
            .unwrap()
            .add_multi_arc(
                Light::Red,
                vec![Light::Broken, Light::Red],
                Pulse::Short,
                |_, _, _, _| Ok(Light::Broken),
            )
            .unwrap();
        builder.install_topology().unwrap()
    }

    #[test]
    fn renders_expected_graph() {
        let dot = export_dot(sample().as_ref(), "lights");
        let expected = "\
digraph lights {
graph [ label=\"lights\", fontsize=24, fontname=Helvetica];
node [fontsize=12, fontname=Helvetica];
edge [fontsize=9, fontcolor=blue, fontname=Arial];

\"lights.Red\" [ label = Red ];
\"lights.Green\" [ label = Green ];
\"lights.Broken\" [ label = Broken ];

\"lights.Red\" -> \"lights.Green\" [ label = \"Go\" ];
\"lights.Red\" -> \"lights.Broken\" [ label = \"Short\" ];
\"lights.Red\" -> \"lights.Red\" [ label = \"Short\" ];
\"lights.Green\" -> \"lights.Red\" [ label = \"Hold,\\nStop\" ];
}
";
        assert_eq!(dot, expected);
    }

    #[test]
    fn output_is_byte_stable() {
        let topology = sample();
        let first = export_dot(topology.as_ref(), "lights");
        for _ in 0..16 {
            assert_eq!(export_dot(topology.as_ref(), "lights"), first);
        }
    }
}
