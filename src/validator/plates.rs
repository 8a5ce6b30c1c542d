use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::picklist::PickList;

use super::{EntryRef, Finding, FindingKind, ValidationReport};

/// Each named plate is used with a single plate type
pub(crate) fn check_plate_types(picklist: &PickList, report: &mut ValidationReport) {
    let mut first_type: HashMap<&str, &str> = HashMap::new();
    let mut reported: HashSet<(&str, &str)> = HashSet::new();

    for entry in picklist {
        for side in [&entry.source, &entry.destination] {
            let (label, Some(plate_type)) = (side.plate_label(), side.plate_type.as_deref()) else {
                continue;
            };
            if label.is_empty() {
                continue;
            }

            let expected = *first_type.entry(label).or_insert(plate_type);
            if expected != plate_type && reported.insert((label, plate_type)) {
                report.add(Finding::new(
                    Some(EntryRef::from(entry)),
                    FindingKind::InconsistentPlateType,
                    format!(
                        "plate '{}' is used as '{}' here but as '{}' earlier",
                        label, plate_type, expected
                    ),
                ));
            }
        }
    }
}

type PlateGraph<'a> = BTreeMap<&'a str, BTreeSet<&'a str>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Every cycle closed by a back edge of a depth-first walk, in node order
fn find_cycles<'a>(graph: &PlateGraph<'a>) -> Vec<Vec<&'a str>> {
    let successors = |node: &str| graph.get(node).map(BTreeSet::iter).unwrap_or_default();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();

    for &start in graph.keys() {
        if marks.contains_key(start) {
            continue;
        }
        marks.insert(start, Mark::Active);
        let mut path = vec![start];
        let mut stack = vec![successors(start)];

        while let Some(pending) = stack.last_mut() {
            match pending.next() {
                Some(&next) => match marks.get(next) {
                    Some(Mark::Active) => {
                        let from = path.iter().position(|p| *p == next).unwrap_or(0);
                        let mut cycle = path[from..].to_vec();
                        cycle.push(next);
                        cycles.push(cycle);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::Active);
                        path.push(next);
                        stack.push(successors(next));
                    }
                },
                None => {
                    stack.pop();
                    if let Some(done) = path.pop() {
                        marks.insert(done, Mark::Done);
                    }
                }
            }
        }
    }

    cycles
}

/// Plates do not feed each other in a cycle
pub(crate) fn check_transfer_graph(picklist: &PickList, report: &mut ValidationReport) {
    let mut graph: PlateGraph<'_> = BTreeMap::new();
    for entry in picklist {
        let (source, destination) = (entry.source.plate_label(), entry.destination.plate_label());
        if source.is_empty() || destination.is_empty() {
            continue;
        }
        graph.entry(source).or_default().insert(destination);
        graph.entry(destination).or_default();
    }

    for cycle in find_cycles(&graph) {
        report.add(Finding::new(
            None,
            FindingKind::TransferCycle,
            format!("plates feed each other: {}", cycle.join(" -> ")),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph<'a>(edges: &[(&'a str, &'a str)]) -> PlateGraph<'a> {
        let mut graph = PlateGraph::new();
        for &(a, b) in edges {
            graph.entry(a).or_default().insert(b);
            graph.entry(b).or_default();
        }
        graph
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(find_cycles(&g).is_empty());
    }

    #[test]
    fn test_cycle_and_self_loop() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("d", "d")]);
        let cycles = find_cycles(&g);
        assert_eq!(cycles, vec![vec!["a", "b", "c", "a"], vec!["d", "d"]]);
    }
}
