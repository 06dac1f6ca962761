//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the snapshot pipeline is INVALID.
//!
//! ## Tiers
//! - T0: Row Integrity
//! - T1: Materialization
//! - T2: Selection Compression
//! - T3: Checklist Expansion

use agricheck_core::{
    AgricheckError, NodeId, NodeKind, NodeMap, Row, Selection, SparqlResults, build_checklist,
    collect_inspection_points, compress, materialize, parse_groups_param, snapshot_from_results,
};
use std::collections::BTreeSet;

const COLLECTION: &str = "http://purl.org/dc/terms/Collection";
const POINT: &str = "https://agriculture.ld.admin.ch/inspection/InspectionPoint";
const BASE: &str = "https://agriculture.ld.admin.ch/inspection/";

fn iri(slug: &str) -> String {
    format!("{BASE}{slug}")
}

fn id(slug: &str) -> NodeId {
    NodeId::new(iri(slug))
}

fn set(slugs: &[&str]) -> BTreeSet<NodeId> {
    slugs.iter().map(|s| id(s)).collect()
}

/// C1 "Fields" with sub-group C1a "Soil" and point P1; C1a holds P2.
fn scenario_rows() -> Vec<Row> {
    vec![
        Row::subject(iri("C1"), COLLECTION)
            .with_label("Fields")
            .with_sub_group(iri("C1a"), Some("Soil"))
            .with_inspection_point(iri("P1"), Some("Check drainage")),
        Row::subject(iri("C1a"), COLLECTION).with_inspection_point(iri("P2"), Some("Check pH")),
    ]
}

fn scenario() -> NodeMap {
    materialize(&scenario_rows()).expect("materialize")
}

// =============================================================================
// TIER T0: ROW INTEGRITY
// =============================================================================

mod t0_row_integrity {
    use super::*;

    /// T0.1: A row without subject is rejected with its index.
    #[test]
    fn missing_subject_rejected() {
        let mut rows = scenario_rows();
        rows.insert(1, Row::default());

        let result = materialize(&rows);
        assert!(matches!(result, Err(AgricheckError::MalformedRow { index: 1 })));
    }

    /// T0.2: SPARQL JSON with optional fields converts row by row.
    #[test]
    fn sparql_document_materializes() {
        let json = format!(
            r#"{{ "results": {{ "bindings": [
                {{ "s": {{ "type": "uri", "value": "{c1}" }},
                   "sType": {{ "type": "uri", "value": "{COLLECTION}" }},
                   "subGroup": {{ "type": "uri", "value": "{c1a}" }},
                   "subGroupLabel": {{ "type": "literal", "xml:lang": "de", "value": "Boden" }} }},
                {{ "s": {{ "type": "uri", "value": "{p1}" }},
                   "sType": {{ "type": "uri", "value": "{POINT}" }} }}
            ] }} }}"#,
            c1 = iri("C1"),
            c1a = iri("C1a"),
            p1 = iri("P1"),
        );

        let results = SparqlResults::from_json(json.as_bytes()).expect("parse");
        let nodes = snapshot_from_results(&results).expect("snapshot");

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.get(&id("C1a")).and_then(|n| n.label.as_deref()), Some("Boden"));
        assert_eq!(nodes.get(&id("P1")).map(|n| n.kind), Some(NodeKind::InspectionPoint));
    }
}

// =============================================================================
// TIER T1: MATERIALIZATION
// =============================================================================

mod t1_materialization {
    use super::*;

    /// T1.1: The example scenario yields the documented nodes.
    #[test]
    fn scenario_nodes() {
        let nodes = scenario();
        assert_eq!(nodes.len(), 4);

        let c1 = nodes.get(&id("C1")).expect("C1");
        assert_eq!(c1.kind, NodeKind::Collection);
        assert_eq!(c1.label.as_deref(), Some("Fields"));
        assert_eq!(c1.sub_groups, vec![id("C1a")]);
        assert_eq!(c1.inspection_points, vec![id("P1")]);

        let c1a = nodes.get(&id("C1a")).expect("C1a");
        assert_eq!(c1a.parent, Some(id("C1")));
        assert_eq!(c1a.label.as_deref(), Some("Soil"));
        assert_eq!(c1a.inspection_points, vec![id("P2")]);

        assert_eq!(nodes.get(&id("P1")).and_then(|n| n.label.as_deref()), Some("Check drainage"));
        assert_eq!(nodes.get(&id("P2")).and_then(|n| n.label.as_deref()), Some("Check pH"));
    }

    /// T1.2: Reversed row order gives the same snapshot.
    #[test]
    fn scenario_order_independent() {
        let mut rows = scenario_rows();
        rows.reverse();
        assert_eq!(materialize(&rows).expect("materialize"), scenario());
    }

    /// T1.3: Listing a sub-group is enough to make it a child, in either order.
    #[test]
    fn sub_group_listing_sets_parent() {
        let nodes = scenario();
        assert_eq!(nodes.get(&id("C1a")).and_then(|n| n.parent.clone()), Some(id("C1")));
        assert_eq!(nodes.get(&id("C1")).and_then(|n| n.parent.clone()), None);

        let mut rows = scenario_rows();
        rows.reverse();
        let reversed = materialize(&rows).expect("materialize");
        assert_eq!(reversed.get(&id("C1a")).and_then(|n| n.parent.clone()), Some(id("C1")));
    }

    /// T1.4: Conflicting labels resolve to the first row's value.
    #[test]
    fn first_label_wins() {
        let rows = vec![
            Row::subject(iri("C1"), COLLECTION).with_label("Fields"),
            Row::subject(iri("C1"), COLLECTION).with_label("Felder"),
        ];
        let nodes = materialize(&rows).expect("materialize");
        assert_eq!(nodes.get(&id("C1")).and_then(|n| n.label.as_deref()), Some("Fields"));
    }
}

// =============================================================================
// TIER T2: SELECTION COMPRESSION
// =============================================================================

mod t2_compression {
    use super::*;

    /// T2.1: Selecting a group and its sub-group keeps only the group.
    #[test]
    fn ancestor_subsumes_descendant() {
        assert_eq!(compress(&set(&["C1", "C1a"]), &scenario()), set(&["C1"]));
    }

    /// T2.2: Unrelated ids pass through.
    #[test]
    fn unrelated_ids_kept() {
        assert_eq!(compress(&set(&["C1", "P2"]), &scenario()), set(&["C1", "P2"]));
    }

    /// T2.3: Empty in, empty out.
    #[test]
    fn empty_selection() {
        assert!(compress(&BTreeSet::new(), &scenario()).is_empty());
    }

    /// T2.4: The selection object links to the compressed groups.
    #[test]
    fn selection_link_round_trips() {
        let nodes = scenario();
        let selection = Selection::from_ids(set(&["C1", "C1a"])).expect("selection");

        let link = selection.checklist_link(&nodes, "checklist").expect("link");
        assert_eq!(link, "checklist?groups=C1");

        let groups = parse_groups_param(link.split_once("groups=").map(|(_, v)| v), BASE)
            .expect("groups");
        assert_eq!(groups, vec![id("C1")]);
    }
}

// =============================================================================
// TIER T3: CHECKLIST EXPANSION
// =============================================================================

mod t3_expansion {
    use super::*;

    /// T3.1: Collection reaches points at every depth.
    #[test]
    fn scenario_points() {
        let got: BTreeSet<NodeId> = collect_inspection_points(&id("C1"), &scenario())
            .into_iter()
            .collect();
        assert_eq!(got, set(&["P1", "P2"]));
    }

    /// T3.2: A cyclic sub-group graph terminates.
    #[test]
    fn cycle_terminates() {
        let rows = vec![
            Row::subject(iri("X"), COLLECTION)
                .with_sub_group(iri("Y"), None)
                .with_inspection_point(iri("P1"), None),
            Row::subject(iri("Y"), COLLECTION).with_sub_group(iri("X"), None),
        ];
        let nodes = materialize(&rows).expect("materialize");
        assert_eq!(collect_inspection_points(&id("X"), &nodes), vec![id("P1")]);
    }

    /// T3.3: The checklist numbers the scenario as 1 and 1.1.
    #[test]
    fn scenario_checklist() {
        let checklist = build_checklist(&[id("C1")], &scenario());
        let outline: Vec<(String, String, usize)> = checklist
            .sections
            .iter()
            .map(|s| (s.number_label(), s.title.clone(), s.items.len()))
            .collect();
        assert_eq!(
            outline,
            vec![
                ("1".to_string(), "Fields".to_string(), 1),
                ("1.1".to_string(), "Soil".to_string(), 1),
            ]
        );
    }
}
