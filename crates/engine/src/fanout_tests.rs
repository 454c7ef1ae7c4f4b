use super::*;
use dagflow_core::{FilterDescriptor, ResourceKind};
use std::collections::BTreeMap;

fn item(s: &str) -> ItemName {
    ItemName::new(s)
}

fn file(provider: &str, label: &str) -> Resource {
    Resource::new(item(provider), ResourceKind::File, label)
}

#[test]
fn no_predecessors_still_yields_one_empty_combination() {
    let combos = FanOutExpander::expand(&item("root"), &[], &HashMap::new());
    assert_eq!(combos, vec![Vec::<Resource>::new()]);
}

#[test]
fn unfiltered_connection_passes_through_unchanged() {
    let resources = vec![file("a", "data")];
    let combos = FanOutExpander::expand(
        &item("b"),
        &[(item("a"), resources.clone())],
        &HashMap::new(),
    );
    assert_eq!(combos, vec![resources]);
}

#[test]
fn two_active_filters_on_one_label_fan_out_to_two_combinations() {
    let mut conn = Connection::new(item("a"), item("b"), "out", "in");
    let mut flags = BTreeMap::new();
    flags.insert("scenario-1".to_string(), true);
    flags.insert("scenario-2".to_string(), true);
    conn.set_online("data", "scenario", flags);

    let mut connections = HashMap::new();
    connections.insert((item("a"), item("b")), conn);

    let combos = FanOutExpander::expand(
        &item("b"),
        &[(item("a"), vec![file("a", "data")])],
        &connections,
    );
    assert_eq!(combos.len(), 2);
    for combo in &combos {
        assert_eq!(combo.len(), 1);
        assert_eq!(combo[0].filter_stack.len(), 1);
    }
}

#[test]
fn two_predecessors_fan_out_as_a_product() {
    let mut conn_a = Connection::new(item("a"), item("c"), "out", "in");
    let mut flags_a = BTreeMap::new();
    flags_a.insert("s1".to_string(), true);
    flags_a.insert("s2".to_string(), true);
    conn_a.set_online("data", "scenario", flags_a);

    let conn_b = Connection::new(item("b"), item("c"), "out", "in");

    let mut connections = HashMap::new();
    connections.insert((item("a"), item("c")), conn_a);
    connections.insert((item("b"), item("c")), conn_b);

    let combos = FanOutExpander::expand(
        &item("c"),
        &[(item("a"), vec![file("a", "data")]), (item("b"), vec![file("b", "other")])],
        &connections,
    );
    assert_eq!(combos.len(), 2);
    for combo in &combos {
        assert_eq!(combo.len(), 2);
    }
}

#[test]
fn a_predecessor_with_two_resources_never_expands_even_if_one_is_filtered() {
    let mut conn = Connection::new(item("a"), item("b"), "out", "in");
    let mut flags = BTreeMap::new();
    flags.insert("scenario-1".to_string(), true);
    flags.insert("scenario-2".to_string(), true);
    conn.set_online("data", "scenario", flags);

    let mut connections = HashMap::new();
    connections.insert((item("a"), item("b")), conn);

    let two_resources = vec![file("a", "data"), file("a", "other")];
    let combos = FanOutExpander::expand(&item("b"), &[(item("a"), two_resources.clone())], &connections);

    assert_eq!(combos, vec![two_resources], "a multi-resource tuple passes through unchanged per spec");
}

#[test]
fn composite_filter_id_is_none_when_nothing_filtered() {
    let combo = vec![file("a", "data")];
    assert_eq!(composite_filter_id_for_combination(&combo), None);
}

#[test]
fn composite_filter_id_joins_filtered_resources_in_order() {
    let filtered = file("a", "data").with_filter_stack(vec![FilterDescriptor {
        filter_type: "scenario".to_string(),
        filter_id: "s1".to_string(),
        online: true,
    }]);
    let plain = file("b", "other");
    let combo = vec![filtered.clone(), plain];
    let composite = composite_filter_id_for_combination(&combo).expect("one filtered resource");
    assert_eq!(composite, filtered.filter_id());
}
