use super::*;

fn descriptor(filter_type: &str, id: &str) -> FilterDescriptor {
    FilterDescriptor {
        filter_type: filter_type.to_string(),
        filter_id: id.to_string(),
        online: true,
    }
}

#[test]
fn filter_id_is_deterministic() {
    let stack = vec![descriptor("scenario", "1"), descriptor("tool", "a")];
    assert_eq!(filter_id(&stack), filter_id(&stack));
}

#[test]
fn filter_id_differs_for_different_stacks() {
    let a = vec![descriptor("scenario", "1")];
    let b = vec![descriptor("scenario", "2")];
    assert_ne!(filter_id(&a), filter_id(&b));
}

#[test]
fn empty_stack_is_unfiltered_but_still_has_a_stable_id() {
    let empty: FilterStack = Vec::new();
    assert_eq!(filter_id(&empty), filter_id(&empty));
}

#[test]
fn composite_filter_id_joins_in_predecessor_order() {
    let composite = composite_filter_id(["aaa", "bbb", "ccc"]);
    assert_eq!(composite, "aaa:bbb:ccc");
}

#[test]
fn pack_resource_never_equals_non_pack_with_same_label() {
    let provider = ItemName::new("loader");
    let pack = Resource::new(provider.clone(), ResourceKind::FilePack, "data");
    let file = Resource::new(provider, ResourceKind::File, "data");
    assert_ne!(pack, file);
}

#[test]
fn resources_with_same_filter_stack_are_equal() {
    let provider = ItemName::new("loader");
    let stack = vec![descriptor("scenario", "1")];
    let a = Resource::new(provider.clone(), ResourceKind::Database, "db")
        .with_filter_stack(stack.clone());
    let b = Resource::new(provider, ResourceKind::Database, "db").with_filter_stack(stack);
    assert_eq!(a, b);
}

#[test]
fn with_expanded_stack_preserves_provenance() {
    let provider = ItemName::new("loader");
    let base = Resource::new(provider, ResourceKind::Database, "db");
    let expanded = base.with_expanded_stack(vec![descriptor("scenario", "1")]);
    assert_eq!(expanded.label, "db");
    assert_eq!(expanded.filter_id(), filter_id(&vec![descriptor("scenario", "1")]));
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_descriptor() -> impl Strategy<Value = FilterDescriptor> {
        ("[a-z]{1,8}", "[a-z0-9]{1,8}", any::<bool>()).prop_map(|(filter_type, filter_id, online)| {
            FilterDescriptor { filter_type, filter_id, online }
        })
    }

    proptest! {
        #[test]
        fn filter_id_is_stable_for_any_stack(stack in proptest::collection::vec(arb_descriptor(), 0..6)) {
            prop_assert_eq!(filter_id(&stack), filter_id(&stack));
        }

        #[test]
        fn reordering_a_stack_changes_its_id(a in arb_descriptor(), b in arb_descriptor()) {
            prop_assume!(a != b);
            let forward = vec![a.clone(), b.clone()];
            let reversed = vec![b, a];
            prop_assert_ne!(filter_id(&forward), filter_id(&reversed));
        }

        #[test]
        fn composite_id_joins_every_part_with_a_colon(ids in proptest::collection::vec("[a-z0-9]{1,6}", 1..5)) {
            let composite = composite_filter_id(ids.iter().map(String::as_str));
            prop_assert_eq!(composite.matches(':').count(), ids.len() - 1);
        }
    }
}
