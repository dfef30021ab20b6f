use nftkit_builder::{classify, registry::schema_for_key, BuildError, FieldBag};
use nftkit_wire::Kind;
use proptest::prelude::*;
use serde_json::json;

/// The canonical key of every object kind.
const KINDS: &[&str] =
    &["table", "chain", "rule", "set", "map", "element", "flowtable", "counter", "quota", "limit"];

/// Scope and attribute keys that may accompany any main object.
const EXTRA: &[(&str, &str)] = &[("table", "filter"), ("family", "inet"), ("comment", "x")];

fn bag(keys: &[(&'static str, serde_json::Value)]) -> FieldBag {
    keys.iter().cloned().collect()
}

proptest! {
    #[test]
    fn single_kind_is_found_in_any_order(
        kind in prop::sample::select(vec!["chain", "set", "map", "flowtable", "counter", "quota", "limit"]),
        extra in prop::sample::subsequence(EXTRA.to_vec(), 0..=EXTRA.len()),
        seed in any::<u64>(),
    ) {
        let mut keys: Vec<(&'static str, serde_json::Value)> =
            extra.iter().map(|(k, v)| (*k, json!(v))).collect();
        keys.push((kind, json!("main")));

        // Rotate the insertion order.
        let len = keys.len();
        keys.rotate_left((seed as usize) % len);

        let classified = classify(&bag(&keys)).unwrap();
        prop_assert_eq!(classified.kind.as_str(), kind);
        prop_assert_eq!(classified.value.as_str(), Some("main"));
    }

    #[test]
    fn higher_priority_kind_wins(
        pair in prop::sample::subsequence(KINDS.to_vec(), 2),
        swap in any::<bool>(),
    ) {
        let (a, b) = (schema_for_key(pair[0]).unwrap(), schema_for_key(pair[1]).unwrap());
        prop_assume!(a.priority != b.priority);
        let (main, lower) = if a.priority > b.priority { (a, b) } else { (b, a) };

        let mut keys: Vec<_> = pair.iter().map(|k| (*k, json!("x"))).collect();
        if swap {
            keys.reverse();
        }

        let classified = classify(&bag(&keys)).unwrap();
        prop_assert_eq!(classified.kind, main.kind);
        prop_assert_eq!(classified.key, main.keys[0]);

        let context = &classified.context;
        match lower.kind {
            Kind::Table => prop_assert_eq!(context.table.as_deref(), Some("x")),
            Kind::Chain => prop_assert_eq!(context.chain.as_deref(), Some("x")),
            Kind::Set | Kind::Map => {
                prop_assert_eq!(context.collection.clone(), Some((lower.kind, "x".to_string())))
            }
            _ => prop_assert_eq!(classified.unscoped.clone(), vec![(lower.kind, lower.keys[0])]),
        }
    }

    #[test]
    fn equal_top_priority_is_ambiguous(
        pair in prop::sample::subsequence(vec!["set", "map", "flowtable", "counter", "quota", "limit"], 2),
        swap in any::<bool>(),
    ) {
        let mut keys: Vec<_> = pair.iter().map(|k| (*k, json!("x"))).collect();
        if swap {
            keys.reverse();
        }

        let mut expected = pair.clone();
        expected.sort_unstable();
        prop_assert_eq!(
            classify(&bag(&keys)).unwrap_err(),
            BuildError::AmbiguousObject { candidates: expected }
        );
    }
}
