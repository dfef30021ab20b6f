use nftkit_builder::{
    expr::{ct, tcp, Expr},
    fields, Batch, BatchBuilder, BuildError, BuilderOptions,
};
use nftkit_wire::{Family, Kind, Operation, SerializedBatch};
use serde_json::{json, Value};

#[test]
fn table_chain_rule_carries_context() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter" })
        .unwrap()
        .add(fields! { "chain" => "INPUT", "hook" => "input", "policy" => "drop" })
        .unwrap()
        .add(fields! { "rule" => vec![json!({ "accept": null })] })
        .unwrap();

    let batch = builder.build();
    assert_eq!(batch.len(), 3);

    let kinds: Vec<_> = batch.commands().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, [Kind::Table, Kind::Chain, Kind::Rule]);

    let rule = &batch.commands()[2];
    assert_eq!(rule.get_str("table"), Some("filter"));
    assert_eq!(rule.get_str("chain"), Some("INPUT"));
    assert_eq!(rule.get_str("family"), Some("ip"));
}

#[test]
fn serialized_form_is_exact() {
    let mut builder = BatchBuilder::with_options(BuilderOptions::default().with_default_family(Family::Inet));
    builder
        .add(fields! { "table" => "filter" })
        .unwrap()
        .add(fields! { "chain" => "input", "hook" => "input", "prio" => 0, "policy" => "drop" })
        .unwrap()
        .add(fields! {
            "rule" => Expr::new().with(ct::state(["established", "related"])).accept(),
            "comment" => "stateful",
        })
        .unwrap();

    let expected = json!([
        { "add": { "table": { "family": "inet", "name": "filter" } } },
        { "add": { "chain": {
            "family": "inet", "table": "filter", "name": "input",
            "type": "filter", "hook": "input", "prio": 0, "policy": "drop"
        } } },
        { "add": { "rule": {
            "family": "inet", "table": "filter", "chain": "input", "comment": "stateful",
            "expr": [
                { "match": { "op": "in", "left": { "ct": { "key": "state" } },
                             "right": ["established", "related"] } },
                { "accept": null }
            ]
        } } }
    ]);

    // Key order matters, so compare the text.
    assert_eq!(builder.serialize().to_string(), expected.to_string());
}

#[test]
fn serialization_round_trips() {
    let mut builder = BatchBuilder::new();
    builder
        .flush_ruleset()
        .add(fields! { "table" => "nat", "family" => "ip6" })
        .unwrap()
        .add(fields! { "set" => "blocked", "type" => "ipv6_addr", "flags" => vec!["interval"] })
        .unwrap()
        .add(fields! { "element" => vec![json!("2001:db8::1")] })
        .unwrap()
        .add(fields! { "counter" => "hits" })
        .unwrap()
        .delete(fields! { "quota" => "old" })
        .unwrap();

    let batch = builder.build();
    let serialized = batch.serialize();
    let reparsed = SerializedBatch::parse(&serialized.to_document().to_string()).unwrap();

    assert_eq!(Batch::parse(&reparsed).unwrap().commands(), batch.commands());
    assert_eq!(reparsed.to_string(), serialized.to_string());
    assert_eq!(serialized.entries()[0], json!({ "flush": { "ruleset": null } }));
}

#[test]
fn rule_without_scope_fails() {
    let mut builder = BatchBuilder::new();
    let err = builder.add(fields! { "rule" => vec![json!({ "drop": null })] }).unwrap_err();

    assert!(matches!(err, BuildError::MissingContext { field: "table", .. }));
    assert!(builder.batch().is_empty());
}

#[test]
fn failed_calls_leave_the_session_untouched() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter" }).unwrap();
    let before = builder.clone().build();

    // Names a new chain but fails validation: neither a command nor the chain name may stick.
    let err = builder
        .add(fields! { "chain" => "forward", "rule" => Expr::new().with(tcp::dport(65536)).accept() })
        .unwrap_err();
    assert!(matches!(err, BuildError::Range { .. }));

    assert_eq!(builder.batch(), &before);
    assert_eq!(builder.context().chain(), None);
}

#[test]
fn ambiguous_set_and_map() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter" }).unwrap();

    let err = builder.add(fields! { "set" => "s1", "map" => "m1" }).unwrap_err();
    assert_eq!(err, BuildError::AmbiguousObject { candidates: vec!["map", "set"] });
}

#[test]
fn flush_element_is_unsupported() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter" }).unwrap();
    builder.add(fields! { "set" => "ports", "type" => "inet_service" }).unwrap();

    let err = builder.flush(fields! { "element" => vec![json!(22)] }).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnsupportedOperation {
            operation: Operation::Flush,
            kind: Kind::Element,
            valid: vec![Operation::Add, Operation::Delete],
        }
    );
}

#[test]
fn element_ports_are_checked_against_the_set_type() {
    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter" })
        .unwrap()
        .add(fields! { "set" => "ports", "type" => "inet_service" })
        .unwrap();

    builder.add(fields! { "element" => vec![json!(0), json!(65535)] }).unwrap();
    for bad in [-1, 65536] {
        let err = builder.add(fields! { "element" => vec![json!(bad)] }).unwrap_err();
        assert_eq!(err, BuildError::Range { field: "elem".into(), bound: "0..=65535".into() });
    }

    let element = &builder.batch().commands()[2];
    assert_eq!(element.get_str("name"), Some("ports"));
    assert_eq!(element.get("elem"), Some(&json!([0, 65535])));
}

#[test]
fn rules_expand_in_input_order() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter", "chain" => "input" }).unwrap();
    builder
        .add(fields! { "rules" => vec![
            Expr::new().with(tcp::dport(22)).accept(),
            Expr::new().with(tcp::dport(80)).accept(),
            Expr::new().drop(),
        ] })
        .unwrap();

    let batch = builder.build();
    assert_eq!(batch.len(), 4);

    let ports: Vec<Value> =
        batch.commands()[1..3].iter().map(|c| c.get("expr").unwrap()[0]["match"]["right"].clone()).collect();
    assert_eq!(ports, [json!(22), json!(80)]);
    assert!(batch.commands()[1..].iter().all(|c| c.get_str("chain") == Some("input")));
}

#[test]
fn cleared_context_fails_lazily() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter", "chain" => "input" }).unwrap();

    // Clearing succeeds on its own.
    builder.set_context(fields! { "chain" => Value::Null }).unwrap();
    assert_eq!(builder.context().chain(), None);

    let err = builder.add(fields! { "rule" => Expr::new().accept() }).unwrap_err();
    assert!(matches!(err, BuildError::MissingContext { field: "chain", .. }));

    builder.set_context(fields! { "chain" => "forward" }).unwrap();
    builder.add(fields! { "rule" => Expr::new().accept() }).unwrap();
    assert_eq!(builder.batch().commands()[1].get_str("chain"), Some("forward"));
}

#[test]
fn set_context_rejects_unknown_fields() {
    let mut builder = BatchBuilder::new();

    assert!(matches!(
        builder.set_context(fields! { "hook" => "input" }),
        Err(BuildError::InvalidField { .. })
    ));
    assert!(matches!(
        builder.set_context(fields! { "family" => "ipx" }),
        Err(BuildError::InvalidEnum { .. })
    ));
}

#[test]
fn non_scope_calls_keep_context() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter", "family" => "inet", "chain" => "input" }).unwrap();
    let context = builder.context().clone();

    builder
        .add(fields! { "rule" => Expr::new().accept() })
        .unwrap()
        .add(fields! { "counter" => "hits" })
        .unwrap()
        .add(fields! { "limit" => "ssh", "rate" => 10, "per" => "minute" })
        .unwrap();

    assert_eq!(builder.context(), &context);
    assert_eq!(context.family(), Family::Inet);
}

#[test]
fn map_declaration_uses_wire_key_map() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter" }).unwrap();
    builder.add(fields! { "map" => "svc", "type" => "inet_service", "mapType" => "verdict" }).unwrap();
    builder.add(fields! { "element" => vec![json!([22, { "accept": null }])] }).unwrap();

    let commands = builder.batch().commands();
    assert_eq!(commands[1].get_str("map"), Some("verdict"));
    assert_eq!(commands[2].get_str("name"), Some("svc"));

    let err = builder.add(fields! { "map" => "m2", "type" => "ipv4_addr" }).unwrap_err();
    assert_eq!(err, BuildError::MissingField { kind: Kind::Map, field: "mapType" });
}

#[test]
fn reselected_map_still_needs_pairs() {
    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter" })
        .unwrap()
        .add(fields! { "map" => "m", "type" => "inet_service", "mapType" => "verdict" })
        .unwrap()
        .set_context(fields! { "collection" => "other" })
        .unwrap()
        .set_context(fields! { "collection" => "m", "collectionType" => "inet_service" })
        .unwrap();

    assert_eq!(builder.context().collection_kind(), Some(Kind::Map));

    let err = builder.add(fields! { "element" => vec![json!(22)] }).unwrap_err();
    assert!(matches!(err, BuildError::InvalidField { field, .. } if field == "elem"));

    builder.add(fields! { "element" => vec![json!([22, { "accept": null }])] }).unwrap();
    assert_eq!(builder.batch().len(), 3);
}

#[test]
fn renamed_chain_receives_later_rules() {
    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter", "chain" => "old" })
        .unwrap()
        .rename(fields! { "chain" => "old", "newname" => "new" })
        .unwrap()
        .add(fields! { "rule" => Expr::new().accept() })
        .unwrap();

    assert_eq!(builder.context().chain(), Some("new"));

    let commands = builder.batch().commands();
    assert_eq!(commands[1].get_str("name"), Some("old"));
    assert_eq!(commands[1].get_str("newname"), Some("new"));
    assert_eq!(commands[2].get_str("chain"), Some("new"));
}

#[test]
fn collection_type_must_be_named() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter" }).unwrap();

    for ty in [Value::Null, json!(5), json!(""), json!([])] {
        let err = builder.add(fields! { "set" => "s", "type" => ty.clone() }).unwrap_err();
        assert!(matches!(err, BuildError::InvalidField { field, .. } if field == "type"), "{ty}");
    }
    assert_eq!(builder.batch().len(), 1);

    builder.add(fields! { "set" => "s", "type" => vec!["ipv4_addr", "inet_service"] }).unwrap();
    assert_eq!(builder.batch().commands()[1].get("type"), Some(&json!(["ipv4_addr", "inet_service"])));
}

#[test]
fn non_scope_kinds_beside_an_element_fail_at_build() {
    let mut builder = BatchBuilder::new();
    builder.add(fields! { "table" => "filter", "set" => "s", "type" => "inet_service" }).unwrap();
    let before = builder.batch().clone();

    let err = builder.add(fields! { "counter" => "c", "element" => vec![json!(22)] }).unwrap_err();
    assert_eq!(
        err,
        BuildError::InvalidField {
            field: "counter".into(),
            reason: "counter cannot be used as context for element".into(),
        }
    );
    assert_eq!(builder.batch(), &before);
}
