use nftkit::{
    expr::{ip, tcp, Expr},
    fields, submit, BatchBuilder, CaptureHandler, Family, Query, Response, SubmitOptions,
};
use serde_json::json;

#[tokio::test]
async fn build_submit_and_read_back() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut builder = BatchBuilder::new();
    builder
        .add(fields! { "table" => "filter", "family" => "inet" })
        .unwrap()
        .add(fields! { "chain" => "input", "hook" => "input", "policy" => "drop" })
        .unwrap()
        .add(fields! { "rule" => Expr::new().with(ip::saddr("10.0.0.0/8")).with(tcp::dport(22)).accept() })
        .unwrap();

    let listing = json!({ "nftables": [
        { "metainfo": { "version": "1.0.9", "json_schema_version": 1 } },
        { "table": { "family": "inet", "name": "filter", "handle": 1 } },
        { "chain": { "family": "inet", "table": "filter", "name": "input", "handle": 1 } }
    ] });
    let mut handler = CaptureHandler::new().with_response(Response::new(listing.to_string()));

    let batch = builder.serialize();
    submit(&batch, &mut handler, &SubmitOptions::default()).await.unwrap();

    let query = Query::table(Family::Inet, "filter").serialize();
    let response = submit(&query, &mut handler, &SubmitOptions::default()).await.unwrap();

    let listed = response.listing().unwrap();
    assert_eq!(listed.objects.len(), 2);
    assert_eq!(handler.captured(), vec![batch, query]);
    assert_eq!(handler.captured()[1].to_string(), r#"[{"list":{"table":{"family":"inet","name":"filter"}}}]"#);
}
