mod buckets;
mod engine;
mod funding;
mod guard;
mod lifecycle;
mod oracle;

/// Assert that an error chain carries the given protocol error id (the
/// snake_case serialization, e.g. "stale_price").
pub(crate) fn assert_err_id(err: anyhow::Error, id: &str) {
    let chain = format!("{err:?}");
    assert!(
        chain.contains(&format!("\"{id}\"")),
        "expected error id {id}, got: {chain}"
    );
}
