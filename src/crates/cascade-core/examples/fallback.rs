//! A failing node recovered by a per-node fallback, and the diagnostics a
//! failure carries when there is no fallback to absorb it.
//!
//! ```sh
//! cargo run --example fallback
//! ```

use std::sync::Arc;

use cascade_core::{call0, call1, graph, node0, node1, GraphError, Inline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> cascade_core::Result<()> {
    // With a fallback the failure never leaves the node.
    let recovered = call0(node0(|| async { Err::<String, _>("service down".into()) }))
        .fallback("cached response".to_string())
        .named("flaky-service")
        .build()?;
    println!("recovered: {}", recovered.run(Arc::new(Inline)).await?);

    // Without one, the sink fails with the full execution context.
    let mut builder = graph::<String>();
    let flaky = builder.call(
        call0(node0(|| async { Err::<String, _>("service down".into()) })).named("flaky-service"),
    );
    builder.call(
        call1(node1(|s: String| async move { Ok(s) }))
            .with(&flaky)
            .named("consumer"),
    );

    match builder.build()?.run(Arc::new(Inline)).await {
        Ok(out) => println!("unexpected success: {out}"),
        Err(GraphError::Execution(e)) => {
            println!("failed at '{}': {e}", e.node().name());
            println!("completed calls before the failure: {}", e.calls().len());
        }
        Err(other) => println!("failed: {other}"),
    }
    Ok(())
}
