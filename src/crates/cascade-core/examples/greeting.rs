//! Bind a named input and run a small two-node graph on the tokio pool.
//!
//! ```sh
//! cargo run --example greeting
//! ```

use std::sync::Arc;

use cascade_core::{call1, call2, graph, node1, node2, Name, TokioSpawn};

#[tokio::main]
async fn main() -> cascade_core::Result<()> {
    let who = Name::<String>::new("who");

    let mut builder = graph::<String>();
    builder.inputs(&[&who]);

    let greeting = builder.call(
        call1(node1(|name: String| async move { Ok(format!("hello {name}")) }))
            .with(&who)
            .named("greeting"),
    );
    builder.call(
        call2(node2(|greeting: String, name: String| async move {
            Ok(format!("{greeting}! nice to meet you, {name}."))
        }))
        .with(&greeting, &who)
        .named("sentence"),
    );

    let sentence = builder.build()?;
    let out = sentence
        .bind(&who, "petter".to_string())
        .run(Arc::new(TokioSpawn::current()))
        .await?;
    println!("{out}");
    Ok(())
}
