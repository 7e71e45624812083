use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use weft_core::state::{AppendReducer, StateSchema};
use weft_core::{StateGraph, END};

fn build_linear_graph() -> StateGraph {
    let mut schema = StateSchema::new();
    schema.add_channel("log", Box::new(AppendReducer));

    let mut graph = StateGraph::with_schema(schema);
    graph.add_node("a", |_state| {
        Box::pin(async move { Ok(json!({"log": ["a"]})) })
    });
    graph.add_node("b", |_state| {
        Box::pin(async move { Ok(json!({"log": ["b"]})) })
    });
    graph.add_node("c", |_state| {
        Box::pin(async move { Ok(json!({"log": ["c"]})) })
    });
    graph.set_entry_point("a");
    graph.add_edge("a", "b");
    graph.add_edge("b", "c");
    graph.add_edge("c", END);
    graph
}

fn compile_benchmark(c: &mut Criterion) {
    c.bench_function("graph compile", |b| {
        b.iter(|| black_box(build_linear_graph()).compile().unwrap());
    });
}

fn invoke_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("linear graph invoke", |b| {
        b.to_async(&runtime).iter(|| async {
            let compiled = build_linear_graph().compile().unwrap();
            compiled
                .invoke(black_box(json!({"log": []})), "bench-thread")
                .await
                .unwrap();
        });
    });
}

criterion_group!(benches, compile_benchmark, invoke_benchmark);
criterion_main!(benches);
