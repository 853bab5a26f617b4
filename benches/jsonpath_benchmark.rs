// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use octofhir_jsonpath::{FunctionRegistry, JsonPathEngine, compile_query, parse};
use serde_json::{Value, json};
use std::hint::black_box;

const QUERIES: &[&str] = &[
    "$.store.book[*].author",
    "$..author",
    "$.store.book[-1:]",
    "$.store.book[::-2].title",
    "$..book[?@.price < 10].title",
    "$..book[?@.isbn && match(@.author, '.*Tolkien')].title",
    "$..*",
];

fn bookstore(copies: usize) -> Value {
    let books: Vec<Value> = (0..copies)
        .flat_map(|i| {
            [
                json!({"category": "reference", "author": "Nigel Rees", "title": format!("Sayings {i}"), "price": 8.95}),
                json!({"category": "fiction", "author": "Evelyn Waugh", "title": format!("Sword {i}"), "price": 12.99}),
                json!({"category": "fiction", "author": "Herman Melville", "title": format!("Moby {i}"), "isbn": "0-553-21311-3", "price": 8.99}),
                json!({"category": "fiction", "author": "J. R. R. Tolkien", "title": format!("Rings {i}"), "isbn": "0-395-19395-8", "price": 22.99}),
            ]
        })
        .collect();
    json!({"store": {"book": books, "bicycle": {"color": "red", "price": 399}}, "expensive": 10})
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for query in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, query| {
            b.iter(|| black_box(parse(black_box(query))))
        });
    }
    group.finish();
}

fn benchmark_compile(c: &mut Criterion) {
    let registry = FunctionRegistry::standard();
    c.bench_function("parse_compile_all", |b| {
        b.iter(|| {
            for query in QUERIES {
                black_box(compile_query(black_box(query), &registry).ok());
            }
        })
    });
}

fn benchmark_precompiled(c: &mut Criterion) {
    let registry = FunctionRegistry::standard();
    let mut group = c.benchmark_group("run_precompiled");
    for copies in [1, 100] {
        let doc = bookstore(copies);
        for query in QUERIES {
            let Ok(program) = compile_query(query, &registry) else {
                continue;
            };
            group.bench_with_input(
                BenchmarkId::new(*query, copies),
                &doc,
                |b, doc| b.iter(|| black_box(program.query(black_box(doc)).len())),
            );
        }
    }
    group.finish();
}

fn benchmark_engine(c: &mut Criterion) {
    let engine = JsonPathEngine::new();
    let doc = bookstore(10);
    c.bench_function("engine_cached_query", |b| {
        b.iter(|| {
            for query in QUERIES {
                black_box(engine.query(black_box(query), &doc).map(|r| r.len()).ok());
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_parser,
    benchmark_compile,
    benchmark_precompiled,
    benchmark_engine
);
criterion_main!(benches);
