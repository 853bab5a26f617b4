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

//! End-to-end query behaviour against the public API

use octofhir_jsonpath::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

mod utils;
use utils::{bookstore, run, run_array};

#[test]
fn test_index_and_reverse_slice() {
    assert_eq!(run_array("$[1]", &json!([10, 20, 30])), json!([20]));
    assert_eq!(
        run_array("$[-2::-1]", &json!([0, 1, 2, 3, 4])),
        json!([3, 2, 1, 0])
    );
}

#[rstest]
#[case("$[:-1]", json!([0, 1, 2, 3]))]
#[case("$[:-3:-1]", json!([4, 3]))]
#[case("$[1:-1:2]", json!([1, 3]))]
#[case("$[-4:-1]", json!([1, 2, 3]))]
#[case("$[-1:-4:-1]", json!([4, 3, 2]))]
#[case("$[10:]", json!([]))]
#[case("$[:10]", json!([0, 1, 2, 3, 4]))]
#[case("$[4:1]", json!([]))]
#[case("$[1:4:-1]", json!([]))]
fn test_slice_specializations(#[case] query_text: &str, #[case] expected: serde_json::Value) {
    let doc = json!([0, 1, 2, 3, 4]);
    assert_eq!(run_array(query_text, &doc), expected);
}

#[test]
fn test_negative_index_equivalence() {
    for n in 0..5 {
        let doc = serde_json::Value::Array((0..n).map(serde_json::Value::from).collect());
        let last = run("$[-1]", &doc);
        if n == 0 {
            assert!(last.is_empty());
        } else {
            assert_eq!(last, run(&format!("$[{}]", n - 1), &doc));
        }
    }
}

#[test]
fn test_unbounded_slice_equals_wildcard_on_arrays() {
    let doc = json!([{"a": 1}, [2], "three", null]);
    assert_eq!(run("$[::1]", &doc), run("$[*]", &doc));
    assert_eq!(run("$[:]", &doc), run("$[*]", &doc));
    // Slices ignore objects, wildcards do not
    let object = json!({"a": 1});
    assert!(run("$[::1]", &object).is_empty());
    assert_eq!(run("$[*]", &object), vec![json!(1)]);
}

#[test]
fn test_filter_scenarios() {
    assert_eq!(
        run_array(
            "$[?length(@.name) == 4]",
            &json!([{"name": "abcd"}, {"name": "xy"}])
        ),
        json!([{"name": "abcd"}])
    );
    assert_eq!(
        run_array(
            "$.items[?@.x[0] == 1]",
            &json!({"items": [{"x": [1, 2]}, {"x": [3, 4]}]})
        ),
        json!([{"x": [1, 2]}])
    );
}

#[test]
fn test_match_dot_excludes_newlines() {
    let doc = json!(["abc", "a\nbc", "a\nc", "axc"]);
    assert_eq!(run_array("$[?match(@, 'a.c')]", &doc), json!(["abc", "axc"]));
    assert_eq!(run_array("$[?search(@, 'a.')]", &doc), json!(["abc", "axc"]));
    assert_eq!(run_array("$[?match(@, 'a[.\\n]c')]", &doc), json!(["a\nc"]));
}

#[test]
fn test_empty_and_nothing_equality() {
    let doc = json!([{"a": 1}, {"b": 2}]);
    assert_eq!(run_array("$[?@.x == @.y]", &doc), doc);
    assert_eq!(run_array("$[?@.x == 1]", &doc), json!([]));
    assert_eq!(run_array("$[?@.x != 1]", &doc), doc);
    assert_eq!(run_array("$[?@.a == @.x]", &doc), json!([{"b": 2}]));
    assert_eq!(run_array("$[?value(@.x) == @.y]", &doc), doc);
    assert_eq!(run_array("$[?@.x <= @.y]", &doc), json!([]));
}

#[rstest]
#[case("$.store.book[*].author", json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]))]
#[case("$..author", json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]))]
#[case("$.store..price", json!([399, 8.95, 12.99, 8.99, 22.99]))]
#[case("$..book[2].title", json!(["Moby Dick"]))]
#[case("$..book[-1].title", json!(["The Lord of the Rings"]))]
#[case("$..book[0,1].title", json!(["Sayings of the Century", "Sword of Honour"]))]
#[case("$..book[:2].category", json!(["reference", "fiction"]))]
#[case("$..book[?@.isbn].title", json!(["Moby Dick", "The Lord of the Rings"]))]
#[case("$..book[?@.price < 10].title", json!(["Sayings of the Century", "Moby Dick"]))]
#[case("$..book[?@.price > $.expensive].title", json!(["Sword of Honour", "The Lord of the Rings"]))]
#[case("$..book[?@.author == 'Herman Melville' || @.price >= 22.99].price", json!([8.99, 22.99]))]
#[case("$..book[?!(@.category == 'fiction')].author", json!(["Nigel Rees"]))]
#[case("$.store.*.color", json!(["red"]))]
#[case("$.store[?@.color]", json!([{"color": "red", "price": 399}]))]
#[case("$..[?count(@.*) == 2].color", json!(["red"]))]
#[case("$..book[?match(@.author, '.*Tolkien')].title", json!(["The Lord of the Rings"]))]
#[case("$.missing..author", json!([]))]
fn test_bookstore(#[case] query_text: &str, #[case] expected: serde_json::Value) {
    assert_eq!(run_array(query_text, &bookstore()), expected, "{query_text}");
}

#[test]
fn test_descendants_visit_members_in_key_order() {
    let doc = json!({"b": {"k": 2}, "a": {"k": 1}, "c": [{"k": 3}, {"k": 4}]});
    assert_eq!(run_array("$..k", &doc), json!([1, 2, 3, 4]));
    assert_eq!(run_array("$..*", &json!({"y": [1], "x": 2})), json!([2, [1], 1]));
}

#[test]
fn test_duplicates_are_preserved() {
    let doc = json!({"a": [1, 2]});
    assert_eq!(run_array("$.a[0, 0, -2]", &doc), json!([1, 1, 1]));
    assert_eq!(run_array("$['a', 'a'][1]", &doc), json!([2, 2]));
}

#[test]
fn test_shape_mismatches_never_fail() {
    let registry = FunctionRegistry::standard();
    let queries = [
        "$.a.b.c",
        "$[0][1:2]",
        "$..[?@ > 1]",
        "$[?length(@) == 1]",
        "$[?value(@.*) == 1]",
        "$.*[?match(@, 1)]",
    ];
    let documents = [json!(null), json!("text"), json!(42), json!([]), json!({"a": [1, {"b": "x"}]})];
    for query_text in queries {
        let program = must_compile(query_text, &registry);
        for doc in &documents {
            let _ = program.query(doc);
        }
    }
}

#[test]
fn test_program_runs_are_idempotent() {
    let program = must_compile("$..book[?@.price < 20].title", &FunctionRegistry::standard());
    let doc = bookstore();
    let first = program.query(&doc);
    let second = program.query(&doc);
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_nested_filters() {
    let doc = json!([
        {"tags": [{"n": "a"}, {"n": "b"}]},
        {"tags": [{"n": "c"}]}
    ]);
    assert_eq!(
        run_array("$[?@.tags[?@.n == 'b']]", &doc),
        json!([{"tags": [{"n": "a"}, {"n": "b"}]}])
    );
}

#[test]
fn test_nested_filter_resolves_root_against_document() {
    let doc = json!({
        "limit": 1,
        "items": [
            {"xs": [{"v": 1}, {"v": 2}]},
            {"xs": [{"v": 3}], "limit": 3}
        ]
    });
    assert_eq!(
        run_array("$.items[?@.xs[?@.v == $.limit]]", &doc),
        json!([{"xs": [{"v": 1}, {"v": 2}]}])
    );
    assert_eq!(
        run_array("$.items[?@.xs[?@.v == @.limit]]", &doc),
        json!([])
    );
}

#[test]
fn test_top_level_wrappers() {
    let registry = FunctionRegistry::standard();
    let doc = json!([9, 8]);
    let path = must_parse("$[0]");
    let program = compile(&path, &registry).unwrap();
    assert_eq!(program.query(&doc), vec![&json!(9)]);
    assert_eq!(must_query("$[1]", &doc, &registry), vec![&json!(8)]);
    assert_eq!(execute(&program, &doc), vec![&json!(9)]);
}

#[test]
#[should_panic(expected = "expected root")]
fn test_must_parse_panics() {
    must_parse("");
}

#[test]
#[should_panic(expected = "literal must be compared")]
fn test_must_query_panics() {
    must_query("$[?true]", &json!([]), &FunctionRegistry::standard());
}
