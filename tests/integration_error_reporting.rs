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

//! Error reporting through the top-level API

use octofhir_jsonpath::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn parse_failure(query_text: &str) -> ParseError {
    match query(query_text, &json!(null), &FunctionRegistry::standard()) {
        Err(JsonPathError::Parse(err)) => err,
        other => panic!("{query_text}: expected a parse error, got {other:?}"),
    }
}

#[rstest]
#[case("", ParseErrorKind::ExpectedRoot, 0)]
#[case(" $", ParseErrorKind::ExpectedRoot, 0)]
#[case("$ ", ParseErrorKind::ExpectedRoot, 0)]
#[case("@.a", ParseErrorKind::ExpectedRoot, 0)]
#[case("$.a.", ParseErrorKind::UnexpectedToken, 4)]
#[case("$['a'", ParseErrorKind::UnexpectedToken, 5)]
#[case("$['a]", ParseErrorKind::UnterminatedString, 5)]
#[case("$['\\q']", ParseErrorKind::BadEscape, 3)]
#[case("$[?(@ == 01)]", ParseErrorKind::BadNumber, 9)]
#[case("$[1:x]", ParseErrorKind::BadSlice, 4)]
#[case("$[?length(@ @)]", ParseErrorKind::BadFunctionCall, 12)]
#[case("$[?@.a == 1 == 2]", ParseErrorKind::UnexpectedToken, 12)]
fn test_parse_errors(#[case] query_text: &str, #[case] kind: ParseErrorKind, #[case] position: usize) {
    let err = parse_failure(query_text);
    assert_eq!((err.kind, err.position), (kind, position), "{query_text}");
    assert_eq!(err.query, query_text);
}

#[test]
fn test_parse_error_message() {
    let err = parse_failure("$[1:x]");
    assert_eq!(
        err.to_string(),
        "invalid JSONPath query at offset 4 in \"$[1:x]\": invalid slice"
    );
    assert_eq!(err.remainder(), "x]");
    assert_eq!(JsonPathError::Parse(err).query(), Some("$[1:x]"));
}

#[rstest]
#[case("$[?1]", ValidationError::LiteralMustBeCompared)]
#[case("$[?@..a == 1]", ValidationError::ComparisonRequiresSingularQuery)]
#[case("$[?nope()]", ValidationError::UnknownFunction { name: "nope".into() })]
#[case("$[?count(@.a, @.b) == 1]", ValidationError::FunctionArityInvalid { name: "count".into(), expected: 1, actual: 2 })]
#[case("$[?value(@.a)]", ValidationError::FunctionResultMustBeCompared { name: "value".into() })]
#[case("$[?search(@, 'x') != false]", ValidationError::FunctionResultMustNotBeCompared { name: "search".into() })]
#[case("$[?length(@[*]) == 0]", ValidationError::FunctionRequiresSingularQuery { name: "length".into() })]
#[case("$[?value('x') == 'x']", ValidationError::FunctionRequiresQueryArgument { name: "value".into() })]
fn test_validation_errors_surface_on_compile(#[case] query_text: &str, #[case] expected: ValidationError) {
    let registry = FunctionRegistry::standard();
    let path = parse(query_text).unwrap();
    assert_eq!(validate(&path, &registry), Err(expected.clone()));
    assert_eq!(
        compile(&path, &registry).unwrap_err(),
        CompileError::Validation(expected.clone())
    );
    assert_eq!(
        compile_query(query_text, &registry).unwrap_err(),
        JsonPathError::compile(query_text, CompileError::Validation(expected))
    );
}

#[test]
fn test_compile_error_message() {
    let err = compile_query("$[?nope()]", &FunctionRegistry::standard()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid JSONPath query \"$[?nope()]\": unknown function 'nope'"
    );
    assert_eq!(err.query(), Some("$[?nope()]"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_malformed_programs_are_rejected() {
    assert_eq!(
        Program::from_parts(vec![Instruction::SegmentEnd], vec![]).unwrap_err(),
        ProgramError::UnbalancedSegment { pc: 0 }
    );
    assert_eq!(
        Program::from_parts(
            vec![Instruction::SegmentBegin(2), Instruction::SegmentEnd],
            vec![]
        )
        .unwrap_err(),
        ProgramError::BadJumpTarget { pc: 0, target: 2 }
    );
    assert!(matches!(
        Program::from_parts(vec![Instruction::SelectWildcard], vec![]),
        Err(ProgramError::MisplacedInstruction { pc: 0, .. })
    ));
    assert!(matches!(
        Program::from_parts(
            vec![
                Instruction::SegmentBegin(2),
                Instruction::SelectName(0),
                Instruction::SegmentEnd
            ],
            vec![]
        ),
        Err(ProgramError::BadConstant { pc: 1, index: 0, .. })
    ));
}

#[test]
fn test_disassembly_listing() {
    let program = compile_query("$.a[1:]", &FunctionRegistry::standard()).unwrap();
    let listing = program.disassemble();
    assert!(listing.starts_with("=== BYTECODE DISASSEMBLY ==="));
    assert!(listing.contains("Source: $.a[1:]"));
    assert!(listing.contains("SELECT_NAME"));
    assert!(listing.contains("SLICE_F10P"));
}
