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

//! Lowering of validated syntax trees to bytecode

use super::bytecode::{Constant, Instruction, Program, ProgramBuilder};
use super::filter::{BoundCall, CompiledFilter};
use super::slice::{self, SliceLowering};
use crate::analyzer::validate;
use crate::ast::{BinaryOperator, FilterExpr, PathExpr, SegmentExpr, SelectorExpr, UnaryOperator};
use crate::error::CompileError;
use crate::registry::FunctionRegistry;
use std::sync::Arc;

/// Compile a syntax tree against a registry, validating it first
pub fn compile(path: &PathExpr, registry: &FunctionRegistry) -> Result<Program, CompileError> {
    PathCompiler::new(registry).compile(path)
}

/// Compiler from [`PathExpr`] to [`Program`]
///
/// Each segment becomes an optional `DESCEND`, a `SEGMENT_BEGIN` carrying
/// the index of its `SEGMENT_END`, one instruction per selector, and the
/// `SEGMENT_END` itself. Filter sub-paths become nested programs and
/// function calls are bound to the registry entry at compile time.
#[derive(Debug, Clone, Copy)]
pub struct PathCompiler<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> PathCompiler<'r> {
    /// Create a compiler bound to a registry
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Validate and compile
    pub fn compile(&self, path: &PathExpr) -> Result<Program, CompileError> {
        validate(path, self.registry)?;
        self.compile_unchecked(path)
    }

    /// Compile without running the validator.
    ///
    /// Call sites are still resolved, so an unregistered function is
    /// reported as [`CompileError::UnknownFunction`].
    pub fn compile_unchecked(&self, path: &PathExpr) -> Result<Program, CompileError> {
        let program = self.lower_path(path)?.with_source(path.to_string());
        log::debug!(
            "compiled {}: {} instructions, {} constants",
            path,
            program.instructions().len(),
            program.constants().len()
        );
        Ok(program)
    }

    fn lower_path(&self, path: &PathExpr) -> Result<Program, CompileError> {
        let mut builder = ProgramBuilder::new();
        for segment in &path.segments {
            self.lower_segment(&mut builder, segment)?;
        }
        builder.finalize()
    }

    fn lower_segment(
        &self,
        builder: &mut ProgramBuilder,
        segment: &SegmentExpr,
    ) -> Result<(), CompileError> {
        if segment.descendant {
            builder.emit(Instruction::Descend);
        }
        builder.begin_segment();
        for selector in &segment.selectors {
            self.lower_selector(builder, selector)?;
        }
        builder.end_segment()?;
        Ok(())
    }

    fn lower_selector(
        &self,
        builder: &mut ProgramBuilder,
        selector: &SelectorExpr,
    ) -> Result<(), CompileError> {
        let instruction = match selector {
            SelectorExpr::Name(name) => {
                Instruction::SelectName(builder.add_constant(Constant::Name(name.clone()))?)
            }
            SelectorExpr::Index(index) => {
                Instruction::SelectIndex(builder.add_constant(Constant::Index(*index))?)
            }
            SelectorExpr::Wildcard => Instruction::SelectWildcard,
            SelectorExpr::Slice(expr) => match slice::classify(expr) {
                SliceLowering::Empty => Instruction::SliceEmpty,
                SliceLowering::ArrayAll => Instruction::SelectArrayAll,
                SliceLowering::Specialized(opcode) => {
                    opcode(builder.add_constant(Constant::Slice(slice::plan(expr)))?)
                }
            },
            SelectorExpr::Filter(filter) => {
                let compiled = self.lower_filter(filter)?;
                Instruction::SelectFilter(builder.add_constant(Constant::Filter(compiled))?)
            }
        };
        builder.emit(instruction);
        Ok(())
    }

    fn lower_filter(&self, expr: &FilterExpr) -> Result<CompiledFilter, CompileError> {
        Ok(match expr {
            FilterExpr::Literal(value) => CompiledFilter::Literal(value.to_json()),
            FilterExpr::Path { absolute, path } => {
                let text = path.to_string();
                CompiledFilter::Query {
                    absolute: *absolute,
                    program: self.lower_path(path)?.with_source(&text[1..]),
                }
            }
            FilterExpr::Unary {
                op: UnaryOperator::Not,
                operand,
            } => CompiledFilter::Not(Box::new(self.lower_filter(operand)?)),
            FilterExpr::Binary(data) => {
                let left = Box::new(self.lower_filter(&data.left)?);
                let right = Box::new(self.lower_filter(&data.right)?);
                match data.op {
                    BinaryOperator::And => CompiledFilter::And(left, right),
                    BinaryOperator::Or => CompiledFilter::Or(left, right),
                    op => CompiledFilter::Compare { op, left, right },
                }
            }
            FilterExpr::FunctionCall(call) => {
                let function = self.registry.get(&call.name).map(Arc::clone).ok_or_else(|| {
                    CompileError::UnknownFunction {
                        name: call.name.clone(),
                    }
                })?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.lower_filter(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                CompiledFilter::Call(BoundCall {
                    name: call.name.clone(),
                    function,
                    args,
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn compile_str(query: &str) -> Result<Program, CompileError> {
        compile(&parse(query).unwrap(), &FunctionRegistry::standard())
    }

    #[test]
    fn test_segment_layout() {
        let program = compile_str("$.a..[1, 'a'][1:3][::1][::0]").unwrap();
        assert_eq!(
            program.instructions(),
            &[
                Instruction::SegmentBegin(2),
                Instruction::SelectName(0),
                Instruction::SegmentEnd,
                Instruction::Descend,
                Instruction::SegmentBegin(7),
                Instruction::SelectIndex(1),
                Instruction::SelectName(0),
                Instruction::SegmentEnd,
                Instruction::SegmentBegin(10),
                Instruction::SliceF11PP(2),
                Instruction::SegmentEnd,
                Instruction::SegmentBegin(13),
                Instruction::SelectArrayAll,
                Instruction::SegmentEnd,
                Instruction::SegmentBegin(16),
                Instruction::SliceEmpty,
                Instruction::SegmentEnd,
            ]
        );
        assert_eq!(program.constants().len(), 3);
        assert_eq!(program.source(), Some("$['a']..[1, 'a'][1:3][:][::0]"));
    }

    #[test]
    fn test_root_only_is_empty_program() {
        let program = compile_str("$").unwrap();
        assert!(program.instructions().is_empty());
    }

    #[test]
    fn test_filter_binds_nested_programs() {
        let program = compile_str("$[?@.x[0] == $.y && length(@.n) > 1]").unwrap();
        assert_eq!(program.instructions()[1], Instruction::SelectFilter(0));
        let filter = program.filter_at(0);
        assert_eq!(
            filter.to_string(),
            "((@['x'][0] == $['y']) && (length(@['n']) > 1))"
        );
        let CompiledFilter::And(left, _) = filter else {
            panic!("expected &&");
        };
        let CompiledFilter::Compare { left, .. } = left.as_ref() else {
            panic!("expected comparison");
        };
        let CompiledFilter::Query { absolute, program } = left.as_ref() else {
            panic!("expected query");
        };
        assert!(!absolute);
        assert_eq!(program.instructions().len(), 6);
    }

    #[test]
    fn test_validation_runs_first() {
        assert_eq!(
            compile_str("$[?@.* == 1]").unwrap_err(),
            CompileError::Validation(ValidationError::ComparisonRequiresSingularQuery)
        );
        assert_eq!(
            compile_str("$[?missing(@)]").unwrap_err(),
            CompileError::Validation(ValidationError::UnknownFunction {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn test_unchecked_still_resolves_functions() {
        let path = parse("$[?missing(@)]").unwrap();
        let registry = FunctionRegistry::standard();
        assert_eq!(
            PathCompiler::new(&registry).compile_unchecked(&path).unwrap_err(),
            CompileError::UnknownFunction {
                name: "missing".into()
            }
        );
        // Usage rules are skipped: a bare literal compiles
        let literal = parse("$[?1]").unwrap();
        assert!(PathCompiler::new(&registry).compile_unchecked(&literal).is_ok());
    }
}
