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

//! Frame-stack virtual machine executing compiled programs.
//!
//! Execution keeps a working node set, starting with the document root, and
//! a stack of frames, one per open segment. A frame holds the segment's input
//! nodes, the output accumulated so far and a cursor naming the node the
//! segment's selectors currently apply to. No host recursion happens per
//! segment; only filter sub-queries start a nested execution.

pub mod slice;
pub mod traversal;

use crate::compiler::{Instruction, Program};
use crate::evaluator::evaluate;
use crate::model::NodeList;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;
use std::mem;

/// State of one open segment
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    input: NodeList<'a>,
    output: NodeList<'a>,
    cursor: usize,
    body: usize,
}

impl<'a> Frame<'a> {
    /// Node the segment's selectors currently apply to
    pub fn current(&self) -> &'a JsonValue {
        self.input[self.cursor]
    }

    /// Nodes the segment was entered with
    pub fn input(&self) -> &[&'a JsonValue] {
        &self.input
    }

    /// Output accumulated so far
    pub fn output(&self) -> &[&'a JsonValue] {
        &self.output
    }

    /// Index of the current node in the input
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// A single run of a [`Program`] against a document.
///
/// Can be driven one instruction at a time with [`Execution::step`] or to
/// completion with [`Execution::run`].
///
/// # Panics
///
/// Stepping panics if the program breaks the structural invariants checked
/// by [`Program::verify`]. Programs produced by the compiler or accepted by
/// [`Program::from_parts`] never do.
#[derive(Debug, Clone)]
pub struct Execution<'p, 'a> {
    program: &'p Program,
    root: &'a JsonValue,
    working: NodeList<'a>,
    frames: SmallVec<[Frame<'a>; 2]>,
    pc: usize,
}

impl<'p, 'a> Execution<'p, 'a> {
    /// Start executing `program` with `root` as the only working node
    pub fn new(program: &'p Program, root: &'a JsonValue) -> Self {
        Self::with_root(program, root, root)
    }

    /// Start executing `program` from `start`, resolving `$` inside nested
    /// filters against `root`
    pub fn with_root(program: &'p Program, root: &'a JsonValue, start: &'a JsonValue) -> Self {
        Self {
            program,
            root,
            working: vec![start],
            frames: SmallVec::new(),
            pc: 0,
        }
    }

    /// Index of the next instruction
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Whether every instruction has run
    pub fn is_finished(&self) -> bool {
        self.pc >= self.program.instructions().len()
    }

    /// Current working set. Empty while a segment is open.
    pub fn working_set(&self) -> &[&'a JsonValue] {
        &self.working
    }

    /// Open frames, innermost last
    pub fn frames(&self) -> &[Frame<'a>] {
        &self.frames
    }

    /// Execute the next instruction and return it, or `None` once finished
    pub fn step(&mut self) -> Option<Instruction> {
        let instruction = *self.program.instructions().get(self.pc)?;
        match instruction {
            Instruction::Descend => {
                self.working = traversal::descendants(&self.working);
                self.pc += 1;
            }
            Instruction::SegmentBegin(end) => {
                if self.working.is_empty() {
                    self.pc = end as usize + 1;
                } else {
                    self.frames.push(Frame {
                        input: mem::take(&mut self.working),
                        output: Vec::new(),
                        cursor: 0,
                        body: self.pc + 1,
                    });
                    self.pc += 1;
                }
            }
            Instruction::SegmentEnd => {
                let Some(frame) = self.frames.last_mut() else {
                    panic!("SEGMENT_END at {} without an open segment", self.pc);
                };
                frame.cursor += 1;
                if frame.cursor < frame.input.len() {
                    self.pc = frame.body;
                } else {
                    if let Some(frame) = self.frames.pop() {
                        self.working = frame.output;
                    }
                    self.pc += 1;
                }
            }
            selector => {
                let Some(frame) = self.frames.last_mut() else {
                    panic!("{} at {} outside a segment", selector.mnemonic(), self.pc);
                };
                let node = frame.current();
                select(self.program, self.root, selector, node, &mut frame.output);
                self.pc += 1;
            }
        }
        Some(instruction)
    }

    /// Run to completion and return the final working set
    pub fn run(mut self) -> NodeList<'a> {
        while self.step().is_some() {}
        self.working
    }
}

/// Execute `program` against `document`
pub fn execute<'a>(program: &Program, document: &'a JsonValue) -> NodeList<'a> {
    Execution::new(program, document).run()
}

impl Program {
    /// Run the program against a document.
    ///
    /// Results are in traversal order and keep duplicates.
    pub fn query<'a>(&self, document: &'a JsonValue) -> NodeList<'a> {
        execute(self, document)
    }

    /// Run the program from `start`, a node inside `root`.
    ///
    /// Used for filter sub-queries: `$` in any nested filter still refers to
    /// the document root.
    pub fn query_from<'a>(&self, root: &'a JsonValue, start: &'a JsonValue) -> NodeList<'a> {
        Execution::with_root(self, root, start).run()
    }

    /// Start a single-steppable execution against a document
    pub fn execution<'p, 'a>(&'p self, document: &'a JsonValue) -> Execution<'p, 'a> {
        Execution::new(self, document)
    }
}

fn array_of(node: &JsonValue) -> Option<&[JsonValue]> {
    match node {
        JsonValue::Array(items) if !items.is_empty() => Some(items),
        _ => None,
    }
}

/// Apply one selector instruction to `node`, appending matches to `out`
fn select<'a>(
    program: &Program,
    root: &'a JsonValue,
    instruction: Instruction,
    node: &'a JsonValue,
    out: &mut NodeList<'a>,
) {
    use Instruction::*;

    match instruction {
        SelectName(c) => {
            if let Some(value) = node.as_object().and_then(|o| o.get(program.name_at(c))) {
                out.push(value);
            }
        }
        SelectIndex(c) => {
            if let Some(items) = node.as_array() {
                let len = items.len() as i64;
                let mut idx = program.index_at(c);
                if idx < 0 {
                    idx += len;
                }
                if (0..len).contains(&idx) {
                    out.push(&items[idx as usize]);
                }
            }
        }
        SelectWildcard => traversal::append_children(out, node),
        SelectArrayAll => {
            if let Some(items) = node.as_array() {
                out.extend(items.iter());
            }
        }
        SliceEmpty => {}
        SelectFilter(c) => {
            let filter = program.filter_at(c);
            for child in traversal::children(node) {
                if evaluate(filter, root, child).is_truthy() {
                    out.push(child);
                }
            }
        }
        _ => {
            let Some(arr) = array_of(node) else {
                return;
            };
            select_slice(program, instruction, arr, out);
        }
    }
}

fn select_slice<'a>(
    program: &Program,
    instruction: Instruction,
    arr: &'a [JsonValue],
    out: &mut NodeList<'a>,
) {
    use Instruction::*;

    match instruction {
        SliceF00(c) => slice::append_f00(out, arr, program.slice_at(c).step),
        SliceF10P(c) => {
            let p = program.slice_at(c);
            slice::append_f10p(out, arr, p.start, p.step)
        }
        SliceF10N(c) => {
            let p = program.slice_at(c);
            slice::append_f10n(out, arr, p.start, p.step)
        }
        SliceF01P(c) => {
            let p = program.slice_at(c);
            slice::append_f01p(out, arr, p.end, p.step)
        }
        SliceF01N(c) => {
            let p = program.slice_at(c);
            slice::append_f01n(out, arr, p.end, p.step)
        }
        SliceF11PP(c) => {
            let p = program.slice_at(c);
            slice::append_f11pp(out, arr, p.start, p.end, p.step)
        }
        SliceF11PN(c) => {
            let p = program.slice_at(c);
            slice::append_f11pn(out, arr, p.start, p.end, p.step)
        }
        SliceF11NP(c) => {
            let p = program.slice_at(c);
            slice::append_f11np(out, arr, p.start, p.end, p.step)
        }
        SliceF11NN(c) => {
            let p = program.slice_at(c);
            slice::append_f11nn(out, arr, p.start, p.end, p.step)
        }
        SliceB00(c) => slice::append_b00(out, arr, program.slice_at(c).step),
        SliceB10P(c) => {
            let p = program.slice_at(c);
            slice::append_b10p(out, arr, p.start, p.step)
        }
        SliceB10N(c) => {
            let p = program.slice_at(c);
            slice::append_b10n(out, arr, p.start, p.step)
        }
        SliceB01P(c) => {
            let p = program.slice_at(c);
            slice::append_b01p(out, arr, p.end, p.step)
        }
        SliceB01N(c) => {
            let p = program.slice_at(c);
            slice::append_b01n(out, arr, p.end, p.step)
        }
        SliceB11PP(c) => {
            let p = program.slice_at(c);
            slice::append_b11pp(out, arr, p.start, p.end, p.step)
        }
        SliceB11PN(c) => {
            let p = program.slice_at(c);
            slice::append_b11pn(out, arr, p.start, p.end, p.step)
        }
        SliceB11NP(c) => {
            let p = program.slice_at(c);
            slice::append_b11np(out, arr, p.start, p.end, p.step)
        }
        SliceB11NN(c) => {
            let p = program.slice_at(c);
            slice::append_b11nn(out, arr, p.start, p.end, p.step)
        }
        other => unreachable!("{} is not a slice instruction", other.mnemonic()),
    }
}
