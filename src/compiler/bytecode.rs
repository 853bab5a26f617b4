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

//! Bytecode instruction set and program representation
//!
//! A program is two flat arrays: instructions and a constant pool. Operands
//! are plain indices, either into the constant pool or (for segment jumps)
//! into the instruction array, so programs are cheap to clone and share.

use super::filter::CompiledFilter;
use crate::error::{CompileError, ProgramError};
use rustc_hash::FxHashMap;
use std::fmt;

/// Index into the constant pool
pub type ConstantIndex = u16;

/// Index into the instruction array
pub type JumpTarget = u32;

/// Bytecode instruction set for JSONPath queries
///
/// Slice opcodes are named `Slice{F|B}{start}{end}{signs}`: `F` for a
/// positive step, `B` for a negative one, `1`/`0` for whether each bound is
/// written, and `P`/`N` for the sign of each written bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Replace the working set with its pre-order expansion
    Descend,

    /// Start a segment. Operand: index of the matching `SegmentEnd`
    SegmentBegin(JumpTarget),

    /// Advance to the next input node or close the segment
    SegmentEnd,

    /// Object member by name. Operand: name constant
    SelectName(ConstantIndex),

    /// Array element by index. Operand: index constant
    SelectIndex(ConstantIndex),

    /// All array elements or member values
    SelectWildcard,

    /// All array elements (`[::1]`)
    SelectArrayAll,

    // === Forward slices (step > 0), operand: slice constant ===
    /// No bounds
    SliceF00(ConstantIndex),
    /// Start >= 0
    SliceF10P(ConstantIndex),
    /// Start < 0
    SliceF10N(ConstantIndex),
    /// End >= 0
    SliceF01P(ConstantIndex),
    /// End < 0
    SliceF01N(ConstantIndex),
    /// Start >= 0, end >= 0
    SliceF11PP(ConstantIndex),
    /// Start >= 0, end < 0
    SliceF11PN(ConstantIndex),
    /// Start < 0, end >= 0
    SliceF11NP(ConstantIndex),
    /// Start < 0, end < 0
    SliceF11NN(ConstantIndex),

    // === Backward slices (step < 0), operand: slice constant ===
    /// No bounds
    SliceB00(ConstantIndex),
    /// Start >= 0
    SliceB10P(ConstantIndex),
    /// Start < 0
    SliceB10N(ConstantIndex),
    /// End >= 0
    SliceB01P(ConstantIndex),
    /// End < 0
    SliceB01N(ConstantIndex),
    /// Start >= 0, end >= 0
    SliceB11PP(ConstantIndex),
    /// Start >= 0, end < 0
    SliceB11PN(ConstantIndex),
    /// Start < 0, end >= 0
    SliceB11NP(ConstantIndex),
    /// Start < 0, end < 0
    SliceB11NN(ConstantIndex),

    /// Slice with step 0, selects nothing
    SliceEmpty,

    /// Elements or member values passing a filter. Operand: filter constant
    SelectFilter(ConstantIndex),
}

/// Expected payload of a constant operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Name,
    Index,
    Slice,
    Filter,
}

impl ConstantKind {
    fn as_str(&self) -> &'static str {
        match self {
            ConstantKind::Name => "name",
            ConstantKind::Index => "index",
            ConstantKind::Slice => "slice",
            ConstantKind::Filter => "filter",
        }
    }
}

impl Instruction {
    /// Assembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Descend => "DESCEND",
            Self::SegmentBegin(_) => "SEGMENT_BEGIN",
            Self::SegmentEnd => "SEGMENT_END",
            Self::SelectName(_) => "SELECT_NAME",
            Self::SelectIndex(_) => "SELECT_INDEX",
            Self::SelectWildcard => "SELECT_WILDCARD",
            Self::SelectArrayAll => "SELECT_ARRAY_ALL",
            Self::SliceF00(_) => "SLICE_F00",
            Self::SliceF10P(_) => "SLICE_F10P",
            Self::SliceF10N(_) => "SLICE_F10N",
            Self::SliceF01P(_) => "SLICE_F01P",
            Self::SliceF01N(_) => "SLICE_F01N",
            Self::SliceF11PP(_) => "SLICE_F11PP",
            Self::SliceF11PN(_) => "SLICE_F11PN",
            Self::SliceF11NP(_) => "SLICE_F11NP",
            Self::SliceF11NN(_) => "SLICE_F11NN",
            Self::SliceB00(_) => "SLICE_B00",
            Self::SliceB10P(_) => "SLICE_B10P",
            Self::SliceB10N(_) => "SLICE_B10N",
            Self::SliceB01P(_) => "SLICE_B01P",
            Self::SliceB01N(_) => "SLICE_B01N",
            Self::SliceB11PP(_) => "SLICE_B11PP",
            Self::SliceB11PN(_) => "SLICE_B11PN",
            Self::SliceB11NP(_) => "SLICE_B11NP",
            Self::SliceB11NN(_) => "SLICE_B11NN",
            Self::SliceEmpty => "SLICE_EMPTY",
            Self::SelectFilter(_) => "SELECT_FILTER",
        }
    }

    /// Constant operand and the kind of constant it must reference
    pub fn constant_operand(&self) -> Option<(ConstantIndex, ConstantKind)> {
        match *self {
            Self::SelectName(idx) => Some((idx, ConstantKind::Name)),
            Self::SelectIndex(idx) => Some((idx, ConstantKind::Index)),
            Self::SelectFilter(idx) => Some((idx, ConstantKind::Filter)),
            Self::SliceF00(idx)
            | Self::SliceF10P(idx)
            | Self::SliceF10N(idx)
            | Self::SliceF01P(idx)
            | Self::SliceF01N(idx)
            | Self::SliceF11PP(idx)
            | Self::SliceF11PN(idx)
            | Self::SliceF11NP(idx)
            | Self::SliceF11NN(idx)
            | Self::SliceB00(idx)
            | Self::SliceB10P(idx)
            | Self::SliceB10N(idx)
            | Self::SliceB01P(idx)
            | Self::SliceB01N(idx)
            | Self::SliceB11PP(idx)
            | Self::SliceB11PN(idx)
            | Self::SliceB11NP(idx)
            | Self::SliceB11NN(idx) => Some((idx, ConstantKind::Slice)),
            _ => None,
        }
    }

    /// Whether the instruction runs against the current node of a segment
    pub fn is_selector(&self) -> bool {
        !matches!(
            self,
            Self::Descend | Self::SegmentBegin(_) | Self::SegmentEnd
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentBegin(target) => write!(f, "{} {}", self.mnemonic(), target),
            _ => match self.constant_operand() {
                Some((idx, _)) => write!(f, "{} {}", self.mnemonic(), idx),
                None => f.write_str(self.mnemonic()),
            },
        }
    }
}

/// Raw slice bounds as written in the query, absent bounds stored as 0.
///
/// Which bounds are present and their signs are encoded in the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlicePlan {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl fmt::Display for SlicePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.step)
    }
}

/// Constant pool entry
#[derive(Debug, Clone)]
pub enum Constant {
    /// Member name
    Name(String),
    /// Array index as written
    Index(i64),
    /// Slice bounds
    Slice(SlicePlan),
    /// Compiled filter expression
    Filter(CompiledFilter),
}

impl Constant {
    pub fn kind(&self) -> ConstantKind {
        match self {
            Constant::Name(_) => ConstantKind::Name,
            Constant::Index(_) => ConstantKind::Index,
            Constant::Slice(_) => ConstantKind::Slice,
            Constant::Filter(_) => ConstantKind::Filter,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Name(name) => write!(f, "name {name:?}"),
            Constant::Index(index) => write!(f, "index {index}"),
            Constant::Slice(plan) => write!(f, "slice {plan}"),
            Constant::Filter(filter) => write!(f, "filter {filter}"),
        }
    }
}

/// Key used to share identical scalar constants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Name(String),
    Index(i64),
    Slice(SlicePlan),
}

impl ConstantKey {
    fn of(constant: &Constant) -> Option<Self> {
        match constant {
            Constant::Name(name) => Some(ConstantKey::Name(name.clone())),
            Constant::Index(index) => Some(ConstantKey::Index(*index)),
            Constant::Slice(plan) => Some(ConstantKey::Slice(*plan)),
            Constant::Filter(_) => None,
        }
    }
}

/// Compiled, immutable query program
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
    constants: Vec<Constant>,
    source: Option<String>,
}

impl Program {
    /// Build a program from raw parts, verifying its structure
    pub fn from_parts(
        instructions: Vec<Instruction>,
        constants: Vec<Constant>,
    ) -> Result<Self, ProgramError> {
        let program = Self {
            instructions,
            constants,
            source: None,
        };
        program.verify()?;
        Ok(program)
    }

    /// Instruction stream
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Constant pool
    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Query text this program was compiled from, if known
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Attach the query text used for diagnostics
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub(crate) fn name_at(&self, idx: ConstantIndex) -> &str {
        match &self.constants[usize::from(idx)] {
            Constant::Name(name) => name,
            other => panic!("constant {idx} is {other}, expected a name"),
        }
    }

    pub(crate) fn index_at(&self, idx: ConstantIndex) -> i64 {
        match &self.constants[usize::from(idx)] {
            Constant::Index(index) => *index,
            other => panic!("constant {idx} is {other}, expected an index"),
        }
    }

    pub(crate) fn slice_at(&self, idx: ConstantIndex) -> SlicePlan {
        match &self.constants[usize::from(idx)] {
            Constant::Slice(plan) => *plan,
            other => panic!("constant {idx} is {other}, expected a slice"),
        }
    }

    pub(crate) fn filter_at(&self, idx: ConstantIndex) -> &CompiledFilter {
        match &self.constants[usize::from(idx)] {
            Constant::Filter(filter) => filter,
            other => panic!("constant {idx} is {other}, expected a filter"),
        }
    }

    /// Check the structural invariants the virtual machine relies on.
    ///
    /// Segments do not nest, every `SegmentBegin` targets its own
    /// `SegmentEnd`, selectors only appear inside segments, `Descend` only
    /// outside them, and every constant operand is in range and of the
    /// expected kind.
    pub fn verify(&self) -> Result<(), ProgramError> {
        let mut open: Option<(usize, usize)> = None;
        for (pc, instruction) in self.instructions.iter().enumerate() {
            match *instruction {
                Instruction::SegmentBegin(target) => {
                    if open.is_some() {
                        return Err(ProgramError::MisplacedInstruction {
                            pc,
                            opcode: instruction.mnemonic(),
                        });
                    }
                    open = Some((pc, target as usize));
                }
                Instruction::SegmentEnd => match open.take() {
                    Some((_, target)) if target == pc => {}
                    Some((begin, target)) => {
                        return Err(ProgramError::BadJumpTarget { pc: begin, target });
                    }
                    None => return Err(ProgramError::UnbalancedSegment { pc }),
                },
                Instruction::Descend if open.is_some() => {
                    return Err(ProgramError::MisplacedInstruction {
                        pc,
                        opcode: instruction.mnemonic(),
                    });
                }
                Instruction::Descend => {}
                _ if open.is_none() => {
                    return Err(ProgramError::MisplacedInstruction {
                        pc,
                        opcode: instruction.mnemonic(),
                    });
                }
                _ => {}
            }

            if let Some((idx, kind)) = instruction.constant_operand() {
                let matches = self
                    .constants
                    .get(usize::from(idx))
                    .is_some_and(|constant| constant.kind() == kind);
                if !matches {
                    return Err(ProgramError::BadConstant {
                        pc,
                        index: usize::from(idx),
                        expected: kind.as_str(),
                    });
                }
            }
        }
        match open {
            Some((begin, _)) => Err(ProgramError::UnbalancedSegment { pc: begin }),
            None => Ok(()),
        }
    }

    /// Human-readable listing of the program
    pub fn disassemble(&self) -> String {
        let mut output = String::new();
        output.push_str("=== BYTECODE DISASSEMBLY ===\n");
        if let Some(source) = &self.source {
            output.push_str(&format!("Source: {source}\n"));
        }
        output.push_str(&format!("Instructions: {}\n", self.instructions.len()));
        output.push_str(&format!("Constants: {}\n", self.constants.len()));

        output.push_str("\n--- CONSTANTS ---\n");
        for (i, constant) in self.constants.iter().enumerate() {
            output.push_str(&format!("{i:4}: {constant}\n"));
        }

        output.push_str("\n--- INSTRUCTIONS ---\n");
        for (i, instruction) in self.instructions.iter().enumerate() {
            output.push_str(&format!("{i:4}: {instruction}\n"));
        }
        output
    }
}

/// Incremental program construction with constant sharing and segment
/// jump patching
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    constants: Vec<Constant>,
    interned: FxHashMap<ConstantKey, ConstantIndex>,
    open_segment: Option<usize>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, returning its index
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Add a constant, reusing an identical name, index or slice entry
    pub fn add_constant(&mut self, constant: Constant) -> Result<ConstantIndex, CompileError> {
        let key = ConstantKey::of(&constant);
        if let Some(idx) = key.as_ref().and_then(|key| self.interned.get(key)) {
            return Ok(*idx);
        }
        let idx = ConstantIndex::try_from(self.constants.len()).map_err(|_| {
            CompileError::ProgramTooLarge {
                what: "constants",
                limit: usize::from(ConstantIndex::MAX) + 1,
            }
        })?;
        self.constants.push(constant);
        if let Some(key) = key {
            self.interned.insert(key, idx);
        }
        Ok(idx)
    }

    /// Emit a `SegmentBegin` whose target is patched by [`end_segment`](Self::end_segment)
    pub fn begin_segment(&mut self) -> usize {
        let pc = self.emit(Instruction::SegmentBegin(0));
        self.open_segment = Some(pc);
        pc
    }

    /// Emit the `SegmentEnd` closing the open segment and patch its jump
    pub fn end_segment(&mut self) -> Result<usize, CompileError> {
        let end = self.emit(Instruction::SegmentEnd);
        let target = JumpTarget::try_from(end).map_err(|_| CompileError::ProgramTooLarge {
            what: "instructions",
            limit: JumpTarget::MAX as usize,
        })?;
        let begin = self
            .open_segment
            .take()
            .ok_or(ProgramError::UnbalancedSegment { pc: end })?;
        self.instructions[begin] = Instruction::SegmentBegin(target);
        Ok(end)
    }

    /// Verify and return the finished program
    pub fn finalize(self) -> Result<Program, CompileError> {
        Ok(Program::from_parts(self.instructions, self.constants)?)
    }
}
