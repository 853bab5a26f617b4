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

//! Slice opcode selection
//!
//! The step direction, which bounds are present and the sign of each
//! present bound are fixed by the query text, so they select the opcode at
//! compile time. Only the array length is left for run time.

use super::bytecode::{ConstantIndex, Instruction, SlicePlan};
use crate::ast::SliceExpr;

/// How a slice selector is lowered
#[derive(Debug, Clone, Copy)]
pub enum SliceLowering {
    /// Step 0: no output, no constant needed
    Empty,
    /// Unbounded step 1: every array element, no constant needed
    ArrayAll,
    /// Specialized opcode taking a [`SlicePlan`] constant
    Specialized(fn(ConstantIndex) -> Instruction),
}

/// Choose the lowering for a slice
pub fn classify(slice: &SliceExpr) -> SliceLowering {
    use Instruction::*;

    if slice.step == 0 {
        return SliceLowering::Empty;
    }
    let non_negative = |bound: Option<i64>| bound.map(|n| n >= 0);
    let opcode: fn(ConstantIndex) -> Instruction = match (
        slice.step > 0,
        non_negative(slice.start),
        non_negative(slice.end),
    ) {
        (true, None, None) if slice.step == 1 => return SliceLowering::ArrayAll,
        (true, None, None) => SliceF00,
        (true, Some(true), None) => SliceF10P,
        (true, Some(false), None) => SliceF10N,
        (true, None, Some(true)) => SliceF01P,
        (true, None, Some(false)) => SliceF01N,
        (true, Some(true), Some(true)) => SliceF11PP,
        (true, Some(true), Some(false)) => SliceF11PN,
        (true, Some(false), Some(true)) => SliceF11NP,
        (true, Some(false), Some(false)) => SliceF11NN,
        (false, None, None) => SliceB00,
        (false, Some(true), None) => SliceB10P,
        (false, Some(false), None) => SliceB10N,
        (false, None, Some(true)) => SliceB01P,
        (false, None, Some(false)) => SliceB01N,
        (false, Some(true), Some(true)) => SliceB11PP,
        (false, Some(true), Some(false)) => SliceB11PN,
        (false, Some(false), Some(true)) => SliceB11NP,
        (false, Some(false), Some(false)) => SliceB11NN,
    };
    SliceLowering::Specialized(opcode)
}

/// Raw bounds stored in the constant pool, absent bounds as 0
pub fn plan(slice: &SliceExpr) -> SlicePlan {
    SlicePlan {
        start: slice.start.unwrap_or(0),
        end: slice.end.unwrap_or(0),
        step: slice.step,
    }
}
