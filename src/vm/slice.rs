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

//! Array slice routines, one per slice opcode.
//!
//! Each routine receives the raw bounds stored in the constant pool and runs
//! only the normalization its opcode implies. Bounds and indices are carried
//! as `i64` so negative intermediates stay representable.

use crate::model::NodeList;
use serde_json::Value as JsonValue;

#[inline]
fn push_forward<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let mut idx = start;
    while idx < end {
        out.push(&arr[idx as usize]);
        idx += step;
    }
}

#[inline]
fn push_backward<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let mut idx = start;
    while idx > end {
        out.push(&arr[idx as usize]);
        idx += step;
    }
}

#[inline]
fn len_of(arr: &[JsonValue]) -> i64 {
    arr.len() as i64
}

/// Non-negative forward start, clamped to `[0, size]`
#[inline]
pub fn forward_start_pos(start: i64, size: i64) -> i64 {
    start.clamp(0, size)
}

/// Negative forward start, offset by `size` then clamped to `[0, size]`
#[inline]
pub fn forward_start_neg(start: i64, size: i64) -> i64 {
    (start + size).clamp(0, size)
}

/// Non-negative forward end, clamped to `[0, size]`
#[inline]
pub fn forward_end_pos(end: i64, size: i64) -> i64 {
    end.clamp(0, size)
}

/// Negative forward end, offset by `size` then clamped to `[0, size]`
#[inline]
pub fn forward_end_neg(end: i64, size: i64) -> i64 {
    (end + size).clamp(0, size)
}

/// Non-negative backward start: `-1` below zero, at most `size - 1`
#[inline]
pub fn backward_start_pos(start: i64, size: i64) -> i64 {
    if start < 0 {
        -1
    } else {
        start.min(size - 1)
    }
}

/// Negative backward start, offset by `size` and capped at `size - 1`
#[inline]
pub fn backward_start_neg(start: i64, size: i64) -> i64 {
    (start + size).min(size - 1)
}

/// Non-negative backward end, clamped to `[-1, size - 1]`
#[inline]
pub fn backward_end_pos(end: i64, size: i64) -> i64 {
    end.clamp(-1, size - 1)
}

/// Negative backward end, offset by `size` then clamped to `[-1, size - 1]`
#[inline]
pub fn backward_end_neg(end: i64, size: i64) -> i64 {
    (end + size).clamp(-1, size - 1)
}

// Forward routines (step > 0)

pub fn append_f00<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], step: i64) {
    push_forward(out, arr, 0, len_of(arr), step);
}

pub fn append_f10p<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_pos(start, size), size, step);
}

pub fn append_f10n<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_neg(start, size), size, step);
}

pub fn append_f01p<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], end: i64, step: i64) {
    push_forward(out, arr, 0, forward_end_pos(end, len_of(arr)), step);
}

pub fn append_f01n<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], end: i64, step: i64) {
    push_forward(out, arr, 0, forward_end_neg(end, len_of(arr)), step);
}

pub fn append_f11pp<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_pos(start, size), forward_end_pos(end, size), step);
}

pub fn append_f11pn<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_pos(start, size), forward_end_neg(end, size), step);
}

pub fn append_f11np<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_neg(start, size), forward_end_pos(end, size), step);
}

pub fn append_f11nn<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_forward(out, arr, forward_start_neg(start, size), forward_end_neg(end, size), step);
}

// Backward routines (step < 0)

pub fn append_b00<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], step: i64) {
    push_backward(out, arr, len_of(arr) - 1, -1, step);
}

pub fn append_b10p<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, step: i64) {
    push_backward(out, arr, backward_start_pos(start, len_of(arr)), -1, step);
}

pub fn append_b10n<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, step: i64) {
    push_backward(out, arr, backward_start_neg(start, len_of(arr)), -1, step);
}

pub fn append_b01p<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, size - 1, backward_end_pos(end, size), step);
}

pub fn append_b01n<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, size - 1, backward_end_neg(end, size), step);
}

pub fn append_b11pp<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, backward_start_pos(start, size), backward_end_pos(end, size), step);
}

pub fn append_b11pn<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, backward_start_pos(start, size), backward_end_neg(end, size), step);
}

pub fn append_b11np<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, backward_start_neg(start, size), backward_end_pos(end, size), step);
}

pub fn append_b11nn<'a>(out: &mut NodeList<'a>, arr: &'a [JsonValue], start: i64, end: i64, step: i64) {
    let size = len_of(arr);
    push_backward(out, arr, backward_start_neg(start, size), backward_end_neg(end, size), step);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn numbers(n: usize) -> Vec<JsonValue> {
        (0..n).map(JsonValue::from).collect()
    }

    fn collect(out: NodeList<'_>) -> Vec<i64> {
        out.into_iter().filter_map(JsonValue::as_i64).collect()
    }

    #[rstest]
    #[case(-1, 5, 0)]
    #[case(3, 5, 3)]
    #[case(9, 5, 5)]
    fn test_forward_pos_clamp(#[case] bound: i64, #[case] size: i64, #[case] expected: i64) {
        assert_eq!(forward_start_pos(bound, size), expected);
        assert_eq!(forward_end_pos(bound, size), expected);
    }

    #[rstest]
    #[case(-2, 5, 3)]
    #[case(-9, 5, 0)]
    fn test_forward_neg_clamp(#[case] bound: i64, #[case] size: i64, #[case] expected: i64) {
        assert_eq!(forward_start_neg(bound, size), expected);
        assert_eq!(forward_end_neg(bound, size), expected);
    }

    #[test]
    fn test_backward_normalization() {
        assert_eq!(backward_start_pos(-1, 5), -1);
        assert_eq!(backward_start_pos(7, 5), 4);
        assert_eq!(backward_start_neg(-2, 5), 3);
        assert_eq!(backward_start_neg(-9, 5), -4);
        assert_eq!(backward_end_pos(7, 5), 4);
        assert_eq!(backward_end_neg(-9, 5), -1);
        assert_eq!(backward_end_neg(-1, 5), 4);
    }

    #[test]
    fn test_forward_routines() {
        let arr = numbers(6);
        let mut out = Vec::new();
        append_f00(&mut out, &arr, 2);
        assert_eq!(collect(out), vec![0, 2, 4]);

        let mut out = Vec::new();
        append_f10n(&mut out, &arr, -2, 1);
        assert_eq!(collect(out), vec![4, 5]);

        let mut out = Vec::new();
        append_f01n(&mut out, &arr, -4, 1);
        assert_eq!(collect(out), vec![0, 1]);

        let mut out = Vec::new();
        append_f11pp(&mut out, &arr, 1, 5, 2);
        assert_eq!(collect(out), vec![1, 3]);

        let mut out = Vec::new();
        append_f11np(&mut out, &arr, -1, 2, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_backward_routines() {
        let arr = numbers(4);
        let mut out = Vec::new();
        append_b00(&mut out, &arr, -1);
        assert_eq!(collect(out), vec![3, 2, 1, 0]);

        let mut out = Vec::new();
        append_b10n(&mut out, &arr, -2, -1);
        assert_eq!(collect(out), vec![2, 1, 0]);

        let mut out = Vec::new();
        append_b01p(&mut out, &arr, 1, -1);
        assert_eq!(collect(out), vec![3, 2]);

        let mut out = Vec::new();
        append_b11pn(&mut out, &arr, 10, -4, -2);
        assert_eq!(collect(out), vec![3, 1]);

        let mut out = Vec::new();
        append_b10p(&mut out, &arr, -3, -1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_large_bounds_stay_in_range() {
        let arr = vec![json!("a"), json!("b")];
        let mut out = Vec::new();
        append_f11pp(&mut out, &arr, 0, 9_007_199_254_740_991, 9_007_199_254_740_991);
        assert_eq!(out, vec![&json!("a")]);

        let mut out = Vec::new();
        append_b11nn(&mut out, &arr, -9_007_199_254_740_991, -9_007_199_254_740_991, -1);
        assert!(out.is_empty());
    }
}
