//! Behaviours of the string-valued core functions.

use std::collections::HashMap;

use super::numeric::round_to_int;

/// Leading/trailing whitespace (space, tab, CR, LF) stripped, interior runs
/// collapsed to a single space.
pub(crate) fn normalize_space(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r') {
            if !out.is_empty() {
                pending_space = true;
            }
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Code-point remap: the first occurrence of each `from` code point wins;
/// code points whose index is past the end of `to` are deleted.
pub(crate) fn translate(s: &str, from: &str, to: &str) -> String {
    let to: Vec<char> = to.chars().collect();
    let mut mapping: HashMap<char, Option<char>> = HashMap::new();
    for (i, c) in from.chars().enumerate() {
        mapping.entry(c).or_insert_with(|| to.get(i).copied());
    }
    s.chars()
        .filter_map(|c| match mapping.get(&c) {
            Some(Some(replacement)) => Some(*replacement),
            Some(None) => None,
            None => Some(c),
        })
        .collect()
}

pub(crate) fn substring_before(s: &str, needle: &str) -> String {
    match s.find(needle) {
        Some(i) => s[..i].to_string(),
        None => String::new(),
    }
}

pub(crate) fn substring_after(s: &str, needle: &str) -> String {
    match s.find(needle) {
        Some(i) => s[i + needle.len()..].to_string(),
        None => String::new(),
    }
}

/// 1-based character substring with the XPath rounding and saturation
/// rules: NaN start selects nothing, infinite lengths saturate, a start
/// before the beginning is clamped.
pub(crate) fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let char_count = s.chars().count() as i64;
    if char_count == 0 || start.is_nan() {
        return String::new();
    }

    let mut begin = round_to_int(start).saturating_sub(1);
    let mut span = char_count;
    if let Some(len) = length {
        span = if len == f64::INFINITY {
            i16::MAX as i64
        } else if len == f64::NEG_INFINITY {
            i16::MIN as i64
        } else if len.is_nan() {
            0
        } else {
            round_to_int(len)
        };
    }
    if span < 0 {
        return String::new();
    }

    let mut end = begin.saturating_add(span);
    if length.is_none() {
        end = char_count;
    }
    if begin < 0 {
        begin = 0;
    } else if begin > char_count {
        return String::new();
    }
    if end > char_count {
        end = char_count;
    } else if end < begin {
        return String::new();
    }

    s.chars()
        .skip(begin as usize)
        .take((end - begin) as usize)
        .collect()
}
