//! Heading numbering
//!
//! h2 headings are numbered with roman numerals, h3 with letters and h4 with
//! plain integers. A heading resets the counters of every level below it.

use crate::ftype::FType;
use serde::{Deserialize, Serialize};

/// Counters for h2, h3 and h4, threaded through a whole document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounterState {
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
}

impl HeadingCounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters after a heading of `f_type`, and the label of that heading.
    /// h1 (and non-heading types) leave the counters untouched and get no label.
    pub fn advance(self, f_type: FType) -> (Self, Option<String>) {
        match f_type {
            FType::H2 => {
                let next = Self {
                    h2: self.h2 + 1,
                    h3: 0,
                    h4: 0,
                };
                (next, Some(to_roman(next.h2)))
            }
            FType::H3 => {
                let next = Self {
                    h3: self.h3 + 1,
                    h4: 0,
                    ..self
                };
                (next, Some(to_letters(next.h3)))
            }
            FType::H4 => {
                let next = Self {
                    h4: self.h4 + 1,
                    ..self
                };
                (next, Some(next.h4.to_string()))
            }
            _ => (self, None),
        }
    }
}

pub fn to_roman(mut n: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// 1 -> A, 26 -> Z, 27 -> AA
pub fn to_letters(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(sequence: &[FType]) -> Vec<Option<String>> {
        let mut state = HeadingCounterState::new();
        sequence
            .iter()
            .map(|f_type| {
                let (next, label) = state.advance(*f_type);
                state = next;
                label
            })
            .collect()
    }

    #[test]
    fn test_roman() {
        assert_eq!(to_roman(1), "I");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(1994), "MCMXCIV");
    }

    #[test]
    fn test_letters() {
        assert_eq!(to_letters(1), "A");
        assert_eq!(to_letters(26), "Z");
        assert_eq!(to_letters(27), "AA");
        assert_eq!(to_letters(28), "AB");
    }

    #[test]
    fn test_sub_levels_reset() {
        use FType::*;
        let got = labels(&[H2, H3, H3, H4, H2, H3, H4, H4]);
        let expected: Vec<Option<String>> = ["I", "A", "B", "1", "II", "A", "1", "2"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_h1_leaves_counters() {
        let state = HeadingCounterState { h2: 2, h3: 1, h4: 3 };
        let (next, label) = state.advance(FType::H1);
        assert_eq!(next, state);
        assert!(label.is_none());
    }

    #[test]
    fn test_numbering_is_deterministic() {
        use FType::*;
        let sequence = [H2, H3, H4, H3, H2, H4];
        assert_eq!(labels(&sequence), labels(&sequence));
    }
}
