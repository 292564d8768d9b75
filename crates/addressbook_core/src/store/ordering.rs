//! Display ordering for address book entries.
//!
//! # Responsibility
//! - Produce the display order from a storage-order snapshot.
//! - Provide the case/accent-insensitive, numeric-aware string collation
//!   used by every sort key.
//!
//! # Invariants
//! - `order` never mutates its input and is deterministic.
//! - Entries with a non-blank first name precede entries without one.
//! - Entries equal on every key keep their storage order (stable sort).

use crate::model::address::Address;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Chars;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::{Decompositions, UnicodeNormalization};

/// Returns `addresses` in display order.
pub fn order(addresses: &[Address]) -> Vec<Address> {
    let mut sorted = addresses.to_vec();
    sorted.sort_by(compare_addresses);
    sorted
}

/// Display comparator: named first, then first name, last name, street.
pub fn compare_addresses(a: &Address, b: &Address) -> Ordering {
    let a_first = trimmed(a.first_name.as_deref());
    let b_first = trimmed(b.first_name.as_deref());

    match (a_first.is_empty(), b_first.is_empty()) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }

    collate(a_first, b_first)
        .then_with(|| {
            collate(
                trimmed(a.last_name.as_deref()),
                trimmed(b.last_name.as_deref()),
            )
        })
        .then_with(|| collate(a.street.trim(), b.street.trim()))
}

/// Compares two strings at base strength with numeric digit runs.
///
/// Letters are compared after canonical decomposition with every combining
/// mark dropped, so case and accents are ignored in any script: `"Émile"`
/// equals `"emile"` and `"Ёлка"` equals `"елка"`. Digit runs compare by
/// value, so `"2nd"` sorts before `"10th"`. Whitespace and punctuation sort
/// before digits, digits before letters.
pub fn collate(a: &str, b: &str) -> Ordering {
    let mut left = CollationKeys::new(a);
    let mut right = CollationKeys::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = l.cmp(&r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn trimmed(value: Option<&str>) -> &str {
    value.unwrap_or("").trim()
}

/// One collation element. Variant order is the cross-class order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum CollationKey {
    Symbol(char),
    /// Digit run with leading zeros stripped; compared by length then digits.
    Number { len: usize, digits: String },
    Letter(char),
}

struct CollationKeys<'a> {
    chars: Peekable<Decompositions<Chars<'a>>>,
    pending: VecDeque<char>,
}

impl<'a> CollationKeys<'a> {
    fn new(value: &'a str) -> Self {
        Self {
            chars: value.nfd().peekable(),
            pending: VecDeque::new(),
        }
    }

    fn next_weighted(&mut self) -> Option<char> {
        loop {
            let c = self.chars.next()?;
            // Marks carry no weight at base strength.
            if !is_combining_mark(c) {
                return Some(c);
            }
        }
    }
}

impl Iterator for CollationKeys<'_> {
    type Item = CollationKey;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(letter) = self.pending.pop_front() {
            return Some(CollationKey::Letter(letter));
        }

        let c = self.next_weighted()?;

        if c.is_ascii_digit() {
            let mut run = String::from(c);
            while let Some(&next) = self.chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                run.push(next);
                self.chars.next();
            }
            let digits = run.trim_start_matches('0').to_string();
            return Some(CollationKey::Number {
                len: digits.len(),
                digits,
            });
        }

        if c.is_alphabetic() {
            let mut folded = fold_letter(c);
            let first = folded.next()?;
            self.pending.extend(folded);
            return Some(CollationKey::Letter(first));
        }

        if c.is_whitespace() {
            return Some(CollationKey::Symbol(' '));
        }
        Some(CollationKey::Symbol(c))
    }
}

/// Lowercases a decomposed letter and maps letters that carry their
/// diacritic or ligature in the base code point.
fn fold_letter(c: char) -> impl Iterator<Item = char> {
    let mut lower = c.to_lowercase();
    let first = lower.next().unwrap_or(c);
    let (base, extra): (char, Option<char>) = match first {
        'æ' => ('a', Some('e')),
        'œ' => ('o', Some('e')),
        'ß' => ('s', Some('s')),
        'þ' => ('t', Some('h')),
        'ð' | 'đ' => ('d', None),
        'ħ' => ('h', None),
        'ı' => ('i', None),
        'ł' | 'ŀ' => ('l', None),
        'ø' => ('o', None),
        'ŧ' => ('t', None),
        other => (other, None),
    };
    std::iter::once(base)
        .chain(extra)
        .chain(lower.filter(|c| !is_combining_mark(*c)))
}
