//! Day-pattern parsing into canonical weekday sets.
//!
//! # Responsibility
//! - Turn loosely formatted day codes (`MWF`, `TTh`, `Mon-Fri (Daily)`) into
//!   a canonical `DaySet`.
//!
//! # Invariants
//! - Parsing is total: unknown residue is ignored, worst case is empty.
//! - Whole-pattern aliases win over token scanning.
//! - Token scanning tries two-letter tokens before single letters, so `TH`
//!   is never read as `T` plus a stray `H`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Day of week in canonical Monday-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const WEEKDAYS: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Compact display code used in day patterns.
    pub fn code(self) -> &'static str {
        match self {
            Self::Mon => "M",
            Self::Tue => "T",
            Self::Wed => "W",
            Self::Thu => "Th",
            Self::Fri => "F",
            Self::Sat => "Sa",
            Self::Sun => "Su",
        }
    }
}

/// Whole-pattern aliases, checked by substring in priority order.
const RANGE_ALIASES: &[(&str, &[Weekday])] = &[
    ("MTWTHF", &Weekday::WEEKDAYS),
    ("DAILY", &Weekday::WEEKDAYS),
    ("MON-FRI", &Weekday::WEEKDAYS),
    (
        "MON-SAT",
        &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ],
    ),
];

/// Single-day names that must match the whole pattern exactly.
const EXACT_NAMES: &[(&str, Weekday)] = &[
    ("SAT", Weekday::Sat),
    ("SATURDAY", Weekday::Sat),
    ("SUN", Weekday::Sun),
    ("SUNDAY", Weekday::Sun),
];

/// Scan tokens, longest first.
const DAY_TOKENS: &[(&str, Weekday)] = &[
    ("TH", Weekday::Thu),
    ("SU", Weekday::Sun),
    ("SA", Weekday::Sat),
    ("M", Weekday::Mon),
    ("T", Weekday::Tue),
    ("W", Weekday::Wed),
    ("F", Weekday::Fri),
];

/// Canonical set of weekdays a meeting recurs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaySet(BTreeSet<Weekday>);

impl DaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a free-form day code. Never fails.
    pub fn parse(pattern: &str) -> Self {
        parse_day_pattern(pattern)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0.insert(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether both sets share at least one day.
    pub fn intersects(&self, other: &DaySet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Iterates in Monday-to-Sunday order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for DaySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for day in self.iter() {
            f.write_str(day.code())?;
        }
        Ok(())
    }
}

/// Parses a loosely formatted day pattern into a canonical weekday set.
///
/// Matching is case-insensitive and ignores whitespace. Characters that are
/// not part of any known token are skipped.
pub fn parse_day_pattern(pattern: &str) -> DaySet {
    let normalized = normalize_pattern(pattern);

    for (alias, days) in RANGE_ALIASES {
        if normalized.contains(alias) {
            return days.iter().copied().collect();
        }
    }

    if let Some((_, day)) = EXACT_NAMES
        .iter()
        .find(|(name, _)| normalized == *name)
    {
        return DaySet::from_iter([*day]);
    }

    scan_tokens(&normalized)
}

/// Per-evaluation memo of parsed day patterns keyed by raw input.
///
/// Meant to live for one detection call or one scan, then be dropped.
#[derive(Debug, Default)]
pub struct DayPatternCache {
    parsed: RefCell<HashMap<String, DaySet>>,
}

impl DayPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed set for `pattern`, parsing at most once per input.
    pub fn get(&self, pattern: &str) -> DaySet {
        if let Some(days) = self.parsed.borrow().get(pattern) {
            return days.clone();
        }
        let days = parse_day_pattern(pattern);
        self.parsed
            .borrow_mut()
            .insert(pattern.to_string(), days.clone());
        days
    }

    pub fn len(&self) -> usize {
        self.parsed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.borrow().is_empty()
    }
}

fn normalize_pattern(pattern: &str) -> String {
    WHITESPACE_RE
        .replace_all(pattern.trim(), "")
        .to_ascii_uppercase()
}

fn scan_tokens(normalized: &str) -> DaySet {
    let mut days = DaySet::new();
    let mut rest = normalized;

    while !rest.is_empty() {
        match DAY_TOKENS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
        {
            Some((token, day)) => {
                days.insert(*day);
                rest = &rest[token.len()..];
            }
            None => {
                let skip = rest.chars().next().map_or(1, char::len_utf8);
                rest = &rest[skip..];
            }
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::{parse_day_pattern, DayPatternCache, DaySet, Weekday};

    fn days(list: &[Weekday]) -> DaySet {
        list.iter().copied().collect()
    }

    #[test]
    fn parses_common_codes() {
        use Weekday::*;
        assert_eq!(parse_day_pattern("MWF"), days(&[Mon, Wed, Fri]));
        assert_eq!(parse_day_pattern("TTh"), days(&[Tue, Thu]));
        assert_eq!(parse_day_pattern("Daily"), days(&[Mon, Tue, Wed, Thu, Fri]));
        assert_eq!(parse_day_pattern("SAT"), days(&[Sat]));
        assert_eq!(parse_day_pattern("sunday"), days(&[Sun]));
        assert!(parse_day_pattern("").is_empty());
    }

    #[test]
    fn range_aliases_take_priority() {
        use Weekday::*;
        assert_eq!(
            parse_day_pattern("Mon-Fri (Daily)"),
            days(&[Mon, Tue, Wed, Thu, Fri])
        );
        assert_eq!(
            parse_day_pattern("mon - sat"),
            days(&[Mon, Tue, Wed, Thu, Fri, Sat])
        );
        assert_eq!(parse_day_pattern("MTWThF"), days(&[Mon, Tue, Wed, Thu, Fri]));
    }

    #[test]
    fn two_letter_tokens_are_consumed_before_single_letters() {
        use Weekday::*;
        assert_eq!(parse_day_pattern("Th"), days(&[Thu]));
        assert_eq!(parse_day_pattern("TThSa"), days(&[Tue, Thu, Sat]));
        assert_eq!(parse_day_pattern("MSu"), days(&[Mon, Sun]));
    }

    #[test]
    fn unknown_residue_is_ignored() {
        use Weekday::*;
        assert_eq!(parse_day_pattern("M/W (lab)"), days(&[Mon, Wed]));
        assert!(parse_day_pattern("xyz?").is_empty());
        assert!(parse_day_pattern("é").is_empty());
    }

    #[test]
    fn display_uses_canonical_order() {
        assert_eq!(parse_day_pattern("FWM").to_string(), "MWF");
        assert_eq!(parse_day_pattern("thT").to_string(), "TTh");
    }

    #[test]
    fn intersection_is_symmetric() {
        let patterns = ["MWF", "TTh", "Daily", "SAT", "", "MTh", "Su"];
        for a in patterns {
            for b in patterns {
                let left = parse_day_pattern(a);
                let right = parse_day_pattern(b);
                assert_eq!(left.intersects(&right), right.intersects(&left));
            }
        }
        assert!(!parse_day_pattern("MWF").intersects(&parse_day_pattern("TTh")));
    }

    #[test]
    fn cache_parses_each_input_once() {
        let cache = DayPatternCache::new();
        assert_eq!(cache.get("MWF"), parse_day_pattern("MWF"));
        assert_eq!(cache.get("MWF"), parse_day_pattern("MWF"));
        assert_eq!(cache.get("TTh"), parse_day_pattern("TTh"));
        assert_eq!(cache.len(), 2);
    }
}
