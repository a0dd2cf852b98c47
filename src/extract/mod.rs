//! Attraction extraction: which places did the traveller explicitly ask for?

pub mod landmarks;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{ops::Range, sync::OnceLock};
use tracing::debug;

use landmarks::{CJK_SUFFIXES, LANDMARKS, LATIN_SUFFIXES};

/// Ordered, de-duplicated attraction names the itinerary is expected to include.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredEntitySet {
    names: Vec<String>,
}

impl RequiredEntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trimmed, non-empty name unless already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref().trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

impl<S: AsRef<str>> FromIterator<S> for RequiredEntitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RequiredEntitySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

struct AttractionPattern {
    name: &'static str,
    regex: Regex,
}

// Characters allowed inside a captured name.
const NAME_CHARS: &str = r"[[\p{Han}A-Za-z0-9·]--[的了和与及]]";
// Narrower class for suffix-terminated names: pronouns, verbs and particles end a name.
const BARE_NAME_CHARS: &str =
    r"[[\p{Han}A-Za-z0-9·]--[的了和与及我你他她它们想要去到在是也还再就把给让从向往带看玩逛游个这那些很都吧呢啊先后最回然顺便次]]";
const LATIN_WORD: &str = r"[A-Z][\w'’\-]*";

/// Patterns in priority order. Where matches overlap, the earlier pattern wins.
fn patterns() -> &'static [AttractionPattern] {
    static PATTERNS: OnceLock<Vec<AttractionPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let cjk_suffix = CJK_SUFFIXES.join("|");
        let latin_suffix = LATIN_SUFFIXES.join("|");
        let compile = |name: &'static str, pattern: String| AttractionPattern {
            name,
            regex: Regex::new(&pattern).expect("attraction pattern compiles"),
        };
        vec![
            compile(
                "visit_verb",
                format!(r"(?:参观|游览|打卡|逛逛|看看|拜访|登上)(?:一下|一趟|下)?({NAME_CHARS}{{2,16}})"),
            ),
            compile(
                "go_to_landmark",
                format!(r"(?:去|到|逛|看|玩)(?:一下|一趟|下)?({BARE_NAME_CHARS}{{0,12}}(?:{cjk_suffix}))"),
            ),
            compile(
                "landmark_suffix",
                format!(r"({BARE_NAME_CHARS}{{1,10}}(?:{cjk_suffix}))"),
            ),
            compile(
                "visit_verb_latin",
                format!(
                    r"(?i:visit|see|explore|tour|go to)\s+(?i:the\s+)?({LATIN_WORD}(?:\s+(?:of\s+|de\s+|the\s+)?{LATIN_WORD}){{0,4}})"
                ),
            ),
            compile(
                "landmark_suffix_latin",
                format!(r"\b((?:{LATIN_WORD}\s+){{1,4}}(?:{latin_suffix}))\b"),
            ),
        ]
    })
}

fn clause_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| {
        Regex::new(
            r"[，。、；：！？,.;:!?\n\r\t（）()“”]+|以及|还有|然后|之后|接着|或者|和|与|及|跟|\s+and\s+|\s*&\s*",
        )
        .expect("clause splitter compiles")
    })
}

const TRAILING_FILLER: &[&str] = &["玩玩", "看看", "一下", "一趟", "玩", "吧", "呢", "啊", "呀", "了"];

// A name ends where one of these begins: "东京塔附近" names 东京塔.
const LOCATION_WORDS: &[&str] = &["附近", "旁边", "周边", "周围", "边上", "一带", "对面", "边"];

/// Byte range of the usable name inside a raw capture.
fn name_range(raw: &str) -> Option<Range<usize>> {
    let start = raw.len() - raw.trim_start().len();
    let mut name = &raw[start..];
    if let Some(cut) = LOCATION_WORDS.iter().filter_map(|word| name.find(word)).min() {
        name = &name[..cut];
    }
    loop {
        let before = name.len();
        for filler in TRAILING_FILLER {
            name = name.strip_suffix(filler).unwrap_or(name);
        }
        name = name.trim_end();
        if name.len() == before {
            break;
        }
    }
    (name.chars().count() >= 2).then(|| start..start + name.len())
}

/// Names claimed in one clause, in text order.
fn clause_matches(clause: &str) -> Vec<String> {
    let mut claimed: Vec<(Range<usize>, String)> = Vec::new();
    for pattern in patterns() {
        for capture in pattern.regex.captures_iter(clause).filter_map(|caps| caps.get(1)) {
            let Some(range) = name_range(capture.as_str()) else {
                continue;
            };
            let span = capture.start() + range.start..capture.start() + range.end;
            if claimed
                .iter()
                .any(|(taken, _)| taken.start < span.end && span.start < taken.end)
            {
                continue;
            }
            let name = clause[span.clone()].to_string();
            debug!(target: "tripagent::extract", pattern = pattern.name, clause, attraction = %name, "pattern match");
            claimed.push((span, name));
        }
    }
    claimed.sort_by_key(|(span, _)| span.start);
    claimed.into_iter().map(|(_, name)| name).collect()
}

/// Scan free text for attractions the traveller explicitly asked to include.
///
/// Every pattern runs over each clause; where two matches overlap, the
/// higher-priority pattern keeps the text. Names are added in text order.
/// Pure and infallible; returns an empty set when nothing landmark-like is found.
pub fn extract_required_attractions(user_text: &str) -> RequiredEntitySet {
    let mut found = RequiredEntitySet::new();
    if user_text.trim().is_empty() {
        return found;
    }

    for clause in clause_splitter().split(user_text) {
        for name in clause_matches(clause) {
            found.insert(name);
        }
    }

    let lowered = user_text.to_lowercase();
    for landmark in LANDMARKS {
        let Some(hit) = landmark
            .spellings()
            .find(|candidate| lowered.contains(&candidate.to_lowercase()))
        else {
            continue;
        };
        let hit_lower = hit.to_lowercase();
        let subsumed = found
            .iter()
            .any(|existing| existing.to_lowercase().contains(&hit_lower) || existing.contains(landmark.name));
        if !subsumed {
            debug!(target: "tripagent::extract", landmark = landmark.name, hit, "gazetteer match");
            found.insert(landmark.name);
        }
    }

    found
}
