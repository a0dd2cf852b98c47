//! Multi-turn collection of trip details before the model is called.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::{
    error::{PlannerError, Result},
    types::PlanRequest,
};

/// The detail the dialogue is currently asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Destination,
    StartDate,
    Days,
    Budget,
    Travelers,
    DepartureCity,
    Preferences,
    Complete,
}

impl Slot {
    fn next(self) -> Slot {
        match self {
            Slot::Destination => Slot::StartDate,
            Slot::StartDate => Slot::Days,
            Slot::Days => Slot::Budget,
            Slot::Budget => Slot::Travelers,
            Slot::Travelers => Slot::DepartureCity,
            Slot::DepartureCity => Slot::Preferences,
            Slot::Preferences | Slot::Complete => Slot::Complete,
        }
    }

    /// Optional slots accept "skip" / "跳过".
    pub fn is_optional(self) -> bool {
        matches!(self, Slot::StartDate | Slot::DepartureCity | Slot::Preferences)
    }

    fn question(self) -> Option<&'static str> {
        Some(match self {
            Slot::Destination => "您想去哪里旅行？",
            Slot::StartDate => "计划哪天出发？（例如 2025-05-01，可回复“跳过”）",
            Slot::Days => "打算玩几天？",
            Slot::Budget => "总预算大概多少元？",
            Slot::Travelers => "一共几个人出行？",
            Slot::DepartureCity => "从哪个城市出发？（可回复“跳过”）",
            Slot::Preferences => "有什么偏好或必去的地方吗？（例如 美食、购物、东京塔，可回复“跳过”）",
            Slot::Complete => return None,
        })
    }
}

const SKIP_WORDS: &[&str] = &["skip", "跳过", "无", "没有", "随便"];
const MAX_DAYS: u32 = 30;
const MAX_TRAVELERS: u32 = 50;

/// Finite-state slot filler: destination → start date → days → budget → travelers →
/// departure city → preferences → complete.
#[derive(Debug, Clone)]
pub struct SlotFiller {
    state: Slot,
    request: PlanRequest,
}

impl Default for SlotFiller {
    fn default() -> Self {
        Self::new("")
    }
}

impl SlotFiller {
    /// Start a dialogue from the traveller's opening message.
    pub fn new(opening_text: impl Into<String>) -> Self {
        Self {
            state: Slot::Destination,
            request: PlanRequest {
                user_text: opening_text.into(),
                ..PlanRequest::default()
            },
        }
    }

    pub fn state(&self) -> Slot {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == Slot::Complete
    }

    /// Question for the current slot; `None` once complete.
    pub fn prompt(&self) -> Option<&'static str> {
        self.state.question()
    }

    /// Store an answer for the current slot and advance.
    ///
    /// An answer that cannot be read leaves the state unchanged and returns
    /// [`PlannerError::Validation`].
    pub fn answer(&mut self, text: &str) -> Result<Slot> {
        let text = text.trim();
        let slot = self.state;

        if slot == Slot::Complete {
            return Err(PlannerError::Validation(
                "all trip details have already been collected".to_string(),
            ));
        }

        let skipped = is_skip(text);
        if skipped && !slot.is_optional() {
            return Err(PlannerError::Validation(format!(
                "{slot:?} is required and cannot be skipped"
            )));
        }
        if !skipped {
            self.store(slot, text)?;
        }

        self.state = slot.next();
        debug!(target: "tripagent::conversation", ?slot, skipped, next = ?self.state, "slot filled");
        Ok(self.state)
    }

    fn store(&mut self, slot: Slot, text: &str) -> Result<()> {
        let request = &mut self.request;
        match slot {
            Slot::Destination => request.destination = non_empty(text, "destination")?,
            Slot::StartDate => request.start_date = Some(non_empty(text, "start date")?),
            Slot::Days => {
                request.days = Some(bounded_count(text, "days", MAX_DAYS)?);
            }
            Slot::Budget => {
                request.budget = Some(parse_amount(text).ok_or_else(|| {
                    PlannerError::Validation(format!("could not read a budget from {text:?}"))
                })?);
            }
            Slot::Travelers => {
                request.travelers = Some(bounded_count(text, "travelers", MAX_TRAVELERS)?);
            }
            Slot::DepartureCity => request.departure_city = Some(non_empty(text, "departure city")?),
            Slot::Preferences => {
                request.preferences = split_preferences(text);
                if request.user_text.is_empty() {
                    request.user_text = text.to_string();
                } else {
                    request.user_text = format!("{}\n{}", request.user_text, text);
                }
            }
            Slot::Complete => {}
        }
        Ok(())
    }

    /// The collected request, once every slot has been answered or skipped.
    pub fn into_request(self) -> Result<PlanRequest> {
        if !self.is_complete() {
            return Err(PlannerError::Validation(format!(
                "trip details incomplete: still waiting for {:?}",
                self.state
            )));
        }
        Ok(self.request)
    }

    pub fn request(&self) -> &PlanRequest {
        &self.request
    }
}

fn is_skip(text: &str) -> bool {
    let lowered = text.to_lowercase();
    text.is_empty() || SKIP_WORDS.iter().any(|word| lowered == *word)
}

fn non_empty(text: &str, what: &str) -> Result<String> {
    if text.is_empty() {
        return Err(PlannerError::Validation(format!("{what} must not be empty")));
    }
    Ok(text.to_string())
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*(万|千|[kK])?").expect("number pattern compiles")
    })
}

fn chinese_digit(c: char) -> Option<u32> {
    Some(match c {
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        '十' => 10,
        _ => return None,
    })
}

/// Whole count from `"5"`, `"5天"`, `"五天"` or `"两个人"`.
fn parse_count(text: &str) -> Option<u32> {
    if let Some(caps) = number_pattern().captures(text) {
        let value: f64 = caps[1].parse().ok()?;
        return (value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX))
            .then_some(value as u32);
    }
    text.chars().find_map(chinese_digit)
}

fn bounded_count(text: &str, what: &str, max: u32) -> Result<u32> {
    match parse_count(text) {
        Some(value) if (1..=max).contains(&value) => Ok(value),
        Some(value) => Err(PlannerError::Validation(format!(
            "{what} must be between 1 and {max}, got {value}"
        ))),
        None => Err(PlannerError::Validation(format!(
            "could not read a number of {what} from {text:?}"
        ))),
    }
}

/// Positive amount; `"5000元"`, `"1.5万"`, `"8k"`.
fn parse_amount(text: &str) -> Option<f64> {
    let caps = number_pattern().captures(text)?;
    let base: f64 = caps[1].parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("万") => 10_000.0,
        Some("千") | Some("k") | Some("K") => 1_000.0,
        _ => 1.0,
    };
    let amount = base * multiplier;
    (amount > 0.0 && amount.is_finite()).then_some(amount)
}

fn split_preferences(text: &str) -> Vec<String> {
    text.split(|c: char| matches!(c, ',' | '，' | '、' | ';' | '；' | '/') || c.is_whitespace())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dialogue() {
        let mut filler = SlotFiller::new("想去日本玩");
        assert_eq!(filler.prompt(), Some("您想去哪里旅行？"));

        assert_eq!(filler.answer("东京").unwrap(), Slot::StartDate);
        assert_eq!(filler.answer("2025-04-01").unwrap(), Slot::Days);
        assert_eq!(filler.answer("五天").unwrap(), Slot::Budget);
        assert_eq!(filler.answer("1.5万").unwrap(), Slot::Travelers);
        assert_eq!(filler.answer("两个人").unwrap(), Slot::DepartureCity);
        assert_eq!(filler.answer("上海").unwrap(), Slot::Preferences);
        assert_eq!(filler.answer("美食、东京塔").unwrap(), Slot::Complete);
        assert!(filler.prompt().is_none());

        let request = filler.into_request().unwrap();
        assert_eq!(request.destination, "东京");
        assert_eq!(request.start_date.as_deref(), Some("2025-04-01"));
        assert_eq!(request.days, Some(5));
        assert_eq!(request.budget, Some(15_000.0));
        assert_eq!(request.travelers, Some(2));
        assert_eq!(request.departure_city.as_deref(), Some("上海"));
        assert_eq!(request.preferences, vec!["美食", "东京塔"]);
        assert!(request.user_text.contains("东京塔"));
    }

    #[test]
    fn test_bad_answer_keeps_state() {
        let mut filler = SlotFiller::default();
        filler.answer("大阪").unwrap();
        filler.answer("跳过").unwrap();
        assert_eq!(filler.state(), Slot::Days);

        let err = filler.answer("不知道").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(filler.state(), Slot::Days);

        assert!(filler.answer("90天").is_err());
        assert_eq!(filler.answer("3").unwrap(), Slot::Budget);
    }

    #[test]
    fn test_required_slots_cannot_be_skipped() {
        let mut filler = SlotFiller::default();
        assert!(filler.answer("skip").is_err());
        assert!(filler.answer("   ").is_err());
        assert_eq!(filler.state(), Slot::Destination);
        assert!(filler.request().destination.is_empty());
    }

    #[test]
    fn test_incomplete_request_is_rejected() {
        let mut filler = SlotFiller::default();
        filler.answer("首尔").unwrap();
        assert!(filler.into_request().is_err());
    }

    #[test]
    fn test_amount_and_count_parsing() {
        assert_eq!(parse_amount("预算5000元"), Some(5000.0));
        assert_eq!(parse_amount("8k"), Some(8000.0));
        assert_eq!(parse_amount("没钱"), None);
        assert_eq!(parse_count("十天"), Some(10));
        assert_eq!(parse_count("3.5"), None);
    }
}
