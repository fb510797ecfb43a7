//! Log Interpreter
//!
//! The backend reports progress as human-readable text. This module maps a
//! single line to a `(step, item id)` pair using a fixed trigger table.
//!
//! Unmatched lines are expected, not exceptional: most log entries
//! (problem statements, review prompts, error messages) carry no status
//! information, and the interpreter reports them as [`LogSignal::NONE`].
//!
//! Recognition order:
//! 1. Structured form `Step[ completed]: <step_name>[ ... for <id>]`
//! 2. Keyword triggers, first match wins (see [`TRIGGERS`])
//!
//! Ids are extracted best-effort from `(<id>)`, ` <id> ` or `node <id>`.

use htree_model::id::is_dotted;
use htree_model::{Phase, Step};
use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword → step table for free-text progress lines
pub const TRIGGERS: &[(&str, Step)] = &[
    ("Formulated top hypothesis", Step::Formulate),
    ("formulate_top_hypothesis", Step::Formulate),
    ("Classified", Step::Classify),
    ("Identified analysis", Step::Identify),
    ("Broke down", Step::Breakdown),
    ("Researching", Step::Research),
];

static STEP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Step(?: completed)?:\s*([a-zA-Z_]+)(?:.*?\sfor\s([\d.]+))?").expect("static regex")
});

static ID_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\(([\d.]+)\)").expect("static regex"),
        Regex::new(r"\s([\d.]+)\s").expect("static regex"),
        Regex::new(r"node\s([\d.]+)").expect("static regex"),
    ]
});

/// Result of interpreting one log line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSignal {
    /// Recognized step
    pub step: Option<Step>,
    /// Node the step refers to
    pub item_id: Option<String>,
}

impl LogSignal {
    /// No status change
    pub const NONE: LogSignal = LogSignal {
        step: None,
        item_id: None,
    };

    /// Phase of the recognized step
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.step.map(Step::phase)
    }

    /// Step and id, when both were recognized
    #[must_use]
    pub fn actionable(&self) -> Option<(Step, &str)> {
        Some((self.step?, self.item_id.as_deref()?))
    }
}

/// Interpret a single progress line
///
/// Never fails: a line without a known trigger yields [`LogSignal::NONE`].
#[must_use]
pub fn interpret(line: &str) -> LogSignal {
    if let Some(caps) = STEP_LINE.captures(line) {
        if let Some(step) = caps.get(1).and_then(|m| Step::from_name(m.as_str())) {
            let item_id = caps.get(2).and_then(|m| clean_id(m.as_str()));
            return LogSignal {
                step: Some(step),
                item_id,
            };
        }
    }

    TRIGGERS
        .iter()
        .find(|(needle, _)| line.contains(needle))
        .map_or(LogSignal::NONE, |&(_, step)| LogSignal {
            step: Some(step),
            item_id: extract_id(line),
        })
}

/// First dotted id found by the fallback patterns
#[must_use]
pub fn extract_id(line: &str) -> Option<String> {
    ID_PATTERNS.iter().find_map(|re| {
        re.captures_iter(line)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| clean_id(m.as_str()))
    })
}

fn clean_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches('.');
    is_dotted(trimmed).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_patterns_compile() {
        assert_eq!(Lazy::force(&STEP_LINE).captures_len(), 3);
        assert_eq!(Lazy::force(&ID_PATTERNS).len(), 3);
    }

    #[test]
    fn structured_step_with_id() {
        let signal = interpret("Step completed: classify_hypothesis for 1.2");
        assert_eq!(signal.phase(), Some(Phase::Classify));
        assert_eq!(signal.item_id.as_deref(), Some("1.2"));
    }

    #[test]
    fn structured_step_without_id() {
        let signal = interpret("Step: formulate_top_hypothesis");
        assert_eq!(signal.step, Some(Step::Formulate));
        assert_eq!(signal.phase(), Some(Phase::Research));
        assert!(signal.item_id.is_none());
        assert!(signal.actionable().is_none());
    }

    #[test]
    fn keyword_triggers_extract_parenthesized_ids() {
        let cases = [
            ("Classified hypothesis (1.2) 'Costs rose' as 'leaf'.", Step::Classify, "1.2"),
            ("Identified analysis for leaf (1.1.3): 'cohort study'.", Step::Identify, "1.1.3"),
            ("Broke down hypothesis (1) 'Profit fell'. Reasoning: x", Step::Breakdown, "1"),
            ("Formulated top hypothesis (1): 'Margins eroded'.", Step::Formulate, "1"),
        ];
        for (line, step, id) in cases {
            let signal = interpret(line);
            assert_eq!(signal.step, Some(step), "{line}");
            assert_eq!(signal.item_id.as_deref(), Some(id), "{line}");
        }
    }

    #[test]
    fn keyword_triggers_fall_back_to_bare_and_node_ids() {
        assert_eq!(interpret("Researching 2.1 market data").item_id.as_deref(), Some("2.1"));
        assert_eq!(interpret("Researching node 3.4").item_id.as_deref(), Some("3.4"));
    }

    #[test]
    fn trailing_dots_are_not_part_of_ids() {
        assert_eq!(
            interpret("Step completed: identify_analysis for 1.2.").item_id.as_deref(),
            Some("1.2")
        );
    }

    #[test]
    fn unknown_step_name_falls_through_to_keywords() {
        assert_eq!(interpret("Step completed: get_user_review"), LogSignal::NONE);
        let signal = interpret("Step: get_user_review, Classified (4)");
        assert_eq!(signal.step, Some(Step::Classify));
        assert_eq!(signal.item_id.as_deref(), Some("4"));
    }

    #[test]
    fn unrecognized_lines_yield_none() {
        for line in [
            "",
            "Problem statement defined: sales fell 15%",
            "Error classifying hypothesis 1.2: timeout",
            "User provided correction for node (1.3). Learning saved.",
        ] {
            assert_eq!(interpret(line), LogSignal::NONE, "{line}");
        }
    }
}
