use crate::trials::profile::{Dimension, PersonalityProfile};

/// Answers shorter than this many glyphs read as dismissive.
const SHORT_ANSWER_GLYPHS: usize = 4;
/// Answers at least this long earn a small thoughtfulness credit.
const THOUGHTFUL_ANSWER_GLYPHS: usize = 12;

/// Keyword groups matched against the lowercased answer. A group fires at
/// most once no matter how many of its patterns appear; distinct groups
/// stack. Patterns cover both English and Chinese phrasing since players
/// answer in either.
const RULES: &[(&[&str], &[(Dimension, f64)])] = &[
    (
        &["守护", "护佑", "protect", "guard", "shield"],
        &[(Dimension::Kindness, 2.0), (Dimension::Courage, 1.0)],
    ),
    (
        &["苍生", "众生", "天下人", "all beings", "the people", "everyone"],
        &[(Dimension::Kindness, 1.5), (Dimension::Honesty, 1.0)],
    ),
    (
        &["坚持", "不懈", "苦修", "persevere", "persist", "endure", "never give up"],
        &[(Dimension::Determination, 2.0), (Dimension::Stability, 0.5)],
    ),
    (
        &["最强", "无敌", "称霸", "strongest", "supreme", "invincible"],
        &[(Dimension::Determination, 1.0), (Dimension::Greed, 1.0)],
    ),
    (
        &["财富", "金钱", "灵石", "发财", "wealth", "gold", "money", "treasure"],
        &[(Dimension::Greed, 2.0)],
    ),
    (
        &["诚实", "坦诚", "真话", "honest", "truth", "sincere"],
        &[(Dimension::Honesty, 2.0)],
    ),
    (
        &["欺骗", "算计", "骗过", "deceive", "trick", "cheat", "scheme"],
        &[(Dimension::Manipulation, 2.0), (Dimension::Honesty, -1.0)],
    ),
    (
        &["速成", "捷径", "马上", "立刻", "shortcut", "immediately", "right now"],
        &[(Dimension::Impatience, 1.5)],
    ),
    (
        &["平静", "冷静", "心静", "calm", "steady", "patient"],
        &[(Dimension::Stability, 1.5), (Dimension::Impatience, -1.0)],
    ),
    (
        &["无畏", "勇气", "不怕", "brave", "courage", "fearless", "dare"],
        &[(Dimension::Courage, 2.0)],
    ),
    (
        &["钻研", "专注", "求知", "study", "learn", "focus", "understand"],
        &[(Dimension::Focus, 1.5)],
    ),
];

/// Scores one free-text answer without any model in the loop. Used when the
/// evaluator is disabled, unconfigured, or failing.
pub fn score_free_text(answer: &str) -> PersonalityProfile {
    let trimmed = answer.trim();
    let lowered = trimmed.to_lowercase();

    let mut delta = PersonalityProfile::zero();
    for (patterns, effects) in RULES {
        if patterns.iter().any(|pattern| lowered.contains(pattern)) {
            for (dimension, amount) in *effects {
                delta.nudge(*dimension, *amount);
            }
        }
    }

    let glyphs = trimmed.chars().count();
    if glyphs < SHORT_ANSWER_GLYPHS {
        delta.nudge(Dimension::Impatience, 1.0);
        delta.nudge(Dimension::Focus, -0.5);
    } else if glyphs >= THOUGHTFUL_ANSWER_GLYPHS {
        delta.nudge(Dimension::Focus, 1.0);
        delta.nudge(Dimension::Stability, 0.5);
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardianship_vow_reads_as_kind_and_honest() {
        let delta = score_free_text("我愿守护苍生");
        assert!(delta.kindness > 0.0);
        assert!(delta.honesty > 0.0);
        assert_eq!(delta.manipulation, 0.0);
    }

    #[test]
    fn wealth_talk_reads_as_greed() {
        let delta = score_free_text("I just want gold and treasure, as much as possible");
        assert!(delta.greed >= 2.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let by_case = score_free_text("PROTECT the weak whenever I can");
        assert!(by_case.kindness > 0.0);
    }

    #[test]
    fn curt_answer_pays_the_impatience_toll() {
        let delta = score_free_text("嗯");
        assert!(delta.impatience >= 1.0);
        assert!(delta.focus < 0.0);
    }

    #[test]
    fn long_answer_earns_thoughtfulness_credit() {
        let delta = score_free_text("我希望能在漫长的修行中慢慢理解这个世界的规则");
        assert!(delta.focus >= 1.0);
        assert!(delta.stability > 0.0);
    }

    #[test]
    fn groups_fire_once_but_stack_across_groups() {
        let once = score_free_text("protect and guard them");
        assert_eq!(once.kindness, 2.0);

        let stacked = score_free_text("I will protect the people");
        assert_eq!(stacked.kindness, 3.5);
    }
}
