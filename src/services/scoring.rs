//! Session scoring: overall score, dimension breakdown, strengths, readiness and
//! the running profile update applied at completion.

use chrono::NaiveDate;

use crate::models::{
    evaluation::{AnswerFeedback, Mistake, ScoreBreakdown},
    interview::AnswerEvaluation,
    user::{ReadinessStatus, User},
};

pub const READY_THRESHOLD: f64 = 8.0;
pub const NEEDS_PRACTICE_THRESHOLD: f64 = 6.0;
pub const STRENGTH_THRESHOLD: f64 = 8.0;
/// Only used to label dimensions in reviews; never gates anything.
pub const WEAK_DIMENSION_THRESHOLD: f64 = 6.5;
/// Answers scoring below this get corrective feedback at completion.
pub const FEEDBACK_SCORE_THRESHOLD: f64 = 7.0;
pub const MAX_MISTAKES: usize = 3;
pub const MAX_TIPS: usize = 3;

const DEFAULT_STRENGTHS: [&str; 2] = ["Completed the interview", "Attempted all questions"];
const DEFAULT_TIPS: [&str; 3] = [
    "Practice STAR method",
    "Use specific examples",
    "Be concise and structured",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    /// Unrounded mean of the answer scores.
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
    pub strengths: Vec<String>,
    pub readiness: ReadinessStatus,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn aggregate(evaluations: &[AnswerEvaluation]) -> ScoreSummary {
    let overall_score = mean(evaluations.iter().map(|e| e.score));
    let breakdown = breakdown(evaluations);

    ScoreSummary {
        overall_score,
        strengths: derive_strengths(&breakdown),
        readiness: classify_readiness(overall_score),
        breakdown,
    }
}

pub fn breakdown(evaluations: &[AnswerEvaluation]) -> ScoreBreakdown {
    ScoreBreakdown {
        clarity: round2(mean(evaluations.iter().map(|e| e.clarity))),
        confidence: round2(mean(evaluations.iter().map(|e| e.confidence))),
        structure: round2(mean(evaluations.iter().map(|e| e.structure))),
        relevance: round2(mean(evaluations.iter().map(|e| e.relevance))),
    }
}

pub fn classify_readiness(overall_score: f64) -> ReadinessStatus {
    if overall_score >= READY_THRESHOLD {
        ReadinessStatus::Ready
    } else if overall_score >= NEEDS_PRACTICE_THRESHOLD {
        ReadinessStatus::NeedsPractice
    } else {
        ReadinessStatus::NotReady
    }
}

pub fn derive_strengths(breakdown: &ScoreBreakdown) -> Vec<String> {
    let strengths: Vec<String> = breakdown
        .dimensions()
        .iter()
        .filter(|(_, value)| *value >= STRENGTH_THRESHOLD)
        .map(|(name, _)| format!("Strong {}", name))
        .collect();

    if strengths.is_empty() {
        DEFAULT_STRENGTHS.iter().map(|s| s.to_string()).collect()
    } else {
        strengths
    }
}

/// Capitalised names of the dimensions below the weak threshold.
pub fn weak_dimensions(breakdown: &ScoreBreakdown) -> Vec<String> {
    breakdown
        .dimensions()
        .iter()
        .filter(|(_, value)| *value < WEAK_DIMENSION_THRESHOLD)
        .map(|(name, _)| capitalize(name))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn needs_feedback(score: f64) -> bool {
    score < FEEDBACK_SCORE_THRESHOLD
}

/// Collects the first mistake and first tip from each weak answer's feedback.
#[derive(Debug, Default)]
pub struct FeedbackPool {
    mistakes: Vec<Mistake>,
    tips: Vec<String>,
}

impl FeedbackPool {
    pub fn add(&mut self, feedback: &AnswerFeedback) {
        if let Some(mistake) = feedback.mistakes.first() {
            self.mistakes.push(mistake.clone());
        }
        if let Some(tip) = feedback.tips.first() {
            self.tips.push(tip.clone());
        }
    }

    /// Caps mistakes, deduplicates tips in first-seen order and substitutes the
    /// default tips when none were collected.
    pub fn finish(self) -> (Vec<Mistake>, Vec<String>) {
        let mut mistakes = self.mistakes;
        mistakes.truncate(MAX_MISTAKES);

        let mut tips: Vec<String> = Vec::new();
        for tip in self.tips {
            if !tips.contains(&tip) {
                tips.push(tip);
            }
        }
        if tips.is_empty() {
            tips = DEFAULT_TIPS.iter().map(|t| t.to_string()).collect();
        }
        tips.truncate(MAX_TIPS);

        (mistakes, tips)
    }
}

pub fn incremental_average(old_average: f64, old_total: i32, new_score: f64) -> f64 {
    let old_total = old_total.max(0) as f64;
    (old_average * old_total + new_score) / (old_total + 1.0)
}

/// Consecutive calendar days with a completed session.
pub fn next_streak(current: i32, last_practice: Option<NaiveDate>, today: NaiveDate) -> i32 {
    match last_practice {
        Some(last) if last == today => current.max(1),
        Some(last) if last.succ_opt() == Some(today) => current + 1,
        _ => 1,
    }
}

/// Profile fields overwritten when a session completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileProgress {
    pub total_interviews: i32,
    pub average_score: f64,
    pub streak: i32,
    pub last_practice_date: NaiveDate,
    pub readiness_status: ReadinessStatus,
}

impl ProfileProgress {
    pub fn after_completion(user: &User, raw_score: f64, readiness: ReadinessStatus, today: NaiveDate) -> Self {
        Self {
            total_interviews: user.total_interviews + 1,
            average_score: incremental_average(user.average_score, user.total_interviews, raw_score),
            streak: next_streak(user.streak, user.last_practice_date, today),
            last_practice_date: today,
            readiness_status: readiness,
        }
    }

    pub fn apply(&self, user: &mut User) {
        user.total_interviews = self.total_interviews;
        user.average_score = self.average_score;
        user.streak = self.streak;
        user.last_practice_date = Some(self.last_practice_date);
        user.readiness_status = self.readiness_status;
    }
}
