//! Static interview content: the canned questions used when generation fails,
//! and the practice bank served to candidates.

use uuid::Uuid;

use crate::models::{interview::InterviewType, practice::PracticeQuestion};

const HR_FALLBACK: [&str; 5] = [
    "Tell me about yourself.",
    "What are your strengths and weaknesses?",
    "Why should we hire you?",
    "Describe a challenge you faced and how you handled it.",
    "How do you handle pressure and deadlines?",
];

const TECHNICAL_FALLBACK: [&str; 5] = [
    "Explain a project you have worked on.",
    "What is the difference between stack and queue?",
    "What is an API and why is it used?",
    "How do you debug an application?",
    "Explain one technology you are confident in.",
];

const BEHAVIORAL_FALLBACK: [&str; 5] = [
    "Describe a time you worked in a team.",
    "Tell me about a conflict you faced and how you resolved it.",
    "Describe a failure and what you learned from it.",
    "How do you handle feedback?",
    "Give an example of leadership.",
];

pub fn fallback_questions(interview_type: InterviewType) -> &'static [&'static str] {
    match interview_type {
        InterviewType::Hr => &HR_FALLBACK,
        InterviewType::Technical => &TECHNICAL_FALLBACK,
        InterviewType::Behavioral => &BEHAVIORAL_FALLBACK,
    }
}

/// Pure function of `(type, number)`; numbers past the list wrap around.
pub fn fallback_question(interview_type: InterviewType, question_number: i32) -> &'static str {
    let questions = fallback_questions(interview_type);
    let index = (question_number - 1).rem_euclid(questions.len() as i32) as usize;
    questions[index]
}

struct BankEntry {
    question: &'static str,
    ideal_answer: &'static str,
    key_points: &'static [&'static str],
    common_mistakes: &'static [&'static str],
}

const HR_BANK: [BankEntry; 7] = [
    BankEntry {
        question: "Tell me about yourself.",
        ideal_answer: "Start with your current role, highlight relevant experience, mention key achievements, and connect to the role you're applying for.",
        key_points: &["Current role", "Relevant experience", "Key achievements", "Career goals"],
        common_mistakes: &["Being too personal", "Rambling without structure", "Not tailoring to the job"],
    },
    BankEntry {
        question: "What are your strengths and weaknesses?",
        ideal_answer: "Choose strengths relevant to the role with examples. For weaknesses, mention something you're actively working to improve.",
        key_points: &["Relevant strengths", "Real examples", "Honest weakness", "Improvement plan"],
        common_mistakes: &["Generic answers", "Fake weaknesses", "No examples"],
    },
    BankEntry {
        question: "Why should we hire you?",
        ideal_answer: "Highlight your unique value proposition, relevant skills, and how you can solve their problems or contribute to their goals.",
        key_points: &["Unique value", "Relevant skills", "Company knowledge", "Problem solving"],
        common_mistakes: &["Being arrogant", "Generic response", "Not researching company"],
    },
    BankEntry {
        question: "Describe a challenge you faced and how you handled it.",
        ideal_answer: "Use STAR method: Situation, Task, Action, Result. Focus on your specific actions and the positive outcome.",
        key_points: &["Clear situation", "Your role", "Specific actions", "Measurable results"],
        common_mistakes: &["Blaming others", "No clear resolution", "Vague details"],
    },
    BankEntry {
        question: "How do you handle pressure and deadlines?",
        ideal_answer: "Describe your prioritization strategy, time management techniques, and give a specific example of handling pressure successfully.",
        key_points: &["Prioritization", "Time management", "Staying calm", "Real example"],
        common_mistakes: &["Saying you never feel pressure", "No concrete examples"],
    },
    BankEntry {
        question: "Where do you see yourself in 5 years?",
        ideal_answer: "Show ambition aligned with the company's growth path. Mention skills you want to develop and value you want to add.",
        key_points: &["Career growth", "Skill development", "Company alignment", "Realistic goals"],
        common_mistakes: &["Too vague", "Different career path", "No growth mindset"],
    },
    BankEntry {
        question: "What motivates you at work?",
        ideal_answer: "Connect your motivation to the role's responsibilities. Mention intrinsic factors like learning, impact, or teamwork.",
        key_points: &["Intrinsic motivation", "Role relevance", "Growth mindset", "Team contribution"],
        common_mistakes: &["Only money", "Too generic", "Not role-specific"],
    },
];

const TECHNICAL_BANK: [BankEntry; 7] = [
    BankEntry {
        question: "Explain a project you have worked on.",
        ideal_answer: "Describe the problem, your technical approach, technologies used, challenges faced, and the impact of your solution.",
        key_points: &["Problem statement", "Technical solution", "Your contribution", "Impact/results"],
        common_mistakes: &["Too technical without context", "No mention of impact", "Taking all credit"],
    },
    BankEntry {
        question: "What is the difference between stack and queue?",
        ideal_answer: "Stack is LIFO (Last In First Out), queue is FIFO (First In First Out). Give real-world examples and use cases.",
        key_points: &["LIFO vs FIFO", "Operations", "Use cases", "Time complexity"],
        common_mistakes: &["No examples", "Confusing the concepts", "No practical use cases"],
    },
    BankEntry {
        question: "What is an API and why is it used?",
        ideal_answer: "API is a set of protocols for building software. It allows different applications to communicate. Explain with REST or GraphQL examples.",
        key_points: &["Definition", "Purpose", "Types (REST, GraphQL)", "Real example"],
        common_mistakes: &["Too vague", "No examples", "Only theoretical"],
    },
    BankEntry {
        question: "How do you debug an application?",
        ideal_answer: "Describe your systematic approach: reproduce the bug, check logs, use debugging tools, isolate the issue, fix and test.",
        key_points: &["Reproduce bug", "Check logs", "Use debugger", "Root cause analysis", "Testing"],
        common_mistakes: &["Random fixes", "No systematic approach", "Not testing fix"],
    },
    BankEntry {
        question: "Explain one technology you are confident in.",
        ideal_answer: "Choose a relevant technology, explain its purpose, your experience level, projects where you used it, and why you like it.",
        key_points: &["Technology name", "Your experience", "Real projects", "Why you chose it"],
        common_mistakes: &["Too shallow", "No practical experience", "Outdated technology"],
    },
    BankEntry {
        question: "What is the difference between frontend and backend?",
        ideal_answer: "Frontend is client-side (UI/UX, user interactions), backend is server-side (logic, database, APIs). Mention technologies for each.",
        key_points: &["Frontend definition", "Backend definition", "Technologies", "How they interact"],
        common_mistakes: &["Oversimplifying", "No mention of technologies", "Confusing terms"],
    },
    BankEntry {
        question: "What is database normalization?",
        ideal_answer: "Process of organizing data to reduce redundancy. Explain 1NF, 2NF, 3NF with examples and benefits.",
        key_points: &["Definition", "Normal forms", "Benefits", "Trade-offs"],
        common_mistakes: &["Only definition", "No examples", "Not explaining why it matters"],
    },
];

const BEHAVIORAL_BANK: [BankEntry; 7] = [
    BankEntry {
        question: "Describe a time you worked in a team.",
        ideal_answer: "Use STAR method. Highlight your role, collaboration skills, how you handled conflicts, and the team's success.",
        key_points: &["Team context", "Your role", "Collaboration", "Outcome"],
        common_mistakes: &["Only 'I' statements", "No specific example", "Negative team comments"],
    },
    BankEntry {
        question: "Tell me about a conflict you faced and how you resolved it.",
        ideal_answer: "Describe the conflict objectively, your approach to resolution, communication used, and the positive outcome.",
        key_points: &["Conflict context", "Your approach", "Communication", "Resolution"],
        common_mistakes: &["Blaming others", "Avoiding conflict", "No resolution shown"],
    },
    BankEntry {
        question: "Describe a failure and what you learned from it.",
        ideal_answer: "Be honest about the failure, take ownership, explain what you learned, and how you applied that learning.",
        key_points: &["What happened", "Your ownership", "Lessons learned", "How you grew"],
        common_mistakes: &["Blaming externals", "Not showing growth", "Fake failure"],
    },
    BankEntry {
        question: "How do you handle feedback?",
        ideal_answer: "Explain your openness to feedback, how you process it, examples of acting on feedback, and how it helped you improve.",
        key_points: &["Open mindset", "Processing feedback", "Taking action", "Growth example"],
        common_mistakes: &["Being defensive", "No examples", "Saying you never get negative feedback"],
    },
    BankEntry {
        question: "Give an example of leadership.",
        ideal_answer: "Describe a situation where you led (formally or informally), your approach, how you motivated others, and the outcome.",
        key_points: &["Leadership context", "Your approach", "Team motivation", "Results"],
        common_mistakes: &["No specific example", "Authoritative style only", "Taking all credit"],
    },
    BankEntry {
        question: "Describe a situation where you missed a deadline.",
        ideal_answer: "Be honest, explain circumstances, what you did to mitigate, what you learned, and how you prevent it now.",
        key_points: &["What happened", "Your actions", "Communication", "Learning"],
        common_mistakes: &["Blaming others", "Not showing learning", "No prevention strategy"],
    },
    BankEntry {
        question: "How do you prioritize tasks?",
        ideal_answer: "Explain your prioritization framework (urgency/importance matrix), tools you use, and give a real example.",
        key_points: &["Framework/method", "Tools used", "Example", "Flexibility"],
        common_mistakes: &["No clear method", "Too rigid", "No examples"],
    },
];

/// Practice entries for a category, each with a fresh id.
pub fn practice_bank(category: InterviewType) -> Vec<PracticeQuestion> {
    let entries: &[BankEntry] = match category {
        InterviewType::Hr => &HR_BANK,
        InterviewType::Technical => &TECHNICAL_BANK,
        InterviewType::Behavioral => &BEHAVIORAL_BANK,
    };

    entries
        .iter()
        .map(|entry| PracticeQuestion {
            id: Uuid::new_v4(),
            category,
            question: entry.question.to_string(),
            ideal_answer: entry.ideal_answer.to_string(),
            key_points: entry.key_points.iter().map(|s| s.to_string()).collect(),
            common_mistakes: entry.common_mistakes.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_wraps_around_the_list() {
        assert_eq!(fallback_question(InterviewType::Hr, 1), "Tell me about yourself.");
        assert_eq!(
            fallback_question(InterviewType::Technical, 5),
            "Explain one technology you are confident in."
        );
        assert_eq!(
            fallback_question(InterviewType::Behavioral, 6),
            fallback_question(InterviewType::Behavioral, 1)
        );
    }

    #[test]
    fn fallback_is_stable_for_the_same_inputs() {
        for number in 1..=5 {
            assert_eq!(
                fallback_question(InterviewType::Technical, number),
                fallback_question(InterviewType::Technical, number)
            );
        }
    }

    #[test]
    fn practice_bank_has_seven_entries_per_category() {
        for category in [InterviewType::Hr, InterviewType::Technical, InterviewType::Behavioral] {
            let bank = practice_bank(category);
            assert_eq!(bank.len(), 7);
            assert!(bank.iter().all(|q| q.category == category && !q.key_points.is_empty()));
        }
    }
}
