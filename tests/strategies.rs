use branchwise::{
    Answers, Condition, LogicAction, LogicOperator, Question, QuestionId, Rule, SurveyLogic,
};
use proptest::prelude::*;

// --- Fixed answer vocabulary ---
// Values are drawn from a small pool so conditions actually match: choice
// indices, booleans, a multi-select list, free text, and the empty string.

pub const VALUES: &[&str] = &["0", "1", "2", "10", "2.5", "yes", "no", "1,2", "a, b", "", "  "];

const OPERATORS: &[LogicOperator] = &[
    LogicOperator::Equals,
    LogicOperator::NotEquals,
    LogicOperator::Contains,
    LogicOperator::NotContains,
    LogicOperator::GreaterThan,
    LogicOperator::LessThan,
    LogicOperator::GreaterOrEqual,
    LogicOperator::LessOrEqual,
    LogicOperator::IsAnswered,
    LogicOperator::IsEmpty,
    LogicOperator::Unsupported,
];

/// A generated survey: questions `q0..qN` plus rules that may reference any
/// of them, including self references.
#[derive(Debug, Clone)]
pub struct GenSurvey {
    pub questions: Vec<QuestionId>,
    pub rules: Vec<Rule>,
}

impl GenSurvey {
    pub fn logic(&self) -> SurveyLogic {
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| Question::new(q.clone(), i as i32))
            .collect();
        SurveyLogic::unchecked(questions, self.rules.clone())
    }

    pub fn with_rules(&self, rules: Vec<Rule>) -> Self {
        Self {
            questions: self.questions.clone(),
            rules,
        }
    }
}

fn question(i: usize) -> QuestionId {
    QuestionId::from(format!("q{i}"))
}

fn arb_action(n: usize) -> impl Strategy<Value = LogicAction> {
    prop_oneof![
        3 => Just(LogicAction::Show),
        3 => Just(LogicAction::Hide),
        1 => (0..n).prop_map(|t| LogicAction::SkipTo(question(t))),
        1 => Just(LogicAction::End),
    ]
}

type GenRule = (usize, usize, LogicOperator, &'static str, LogicAction, u32);

fn arb_rule(n: usize) -> impl Strategy<Value = GenRule> {
    (
        0..n,
        0..n,
        prop::sample::select(OPERATORS),
        prop::sample::select(VALUES),
        arb_action(n),
        0_u32..4,
    )
}

/// Generate a survey of 2 to 8 questions with up to 12 rules. Rule ids are
/// unique; everything else is unconstrained.
pub fn arb_survey() -> impl Strategy<Value = GenSurvey> {
    (2_usize..=8).prop_flat_map(|n| {
        prop::collection::vec(arb_rule(n), 0..12).prop_map(move |specs| {
            let rules = specs
                .into_iter()
                .enumerate()
                .map(|(i, (owner, source, operator, value, action, priority))| {
                    Rule::new(
                        format!("r{i}"),
                        question(owner),
                        Condition::new(question(source), operator, value),
                        action,
                        priority,
                    )
                })
                .collect();
            GenSurvey {
                questions: (0..n).map(question).collect(),
                rules,
            }
        })
    })
}

/// Generate answers for a subset of `q0..q7`. Questions outside the survey
/// are harmless.
pub fn arb_answers() -> impl Strategy<Value = Answers> {
    prop::collection::btree_map(0_usize..8, prop::sample::select(VALUES), 0..8).prop_map(|entries| {
        let mut answers = Answers::new();
        for (q, value) in entries {
            answers.insert(question(q), value.to_owned());
        }
        answers
    })
}

/// Any answer a respondent could submit, including absent.
pub fn arb_raw_answer() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        prop::sample::select(VALUES).prop_map(|v| Some(v.to_owned())),
        "[ a-z0-9,.\\-]{0,12}".prop_map(Some),
    ]
}
