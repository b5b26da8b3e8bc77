use std::collections::{HashMap, HashSet};

use crate::{Answers, EvaluationResult, LogicAction, LogicOperator, QuestionId, Rule};

/// Compute visibility and navigation for one set of answers.
///
/// Rules are sorted once by `(priority, id)`. Only rules whose source question
/// has an answer entry take part; rules pointing at unknown questions never
/// match. The first matching show/hide rule decides each owner, and questions
/// without a match stay visible.
///
/// A matching `End` anywhere ends the survey. Otherwise the first matching
/// `SkipTo` picks the next question, falling back to the next visible question
/// after `current` (or after the last answered question when `current` is not
/// given or unknown).
pub fn resolve(
    rules: &[Rule],
    answers: &Answers,
    questions: &[QuestionId],
    current: Option<&QuestionId>,
) -> EvaluationResult {
    let known: HashSet<&str> = questions.iter().map(QuestionId::as_str).collect();

    let mut ordered: Vec<&Rule> = rules.iter().filter(|r| is_applicable(r, &known)).collect();
    ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let matching: Vec<&Rule> = ordered
        .into_iter()
        .filter(|r| {
            answers
                .get(r.source().as_str())
                .is_some_and(|answer| r.condition.matches(Some(answer)))
        })
        .collect();

    let mut decided: HashMap<&str, bool> = HashMap::new();
    for rule in matching.iter().filter(|r| !r.action.is_navigation()) {
        decided
            .entry(rule.owner.as_str())
            .or_insert(rule.action == LogicAction::Show);
    }

    let (visible, hidden): (Vec<QuestionId>, Vec<QuestionId>) = questions
        .iter()
        .cloned()
        .partition(|q| decided.get(q.as_str()).copied().unwrap_or(true));

    let end = matching.iter().find(|r| r.action == LogicAction::End);
    if let Some(rule) = end {
        tracing::debug!(rule = %rule.id, hidden = hidden.len(), "survey ends");
        return EvaluationResult::new(visible, hidden, None, true);
    }

    let skip = matching.iter().find_map(|r| r.action.target().map(|t| (&r.id, t)));
    let next = match skip {
        Some((rule, target)) => {
            tracing::debug!(%rule, %target, "skip rule matched");
            Some(target.clone())
        }
        None => next_visible(questions, &decided, answers, current),
    };

    tracing::debug!(
        visible = visible.len(),
        hidden = hidden.len(),
        next = next.as_ref().map(QuestionId::as_str),
        "resolved survey logic"
    );
    EvaluationResult::new(visible, hidden, next, false)
}

/// Dangling or malformed rules are dropped rather than failing evaluation.
fn is_applicable(rule: &Rule, known: &HashSet<&str>) -> bool {
    let target_known = rule.action.target().map_or(true, |t| known.contains(t.as_str()));
    rule.condition.operator != LogicOperator::Unsupported
        && rule.owner != *rule.source()
        && known.contains(rule.owner.as_str())
        && known.contains(rule.source().as_str())
        && target_known
}

fn next_visible(
    questions: &[QuestionId],
    decided: &HashMap<&str, bool>,
    answers: &Answers,
    current: Option<&QuestionId>,
) -> Option<QuestionId> {
    let position = current
        .and_then(|c| questions.iter().position(|q| q == c))
        .or_else(|| questions.iter().rposition(|q| answers.contains(q.as_str())));
    let start = position.map_or(0, |p| p + 1);
    questions
        .iter()
        .skip(start)
        .find(|q| decided.get(q.as_str()).copied().unwrap_or(true))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer;

    fn qs(ids: &[&str]) -> Vec<QuestionId> {
        ids.iter().map(|s| QuestionId::from(*s)).collect()
    }

    fn ids(list: &[QuestionId]) -> Vec<&str> {
        list.iter().map(QuestionId::as_str).collect()
    }

    #[test]
    fn empty_rules_follow_question_order() {
        let questions = qs(&["a", "b", "c"]);
        let result = resolve(&[], &Answers::new().set("a", "1"), &questions, None);
        assert_eq!(ids(result.visible_question_ids()), vec!["a", "b", "c"]);
        assert!(result.hidden_question_ids().is_empty());
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("b"));
        assert!(!result.should_end_survey());
    }

    #[test]
    fn nothing_answered_starts_at_first_question() {
        let result = resolve(&[], &Answers::new(), &qs(&["a", "b"]), None);
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("a"));
    }

    #[test]
    fn last_question_has_no_next() {
        let result = resolve(&[], &Answers::new().set("b", "x"), &qs(&["a", "b"]), None);
        assert_eq!(result.next_question_id(), None);
        assert!(!result.should_end_survey());
    }

    #[test]
    fn lower_priority_number_wins() {
        let rules = vec![
            Rule::new("r1", "c", answer("a").equals("1"), LogicAction::Hide, 1),
            Rule::new("r2", "c", answer("a").equals("1"), LogicAction::Show, 2),
        ];
        let result = resolve(&rules, &Answers::new().set("a", "1"), &qs(&["a", "b", "c"]), None);
        assert!(result.is_hidden("c"));
    }

    #[test]
    fn equal_priority_breaks_ties_by_id() {
        let rules = vec![
            Rule::new("r2", "c", answer("a").equals("1"), LogicAction::Hide, 0),
            Rule::new("r1", "c", answer("b").equals("1"), LogicAction::Show, 0),
        ];
        let answers = Answers::new().set("a", "1").set("b", "1");
        let result = resolve(&rules, &answers, &qs(&["a", "b", "c"]), None);
        assert!(result.is_visible("c"));
    }

    #[test]
    fn unanswered_source_is_skipped() {
        // IsEmpty would match an absent answer, but the rule never runs.
        let rules = vec![Rule::new("r1", "c", answer("b").is_empty(), LogicAction::Hide, 0)];
        let result = resolve(&rules, &Answers::new().set("a", "1"), &qs(&["a", "b", "c"]), None);
        assert!(result.is_visible("c"));

        let result = resolve(&rules, &Answers::new().set("b", ""), &qs(&["a", "b", "c"]), None);
        assert!(result.is_hidden("c"));
    }

    #[test]
    fn navigation_skips_hidden_questions() {
        let rules = vec![Rule::new("r1", "b", answer("a").equals("true"), LogicAction::Hide, 0)];
        let result = resolve(&rules, &Answers::new().set("a", "true"), &qs(&["a", "b", "c"]), None);
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("c"));
    }

    #[test]
    fn end_short_circuits_skip() {
        let rules = vec![
            Rule::new("skip", "a", answer("a2").is_answered(), LogicAction::SkipTo("c".into()), 0),
            Rule::new("stop", "b", answer("a2").is_answered(), LogicAction::End, 5),
        ];
        let answers = Answers::new().set("a2", "x");
        let result = resolve(&rules, &answers, &qs(&["a", "a2", "b", "c"]), None);
        assert!(result.should_end_survey());
        assert_eq!(result.next_question_id(), None);
    }

    #[test]
    fn skip_to_sets_next() {
        let rules = vec![
            Rule::new("s2", "b", answer("a").equals("1"), LogicAction::SkipTo("d".into()), 1),
            Rule::new("s1", "b", answer("a").equals("1"), LogicAction::SkipTo("c".into()), 0),
        ];
        let answers = Answers::new().set("a", "1");
        let result = resolve(&rules, &answers, &qs(&["a", "b", "c", "d"]), None);
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("c"));
    }

    #[test]
    fn navigation_does_not_change_visibility() {
        let skip = LogicAction::SkipTo("c".into());
        let rules = vec![Rule::new("s", "b", answer("a").equals("1"), skip, 0)];
        let result = resolve(&rules, &Answers::new().set("a", "1"), &qs(&["a", "b", "c"]), None);
        assert!(result.hidden_question_ids().is_empty());
    }

    #[test]
    fn dangling_rules_never_match() {
        let rules = vec![
            Rule::new("r1", "b", answer("gone").is_answered(), LogicAction::Hide, 0),
            Rule::new("r2", "b", answer("a").is_answered(), LogicAction::SkipTo("gone".into()), 0),
            Rule::new("r3", "a", answer("a").is_answered(), LogicAction::End, 0),
        ];
        let answers = Answers::new().set("a", "1").set("gone", "1");
        let result = resolve(&rules, &answers, &qs(&["a", "b"]), None);
        assert!(result.is_visible("b"));
        assert!(!result.should_end_survey());
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("b"));
    }

    #[test]
    fn explicit_current_question() {
        let questions = qs(&["a", "b", "c", "d"]);
        let answers = Answers::new().set("a", "1").set("c", "1");
        let b = QuestionId::from("b");
        let result = resolve(&[], &answers, &questions, Some(&b));
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("c"));

        let result = resolve(&[], &answers, &questions, None);
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("d"));

        let unknown = QuestionId::from("zzz");
        let result = resolve(&[], &answers, &questions, Some(&unknown));
        assert_eq!(result.next_question_id().map(QuestionId::as_str), Some("d"));
    }

    #[test]
    fn show_rule_keeps_visible() {
        let rules = vec![
            Rule::new("r1", "c", answer("a").equals("yes"), LogicAction::Show, 0),
            Rule::new("r2", "c", answer("a").is_answered(), LogicAction::Hide, 1),
        ];
        let questions = qs(&["a", "b", "c"]);
        let shown = resolve(&rules, &Answers::new().set("a", "yes"), &questions, None);
        assert!(shown.is_visible("c"));
        let hidden = resolve(&rules, &Answers::new().set("a", "no"), &questions, None);
        assert!(hidden.is_hidden("c"));
    }
}
