mod strategies;

use std::collections::HashSet;

use branchwise::{resolve, validate, LogicAction, QuestionId, ValidationError};
use proptest::prelude::*;
use strategies::{arb_answers, arb_survey};

fn is_subsequence(sub: &[QuestionId], of: &[QuestionId]) -> bool {
    let mut rest = of.iter();
    sub.iter().all(|q| rest.any(|o| o == q))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // -----------------------------------------------------------------------
    // Invariant 1: Determinism
    // Evaluating the same snapshot and answers twice yields identical results.
    // -----------------------------------------------------------------------
    #[test]
    fn evaluation_is_deterministic(survey in arb_survey(), answers in arb_answers()) {
        let logic = survey.logic();
        let first = logic.evaluate(&answers, None);
        let second = logic.evaluate(&answers, None);
        prop_assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // Invariant 2: Visible and hidden partition the survey
    // Every question lands in exactly one list, each list in survey order.
    // -----------------------------------------------------------------------
    #[test]
    fn visible_and_hidden_partition_questions(survey in arb_survey(), answers in arb_answers()) {
        let result = survey.logic().evaluate(&answers, None);
        let visible = result.visible_question_ids();
        let hidden = result.hidden_question_ids();

        prop_assert_eq!(visible.len() + hidden.len(), survey.questions.len());
        let vis: HashSet<&QuestionId> = visible.iter().collect();
        prop_assert!(hidden.iter().all(|q| !vis.contains(q)));
        prop_assert!(is_subsequence(visible, &survey.questions));
        prop_assert!(is_subsequence(hidden, &survey.questions));
    }

    // -----------------------------------------------------------------------
    // Invariant 3: Ending the survey clears navigation
    // -----------------------------------------------------------------------
    #[test]
    fn end_implies_no_next(survey in arb_survey(), answers in arb_answers()) {
        let result = survey.logic().evaluate(&answers, None);
        if result.should_end_survey() {
            prop_assert!(result.next_question_id().is_none());
        }
    }

    // -----------------------------------------------------------------------
    // Invariant 4: Rule storage order is irrelevant
    // Only (priority, id) decides precedence.
    // -----------------------------------------------------------------------
    #[test]
    fn rule_order_does_not_matter(
        (survey, shuffled) in arb_survey().prop_flat_map(|s| {
            let rules = s.rules.clone();
            (Just(s), Just(rules).prop_shuffle())
        }),
        answers in arb_answers(),
    ) {
        let original = survey.logic().evaluate(&answers, None);
        let reordered = survey.with_rules(shuffled).logic().evaluate(&answers, None);
        prop_assert_eq!(original, reordered);
    }

    // -----------------------------------------------------------------------
    // Invariant 5: No rules means linear flow
    // -----------------------------------------------------------------------
    #[test]
    fn no_rules_everything_visible(survey in arb_survey(), answers in arb_answers()) {
        let plain = survey.with_rules(Vec::new());
        let result = resolve(&[], &answers, &plain.questions, None);
        prop_assert_eq!(result.visible_question_ids(), plain.questions.as_slice());
        prop_assert!(result.hidden_question_ids().is_empty());
        prop_assert!(!result.should_end_survey());
    }

    // -----------------------------------------------------------------------
    // Invariant 6: Hidden questions are explained
    // A hidden question owns a Hide rule whose source is answered and matches.
    // -----------------------------------------------------------------------
    #[test]
    fn hidden_has_matching_hide_rule(survey in arb_survey(), answers in arb_answers()) {
        let result = survey.logic().evaluate(&answers, None);
        for q in result.hidden_question_ids() {
            let explained = survey.rules.iter().any(|r| {
                r.owner == *q
                    && r.action == LogicAction::Hide
                    && r.source() != q
                    && answers
                        .get(r.source().as_str())
                        .is_some_and(|a| r.condition.matches(Some(a)))
            });
            prop_assert!(explained, "{} hidden without a matching hide rule", q);
        }
    }

    // -----------------------------------------------------------------------
    // Invariant 7: Without navigation rules, next is the following visible question
    // -----------------------------------------------------------------------
    #[test]
    fn next_is_later_visible_question(survey in arb_survey(), answers in arb_answers()) {
        let rules = survey.rules.iter().filter(|r| !r.action.is_navigation()).cloned().collect();
        let survey = survey.with_rules(rules);
        let result = survey.logic().evaluate(&answers, None);

        prop_assert!(!result.should_end_survey());
        let last_answered = survey.questions.iter().rposition(|q| answers.contains(q.as_str()));
        match result.next_question_id() {
            Some(next) => {
                prop_assert!(result.is_visible(next.as_str()));
                let pos = survey.questions.iter().position(|q| q == next).unwrap();
                prop_assert!(last_answered.map_or(true, |l| pos > l));
            }
            None => {
                let start = last_answered.map_or(0, |l| l + 1);
                let rest = &survey.questions[start..];
                prop_assert!(rest.iter().all(|q| result.is_hidden(q.as_str())));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Invariant 8: The logic graph only connects known, distinct questions
    // -----------------------------------------------------------------------
    #[test]
    fn graph_edges_are_well_formed(survey in arb_survey()) {
        let report = validate(&survey.rules, &survey.questions);
        let graph = report.graph();
        prop_assert_eq!(graph.nodes.len(), survey.questions.len());
        for edge in &graph.edges {
            prop_assert!(edge.from != edge.to);
            prop_assert!(graph.node(edge.from.as_str()).is_some());
            prop_assert!(graph.node(edge.to.as_str()).is_some());
        }
    }

    // -----------------------------------------------------------------------
    // Invariant 9: Self references are always reported
    // -----------------------------------------------------------------------
    #[test]
    fn self_references_rejected(survey in arb_survey()) {
        let report = validate(&survey.rules, &survey.questions);
        for rule in survey.rules.iter().filter(|r| r.owner == *r.source()) {
            let reported = report.errors().iter().any(|e| {
                matches!(e, ValidationError::SelfReference { rule: id, .. } if *id == rule.id)
            });
            prop_assert!(reported, "self reference in {} not reported", rule.id);
        }
        if report.errors().is_empty() {
            prop_assert!(report.is_valid());
        }
    }
}
