use branchwise::parse::parse;
use branchwise::{
    answer, Answers, BranchwiseError, LogicAction, LogicOperator, SurveyLogic, ValidationError,
};

const SAMPLE: &str = include_str!("../surveys/customer_feedback.logic");

#[test]
fn sample_survey_parses() {
    let parsed = parse(SAMPLE).unwrap();
    assert_eq!(parsed.questions.len(), 7);
    assert_eq!(parsed.rules.len(), 7);
    assert!(parsed.questions[0].is_required);
    assert_eq!(parsed.questions[6].id, "comments");
}

#[test]
fn sample_survey_compiles_and_evaluates() {
    let logic = SurveyLogic::from_dsl(SAMPLE).unwrap();
    assert_eq!(logic.questions().len(), 7);

    let result = logic.evaluate(&Answers::new().set("visited", "false"), None);
    assert!(result.is_hidden("visit_count"));
    assert_eq!(result.next_question_id().unwrap(), "satisfaction");

    let result = logic.evaluate(
        &Answers::new().set("visited", "true").set("satisfaction", "1"),
        None,
    );
    assert!(result.is_visible("complaint"));
    assert_eq!(result.next_question_id().unwrap(), "complaint");

    let result = logic.evaluate(
        &Answers::new().set("visited", "true").set("satisfaction", "5"),
        None,
    );
    assert!(result.is_hidden("complaint"));
    assert_eq!(result.next_question_id().unwrap(), "recommend");

    let result = logic.evaluate(&Answers::new().set("visit_count", "30"), None);
    assert_eq!(result.next_question_id().unwrap(), "comments");

    let result = logic.evaluate(&Answers::new().set("visited", "never-again"), None);
    assert!(result.should_end_survey());
}

#[test]
fn explicit_priorities_kept_and_auto_priorities_follow() {
    let logic = SurveyLogic::from_dsl(SAMPLE).unwrap();
    let referral: Vec<(&str, u32)> = logic
        .rules_for("referral_email")
        .into_iter()
        .map(|r| (r.id.as_str(), r.priority))
        .collect();
    assert_eq!(referral, vec![("detractors", 5), ("promoters", 6)]);
}

#[test]
fn dsl_round_trip() {
    let logic = SurveyLogic::from_dsl(SAMPLE).unwrap();
    let again = SurveyLogic::from_dsl(&logic.to_dsl()).unwrap();
    assert_eq!(again.questions(), logic.questions());
    assert_eq!(again.rules(), logic.rules());
}

#[test]
fn builder_and_dsl_agree() {
    let from_dsl = SurveyLogic::from_dsl(
        "question q1\nquestion q2\nquestion q3\n\
         rule r1 on q3: when q1 == \"2\" then hide\n\
         rule r2 on q2 (priority 4): when q1 is answered then skip to q3\n",
    )
    .unwrap();
    let built = branchwise::LogicBuilder::new()
        .question("q1")
        .question("q2")
        .question("q3")
        .rule("r1", |r| r.on("q3").when(answer("q1").equals("2")).hide())
        .rule("r2", |r| r.on("q2").when(answer("q1").is_answered()).skip_to("q3").priority(4))
        .compile()
        .unwrap();
    assert_eq!(from_dsl.rules(), built.rules());
}

#[test]
fn skip_target_parses() {
    let parsed = parse("rule r on b: when a not contains \"x, y\" then skip to c").unwrap();
    let rule = &parsed.rules[0];
    assert_eq!(rule.condition.operator, LogicOperator::NotContains);
    assert_eq!(rule.condition.value, "x, y");
    assert_eq!(rule.action, LogicAction::SkipTo("c".into()));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_then_is_an_error() {
    assert!(parse("rule r on b: when a is answered hide").is_err());
}

#[test]
fn unknown_operator_is_an_error() {
    let err = parse("rule r on b: when a ~= \"x\" then hide").unwrap_err();
    assert!(err.to_string().starts_with("parse error at line 1"));
}

#[test]
fn broken_rule_reports_its_line() {
    let source = "question a\nquestion b\n\n# hides b\nrule r on b: when a is answered hide\n";
    let err = parse(source).unwrap_err();
    assert_eq!(err.line(), 5);
    assert!(err.column() > 1);
    assert_eq!(&source[err.offset()..err.offset() + 4], "hide");
}

#[test]
fn trailing_garbage_reports_its_line() {
    let err = parse("question a\nquestion b\nnonsense").unwrap_err();
    assert_eq!((err.line(), err.column()), (3, 1));
}

#[test]
fn missing_value_is_an_error() {
    assert!(parse("rule r on b: when a == then hide").is_err());
}

#[test]
fn unterminated_string_is_an_error() {
    assert!(parse("rule r on b: when a == \"open then hide").is_err());
}

#[test]
fn negative_priority_is_an_error() {
    assert!(parse("rule r on b (priority -1): when a is answered then hide").is_err());
}

#[test]
fn trailing_garbage_is_an_error() {
    assert!(parse("question a\nquestion b\nnonsense").is_err());
}

#[test]
fn parses_but_fails_validation() {
    let source = "question a\nquestion b\nrule r on b: when ghost is answered then hide";
    let err = SurveyLogic::from_dsl(source).unwrap_err();
    match err {
        BranchwiseError::Rejected(rejected) => {
            assert!(matches!(rejected.errors()[0], ValidationError::UnknownQuestion { .. }));
        }
        other => panic!("expected rejection, got {other}"),
    }
}

#[test]
fn parse_error_surfaces_through_crate_error() {
    let err = SurveyLogic::from_dsl("question a\nquestion").unwrap_err();
    match err {
        BranchwiseError::Parse(parse_error) => assert_eq!(parse_error.line(), 2),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn empty_input_is_an_empty_survey() {
    let logic = SurveyLogic::from_dsl("  # nothing here\n").unwrap();
    assert!(logic.questions().is_empty());
    assert!(logic.rules().is_empty());
}
