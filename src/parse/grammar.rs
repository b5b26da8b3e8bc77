use winnow::ascii::{dec_int, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Condition, LogicAction, LogicOperator, Question, QuestionId, RuleDraft, RuleId};

use super::parser::ParsedLogic;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

fn question_ref(input: &mut &str) -> ModalResult<QuestionId> {
    ws.parse_next(input)?;
    cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "question id",
        )))
        .map(QuestionId::from)
        .parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

/// Bare numbers are kept as written; answers are compared as text.
fn number_literal<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    alt((string_literal, number_literal.map(str::to_owned)))
        .context(StrContext::Expected(StrContextValue::Description("value")))
        .parse_next(input)
}

// -- Operators & actions ----------------------------------------------------

fn operator(input: &mut &str) -> ModalResult<LogicOperator> {
    ws.parse_next(input)?;
    alt((
        "==".value(LogicOperator::Equals),
        "!=".value(LogicOperator::NotEquals),
        ">=".value(LogicOperator::GreaterOrEqual),
        ">".value(LogicOperator::GreaterThan),
        "<=".value(LogicOperator::LessOrEqual),
        "<".value(LogicOperator::LessThan),
        "contains".value(LogicOperator::Contains),
        ("not", ws, "contains").value(LogicOperator::NotContains),
        ("is", ws, "answered").value(LogicOperator::IsAnswered),
        ("is", ws, "empty").value(LogicOperator::IsEmpty),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "operator",
    )))
    .parse_next(input)
}

fn condition(input: &mut &str) -> ModalResult<Condition> {
    let source = question_ref.parse_next(input)?;
    let op = cut_err(operator).parse_next(input)?;
    let literal = if op.requires_value() {
        cut_err(value).parse_next(input)?
    } else {
        String::new()
    };
    Ok(Condition::new(source, op, literal))
}

fn action(input: &mut &str) -> ModalResult<LogicAction> {
    ws.parse_next(input)?;
    alt((
        "show".value(LogicAction::Show),
        "hide".value(LogicAction::Hide),
        "end".value(LogicAction::End),
        preceded(("skip", ws, "to"), question_ref).map(LogicAction::SkipTo),
    ))
    .context(StrContext::Expected(StrContextValue::Description("action")))
    .parse_next(input)
}

// -- Declarations -----------------------------------------------------------

enum Declaration {
    Question { id: QuestionId, required: bool },
    Rule(RuleDraft),
}

fn question_decl(input: &mut &str) -> ModalResult<Declaration> {
    ws.parse_next(input)?;
    "question".parse_next(input)?;
    let id = question_ref.parse_next(input)?;
    let required = opt((ws, '(', ws, cut_err("required"), ws, cut_err(')')))
        .parse_next(input)?
        .is_some();
    Ok(Declaration::Question { id, required })
}

fn priority_annotation(input: &mut &str) -> ModalResult<u32> {
    let n: i64 = delimited(
        (ws, '(', ws, "priority", ws),
        cut_err(dec_int::<_, i64, _>),
        (ws, cut_err(')')),
    )
    .parse_next(input)?;
    u32::try_from(n).map_err(|_| ErrMode::from_input(input).cut())
}

fn rule_decl(input: &mut &str) -> ModalResult<Declaration> {
    ws.parse_next(input)?;
    "rule".parse_next(input)?;
    ws.parse_next(input)?;

    let id = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule id",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    cut_err("on").parse_next(input)?;
    let owner = question_ref.parse_next(input)?;

    let priority = opt(priority_annotation).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;
    ws.parse_next(input)?;
    cut_err("when").parse_next(input)?;

    let condition = cut_err(condition)
        .context(StrContext::Expected(StrContextValue::Description(
            "condition",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    cut_err("then").parse_next(input)?;
    let action = cut_err(action).parse_next(input)?;

    Ok(Declaration::Rule(RuleDraft {
        id: Some(RuleId::from(id)),
        owner,
        condition,
        action,
        priority,
    }))
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_logic(input: &mut &str) -> ModalResult<ParsedLogic> {
    let mut questions = Vec::new();
    let mut rules = Vec::new();

    let decls: Vec<Declaration> = repeat(0.., alt((question_decl, rule_decl))).parse_next(input)?;
    for decl in decls {
        match decl {
            Declaration::Question { id, required } => {
                let order = i32::try_from(questions.len()).unwrap_or(i32::MAX);
                let question = Question::new(id, order);
                questions.push(if required { question.required() } else { question });
            }
            Declaration::Rule(draft) => rules.push(draft),
        }
    }

    ws.parse_next(input)?;

    Ok(ParsedLogic { questions, rules })
}
