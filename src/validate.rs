use std::collections::{HashMap, HashSet};

use crate::types::graph::edge_label;
use crate::{
    EdgeKind, LogicEdge, LogicGraph, LogicNode, LogicOperator, QuestionId, QuestionRole,
    RejectedRules, Rule, RuleId, ValidationError, ValidationWarning,
};

/// Outcome of validating a rule set: the logic map plus every error and
/// warning found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    graph: LogicGraph,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn graph(&self) -> &LogicGraph {
        &self.graph
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn into_graph(self) -> LogicGraph {
        self.graph
    }

    /// Warnings if the rule set is acceptable, otherwise every error.
    ///
    /// # Errors
    ///
    /// Returns [`RejectedRules`] when at least one error was found.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, RejectedRules> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(RejectedRules::new(self.errors))
        }
    }
}

/// Validate `rules` against the survey's questions and build the logic map.
///
/// Errors block persistence; visibility cycles are only warnings.
#[must_use]
pub fn validate(rules: &[Rule], questions: &[QuestionId]) -> ValidationReport {
    let mut errors = Vec::new();
    let known = check_questions(questions, &mut errors);

    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    check_duplicate_ids(&ordered, &mut errors);
    for rule in &ordered {
        check_rule(rule, &known, &mut errors);
    }
    check_duplicate_priorities(&ordered, &mut errors);

    let graph = build_graph(&ordered, questions, &known);
    let warnings = find_cycles(&ordered, questions, &known)
        .into_iter()
        .map(|path| ValidationWarning::VisibilityCycle { path })
        .collect::<Vec<_>>();

    tracing::debug!(
        rules = rules.len(),
        questions = questions.len(),
        errors = errors.len(),
        warnings = warnings.len(),
        "validated survey logic"
    );

    ValidationReport {
        graph,
        errors,
        warnings,
    }
}

fn check_questions<'a>(
    questions: &'a [QuestionId],
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut known = HashSet::new();
    for question in questions {
        if !known.insert(question.as_str()) {
            errors.push(ValidationError::DuplicateQuestion {
                question: question.clone(),
            });
        }
    }
    known
}

fn check_duplicate_ids(rules: &[&Rule], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for rule in rules {
        if !seen.insert(&rule.id) && reported.insert(&rule.id) {
            errors.push(ValidationError::DuplicateRule { rule: rule.id.clone() });
        }
    }
}

fn check_rule(rule: &Rule, known: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    let operator = rule.condition.operator;
    if operator == LogicOperator::Unsupported {
        errors.push(ValidationError::UnsupportedOperator { rule: rule.id.clone() });
    } else if operator.requires_value() && rule.condition.value.trim().is_empty() {
        errors.push(ValidationError::MissingConditionValue {
            rule: rule.id.clone(),
            operator,
        });
    }

    if rule.owner == *rule.source() {
        errors.push(ValidationError::SelfReference {
            rule: rule.id.clone(),
            question: rule.owner.clone(),
        });
    }

    let mut refs = vec![(QuestionRole::Owner, &rule.owner), (QuestionRole::Source, rule.source())];
    if let Some(target) = rule.action.target() {
        refs.push((QuestionRole::Target, target));
    }
    for (role, question) in refs {
        if !known.contains(question.as_str()) {
            errors.push(ValidationError::UnknownQuestion {
                rule: rule.id.clone(),
                role,
                question: question.clone(),
            });
        }
    }
}

fn check_duplicate_priorities(rules: &[&Rule], errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<(&QuestionId, &QuestionId, u32), &RuleId> = HashMap::new();
    for rule in rules {
        let key = (&rule.owner, rule.source(), rule.priority);
        match seen.get(&key) {
            Some(first) if **first != rule.id => errors.push(ValidationError::DuplicatePriority {
                first: (*first).clone(),
                second: rule.id.clone(),
                owner: rule.owner.clone(),
                source_question: rule.source().clone(),
                priority: rule.priority,
            }),
            Some(_) => {}
            None => {
                seen.insert(key, &rule.id);
            }
        }
    }
}

fn build_graph(rules: &[&Rule], questions: &[QuestionId], known: &HashSet<&str>) -> LogicGraph {
    let owners: HashSet<&str> = rules.iter().map(|r| r.owner.as_str()).collect();
    let sources: HashSet<&str> = rules.iter().map(|r| r.source().as_str()).collect();

    let mut placed = HashSet::new();
    let nodes = questions
        .iter()
        .filter(|q| placed.insert(q.as_str()))
        .enumerate()
        .map(|(order, q)| LogicNode {
            id: q.clone(),
            order,
            has_logic: owners.contains(q.as_str()),
            is_conditional: sources.contains(q.as_str()),
        })
        .collect();

    let linkable = |from: &QuestionId, to: &QuestionId| {
        from != to && known.contains(from.as_str()) && known.contains(to.as_str())
    };

    let mut edges = Vec::new();
    for rule in rules {
        let condition = &rule.condition;
        let action = rule.action.kind();
        let label = edge_label(condition.operator, &condition.value, action);
        if linkable(rule.source(), &rule.owner) {
            edges.push(LogicEdge {
                rule_id: rule.id.clone(),
                from: rule.source().clone(),
                to: rule.owner.clone(),
                kind: EdgeKind::Condition,
                operator: condition.operator,
                condition_value: condition.value.clone(),
                action,
                label: label.clone(),
            });
        }
        if let Some(target) = rule.action.target() {
            if linkable(&rule.owner, target) {
                edges.push(LogicEdge {
                    rule_id: rule.id.clone(),
                    from: rule.owner.clone(),
                    to: target.clone(),
                    kind: EdgeKind::Jump,
                    operator: condition.operator,
                    condition_value: condition.value.clone(),
                    action,
                    label,
                });
            }
        }
    }

    LogicGraph { nodes, edges }
}

/// Every elementary cycle in the show/hide dependency graph
/// (`source -> owner`), each starting at its smallest id and closed by
/// repeating it.
fn find_cycles(
    rules: &[&Rule],
    questions: &[QuestionId],
    known: &HashSet<&str>,
) -> Vec<Vec<QuestionId>> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in rules {
        if rule.action.is_navigation() {
            continue;
        }
        let (from, to) = (rule.source().as_str(), rule.owner.as_str());
        if from != to && known.contains(from) && known.contains(to) {
            let next = adj.entry(from).or_default();
            if !next.contains(&to) {
                next.push(to);
            }
        }
    }

    let mut roots: Vec<&str> = questions.iter().map(QuestionId::as_str).collect();
    roots.sort_unstable();
    roots.dedup();

    let mut cycles = Vec::new();
    let mut seen: HashSet<Vec<QuestionId>> = HashSet::new();
    for root in roots {
        // Only nodes above the root, so each cycle is found from its smallest id.
        let mut path = vec![root];
        let mut on_path = HashSet::from([root]);
        walk(root, root, &adj, &mut path, &mut on_path, &mut |cycle: &[&str]| {
            let canonical: Vec<QuestionId> =
                canonical_rotation(cycle).into_iter().map(QuestionId::from).collect();
            if let Some(first) = canonical.first().cloned() {
                if seen.insert(canonical.clone()) {
                    let mut closed = canonical;
                    closed.push(first);
                    cycles.push(closed);
                }
            }
        });
    }
    cycles
}

fn walk<'a>(
    root: &'a str,
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    on_path: &mut HashSet<&'a str>,
    on_cycle: &mut dyn FnMut(&[&'a str]),
) {
    let Some(neighbors) = adj.get(node) else {
        return;
    };
    for &neighbor in neighbors {
        if neighbor == root {
            on_cycle(path);
        } else if neighbor > root && on_path.insert(neighbor) {
            path.push(neighbor);
            walk(root, neighbor, adj, path, on_path, on_cycle);
            path.pop();
            on_path.remove(neighbor);
        }
    }
}

/// Rotate so the smallest id comes first.
fn canonical_rotation<'a>(cycle: &[&'a str]) -> Vec<&'a str> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, q)| **q)
        .map_or(0, |(i, _)| i);
    cycle[start..].iter().chain(&cycle[..start]).copied().collect()
}
