//! Splitting unparsed effect statements into behavior/policy display pairs.

use serde::{Deserialize, Serialize};

const POLICY_SEP: &str = " policy: ";
const NOTABILITY_SEP: &str = " notability: ";
const WORLD_ASSEMBLY_SUFFIX: &str = " the World Assembly";
const LEADS_TO_PREFIX: &str = "leads to ";

/// One side effect, e.g. behavior "abolishes", policy "Ministry of Love".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub behavior: String,
    pub policy: String,
}

impl Annotation {
    fn new(behavior: &str, policy: &str) -> Self {
        Self {
            behavior: behavior.to_string(),
            policy: policy.to_string(),
        }
    }
}

/// Annotations sharing one display row. Behaviors are unique within a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationRow(Vec<Annotation>);

impl AnnotationRow {
    pub fn get(&self, behavior: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.behavior == behavior)
            .map(|a| a.policy.as_str())
    }

    pub fn has(&self, behavior: &str) -> bool {
        self.get(behavior).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split one statement into a behavior/policy pair. Empty statements yield `None`.
pub fn split_statement(statement: &str) -> Option<Annotation> {
    let (behavior, policy) = if let Some(pair) = statement.split_once(POLICY_SEP) {
        pair
    } else if let Some(pair) = statement.split_once(NOTABILITY_SEP) {
        pair
    } else if statement.ends_with(WORLD_ASSEMBLY_SUFFIX) {
        // The suffix guarantees at least one " the ".
        statement.rsplit_once(" the ")?
    } else if statement.starts_with(LEADS_TO_PREFIX) {
        statement.rsplit_once(' ')?
    } else if let Some(pair) = statement.rsplit_once(' ') {
        pair
    } else if !statement.is_empty() {
        ("", statement)
    } else {
        return None;
    };
    Some(Annotation::new(behavior, policy))
}

/// Group statements into display rows.
///
/// Each pair lands in the first row where its behavior is still free; when
/// every row already has that behavior a new row is started, so repeated
/// behaviors never overwrite each other.
pub fn split_annotations(statements: &[String]) -> Vec<AnnotationRow> {
    let mut rows: Vec<AnnotationRow> = Vec::new();
    for annotation in statements.iter().filter_map(|s| split_statement(s)) {
        match rows.iter_mut().find(|row| !row.has(&annotation.behavior)) {
            Some(row) => row.0.push(annotation),
            None => rows.push(AnnotationRow(vec![annotation])),
        }
    }
    rows
}
