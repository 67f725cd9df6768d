use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A structured reference to a named output of an earlier step.
///
/// Serialized as the `${{step_id.field}}` placeholder the backend resolves at
/// execution time; kept structured everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepReference {
    pub step_id: String,
    pub field: String,
}

impl StepReference {
    pub fn new(step_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            field: field.into(),
        }
    }

    pub fn to_placeholder(&self) -> String {
        self.to_string()
    }

    /// Parses a string that consists of exactly one placeholder expression.
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix("${{")?.strip_suffix("}}")?;
        let (step_id, field) = inner.rsplit_once('.')?;
        let valid = |part: &str| {
            !part.is_empty()
                && !part
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '$'))
        };
        (valid(step_id) && valid(field)).then(|| Self::new(step_id, field))
    }
}

impl fmt::Display for StepReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{{{}.{}}}}}", self.step_id, self.field)
    }
}

/// A node in the `user_inputs` value tree of a template step.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Literal(serde_json::Value),
    Reference(StepReference),
    List(Vec<InputValue>),
    Object(BTreeMap<String, InputValue>),
}

impl InputValue {
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<InputValue>,
    {
        InputValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<V: Into<InputValue>>(items: impl IntoIterator<Item = V>) -> Self {
        InputValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Collects every step reference in this tree, depth first.
    pub fn collect_references<'a>(&'a self, refs: &mut Vec<&'a StepReference>) {
        match self {
            InputValue::Reference(r) => refs.push(r),
            InputValue::List(items) => items.iter().for_each(|v| v.collect_references(refs)),
            InputValue::Object(map) => map.values().for_each(|v| v.collect_references(refs)),
            InputValue::Literal(_) => {}
        }
    }

    /// Looks up a nested value by a path of object keys.
    pub fn get_path(&self, path: &[&str]) -> Option<&InputValue> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                InputValue::Object(map) => map.get(*head)?.get_path(rest),
                _ => None,
            },
        }
    }

    pub fn as_reference(&self) -> Option<&StepReference> {
        match self {
            InputValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::Literal(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Renders the tree to plain JSON, turning references into placeholders.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            InputValue::Literal(v) => v.clone(),
            InputValue::Reference(r) => serde_json::Value::String(r.to_placeholder()),
            InputValue::List(items) => items.iter().map(InputValue::to_json).collect(),
            InputValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InputValue::Literal(v) => v.serialize(serializer),
            InputValue::Reference(r) => serializer.serialize_str(&r.to_placeholder()),
            InputValue::List(items) => serializer.collect_seq(items),
            InputValue::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for InputValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(InputValue::from)
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => match StepReference::parse(&s) {
                Some(r) => InputValue::Reference(r),
                None => InputValue::Literal(serde_json::Value::String(s)),
            },
            serde_json::Value::Array(items) => {
                InputValue::List(items.into_iter().map(InputValue::from).collect())
            }
            serde_json::Value::Object(map) => InputValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, InputValue::from(v)))
                    .collect(),
            ),
            other => InputValue::Literal(other),
        }
    }
}

impl From<StepReference> for InputValue {
    fn from(r: StepReference) -> Self {
        InputValue::Reference(r)
    }
}

impl From<&str> for InputValue {
    fn from(s: &str) -> Self {
        InputValue::Literal(serde_json::Value::from(s))
    }
}

impl From<String> for InputValue {
    fn from(s: String) -> Self {
        InputValue::Literal(serde_json::Value::from(s))
    }
}

impl From<bool> for InputValue {
    fn from(b: bool) -> Self {
        InputValue::Literal(serde_json::Value::from(b))
    }
}

impl From<f64> for InputValue {
    fn from(n: f64) -> Self {
        InputValue::Literal(serde_json::Value::from(n))
    }
}

impl From<usize> for InputValue {
    fn from(n: usize) -> Self {
        InputValue::Literal(serde_json::Value::from(n))
    }
}

impl From<Vec<InputValue>> for InputValue {
    fn from(items: Vec<InputValue>) -> Self {
        InputValue::List(items)
    }
}
