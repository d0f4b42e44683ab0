use std::collections::BTreeMap;
use std::fmt;

/// Option name with an optional namespace, rendered as `prefix.name`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionKey {
    prefix: Option<String>,
    name: String,
}

impl OptionKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            name: name.into(),
        }
    }

    /// Build a key from an optional prefix, as taken by the registry's option methods.
    pub fn with_prefix(prefix: Option<&str>, name: impl Into<String>) -> Self {
        match prefix {
            Some(p) => Self::prefixed(p, name),
            None => Self::new(name),
        }
    }

    /// Split a dotted key at its first `.`, so `"auglag.tol"` has prefix `auglag`.
    pub fn parse(dotted: &str) -> Self {
        match dotted.split_once('.') {
            Some((prefix, name)) => Self::prefixed(prefix, name),
            None => Self::new(dotted),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}.{}", prefix, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted where a real is expected.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            OptionValue::Real(r) => Some(*r),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "integer",
            OptionValue::Real(_) => "real",
            OptionValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Real(r) => write!(f, "{r}"),
            OptionValue::Text(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        OptionValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Real(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Solver configuration handed unchanged to the engine.
///
/// Keys are kept sorted, so two option sets with the same entries compare and
/// print identically regardless of insertion order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    entries: BTreeMap<OptionKey, OptionValue>,
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one entry, returning the value it replaced.
    pub fn insert(&mut self, key: OptionKey, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.entries.insert(key, value.into())
    }

    pub fn set(&mut self, prefix: Option<&str>, name: &str, value: impl Into<OptionValue>) {
        self.insert(OptionKey::with_prefix(prefix, name), value);
    }

    /// Merge `options` under `prefix`; later entries overwrite earlier ones.
    pub fn merge<K, V, I>(&mut self, prefix: Option<&str>, options: I)
    where
        K: Into<String>,
        V: Into<OptionValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in options {
            self.insert(OptionKey::with_prefix(prefix, name), value);
        }
    }

    pub fn get(&self, prefix: Option<&str>, name: &str) -> Option<&OptionValue> {
        self.entries.get(&OptionKey::with_prefix(prefix, name))
    }

    pub fn remove(&mut self, key: &OptionKey) -> Option<OptionValue> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionValue)> {
        self.entries.iter()
    }
}

impl FromIterator<(OptionKey, OptionValue)> for SolverOptions {
    fn from_iter<I: IntoIterator<Item = (OptionKey, OptionValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for SolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}
