use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::form::FormError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Canonical address of a value in the form store.
///
/// Grammar: `name`, `parent.name`, `parent[index].name`. Sections never add a
/// segment; repeatable items add `[index]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FormError> {
        let invalid = |reason: &str| FormError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };
        if raw.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        let mut chars = raw.chars().peekable();
        let mut current = String::new();
        let mut expect_key = true;

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() && expect_key {
                        return Err(invalid("empty segment"));
                    }
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                    expect_key = true;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    } else if segments.is_empty() {
                        return Err(invalid("index without a parent"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(invalid("index must be a non-negative integer")),
                            None => return Err(invalid("unterminated index")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    segments.push(Segment::Index(index));
                    expect_key = false;
                    if let Some(next) = chars.peek()
                        && *next != '.'
                        && *next != '['
                    {
                        return Err(invalid("index must be followed by '.' or '['"));
                    }
                }
                ']' => return Err(invalid("unbalanced ']'")),
                other => {
                    current.push(other);
                    expect_key = false;
                }
            }
        }

        if !current.is_empty() {
            segments.push(Segment::Key(current));
        } else if expect_key {
            return Err(invalid("trailing '.'"));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(name.into()));
        Self { segments }
    }

    pub fn item(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Last key segment, i.e. the field's own name.
    pub fn leaf_name(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            Segment::Key(key) => Some(key.as_str()),
            Segment::Index(_) => None,
        })
    }

    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get_mut(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value`, creating intermediate objects and arrays on demand.
    pub fn set(&self, root: &mut Value, value: Value) {
        insert_segments(root, &self.segments, value);
    }

    pub fn remove(&self, root: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let parent = FieldPath {
            segments: parents.to_vec(),
        };
        let container = parent.get_mut(root)?;
        match (last, container) {
            (Segment::Key(key), Value::Object(map)) => map.remove(key),
            (Segment::Index(index), Value::Array(items)) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if idx == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn insert_segments(root: &mut Value, segments: &[Segment], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *root = value;
        return;
    };

    match head {
        Segment::Key(key) => {
            if !root.is_object() {
                *root = Value::Object(Map::new());
            }
            if let Value::Object(map) = root {
                if rest.is_empty() {
                    map.insert(key.clone(), value);
                    return;
                }
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                insert_segments(entry, rest, value);
            }
        }
        Segment::Index(index) => {
            if !root.is_array() {
                *root = Value::Array(Vec::new());
            }
            if let Value::Array(items) = root {
                while items.len() <= *index {
                    items.push(Value::Null);
                }
                insert_segments(&mut items[*index], rest, value);
            }
        }
    }
}

/// Where `key` lands once `repeatable[removed]` is deleted: `None` when it
/// addressed the removed item, shifted down by one when it sat after it.
pub fn reindex_key(key: &str, repeatable: &str, removed: usize) -> Option<String> {
    let prefix = format!("{repeatable}[");
    let Some(tail) = key.strip_prefix(&prefix) else {
        return Some(key.to_string());
    };
    let Some((digits, rest)) = tail.split_once(']') else {
        return Some(key.to_string());
    };
    let Ok(index) = digits.parse::<usize>() else {
        return Some(key.to_string());
    };
    match index.cmp(&removed) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(format!("{prefix}{}]{rest}", index - 1)),
        std::cmp::Ordering::Less => Some(key.to_string()),
    }
}

/// Moves keys addressed under `repeatable[j]` to `repeatable[j - 1]` for every
/// `j > removed` and drops the keys under `repeatable[removed]`.
pub fn reindex_after_removal<T>(map: &mut IndexMap<String, T>, repeatable: &str, removed: usize) {
    let entries = std::mem::take(map);
    for (key, value) in entries {
        if let Some(key) = reindex_key(&key, repeatable, removed) {
            map.insert(key, value);
        }
    }
}
