//! Subscription patterns over `/`-separated state paths.
//!
//! A pattern segment is either literal, `+` (exactly one level) or `#`
//! (zero or more remaining levels, last segment only).

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

/// A parsed subscription pattern such as `session/+` or `block/#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|s| match s {
                "+" => Segment::One,
                "#" => Segment::Rest,
                lit => Segment::Literal(lit.to_string()),
            })
            .collect();
        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut levels = path.split('/');
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::One => {
                    if levels.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if levels.next() != Some(lit.as_str()) {
                        return false;
                    }
                }
            }
        }
        levels.next().is_none()
    }
}

/// Subscribers keyed by pattern, in registration order.
pub struct Subscriptions<T> {
    entries: Vec<(Pattern, T)>,
}

impl<T: Clone> Subscriptions<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, pattern: &str, value: T) {
        self.entries.push((Pattern::parse(pattern), value));
    }

    /// Values whose pattern matches `path`.
    pub fn matching(&self, path: &str) -> Vec<T> {
        self.entries
            .iter()
            .filter(|(pattern, _)| pattern.matches(path))
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Drop the values registered under exactly `pattern` that satisfy `pred`.
    pub fn remove<F: Fn(&T) -> bool>(&mut self, pattern: &str, pred: F) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|(p, value)| !(p.as_str() == pattern && pred(value)));
        self.entries.len() < before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for Subscriptions<T> {
    fn default() -> Self {
        Self::new()
    }
}
