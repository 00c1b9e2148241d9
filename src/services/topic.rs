//! Segmented topic patterns for broker subscriptions
//!
//! A pattern is a sequence of `/`-separated segments: fixed literals,
//! named identifier segments (optionally pinned to a configured value),
//! and an optional trailing multi-level wildcard. The same pattern both
//! matches incoming topics and derives the MQTT subscription filter.

/// One segment of a topic pattern
#[derive(Debug, Clone)]
pub enum Segment {
    /// Fixed segment that must match exactly
    Literal(&'static str),
    /// Identifier segment captured by name; `expect` pins it to a configured value
    Named { name: &'static str, expect: Option<String> },
    /// Trailing multi-level wildcard, matches zero or more remaining segments
    Rest,
}

impl Segment {
    pub fn named(name: &'static str, expect: Option<String>) -> Self {
        Segment::Named { name, expect }
    }
}

/// Identifier segments captured from a matched topic
#[derive(Debug, Default)]
pub struct TopicCapture<'a> {
    values: Vec<(&'static str, &'a str)>,
    /// Remainder matched by a trailing wildcard, empty if the wildcard
    /// matched zero levels
    pub rest: Option<&'a str>,
}

impl<'a> TopicCapture<'a> {
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

/// Immutable topic pattern, built once at startup
#[derive(Debug, Clone)]
pub struct TopicPattern {
    segments: Vec<Segment>,
}

impl TopicPattern {
    /// A `Rest` segment is only meaningful in the last position
    pub fn new(segments: Vec<Segment>) -> Self {
        debug_assert!(segments
            .iter()
            .position(|s| matches!(s, Segment::Rest))
            .map_or(true, |i| i == segments.len() - 1));
        Self { segments }
    }

    /// Match a topic against this pattern, capturing identifier segments.
    /// Returns `None` on the first mismatched segment.
    pub fn matches<'a>(&self, topic: &'a str) -> Option<TopicCapture<'a>> {
        let parts: Vec<&str> = topic.split('/').collect();
        let mut capture = TopicCapture::default();
        let mut idx = 0;
        let mut offset = 0; // byte offset of parts[idx] within topic

        for segment in &self.segments {
            if let Segment::Rest = segment {
                capture.rest = Some(&topic[offset.min(topic.len())..]);
                return Some(capture);
            }

            if idx >= parts.len() {
                return None;
            }
            let level = parts[idx];

            match segment {
                Segment::Literal(lit) => {
                    if level != *lit {
                        return None;
                    }
                }
                Segment::Named { name, expect } => {
                    if let Some(expected) = expect {
                        if level != expected {
                            return None;
                        }
                    }
                    capture.values.push((name, level));
                }
                Segment::Rest => unreachable!(),
            }

            offset += level.len() + 1;
            idx += 1;
        }

        if idx == parts.len() {
            Some(capture)
        } else {
            None
        }
    }

    /// Derive the MQTT subscription filter: pinned segments stay literal,
    /// open segments become `+`, a trailing wildcard becomes `#`.
    pub fn to_filter(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(lit) => (*lit).to_string(),
                Segment::Named { expect: Some(value), .. } => value.clone(),
                Segment::Named { expect: None, .. } => "+".to_string(),
                Segment::Rest => "#".to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
