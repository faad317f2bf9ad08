// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Exchange name templates.
//!
//! An exchange name may embed `{node}` and `{port}` placeholders, e.g.
//! `exchange-{node}`. Port bindings are expanded with the owning node and
//! port at load time; a concrete exchange name is matched back against the
//! declared templates when it is not declared literally. Both directions are
//! pure functions of the descriptor, so every process computes the same topic.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Node,
    Port,
}

/// A parsed exchange name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl ExchangeTemplate {
    /// Parse an exchange name. Returns the reason on malformed input.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err("unterminated placeholder".to_string());
                    }
                    let placeholder = match name.as_str() {
                        "node" => Segment::Node,
                        "port" => Segment::Port,
                        other => return Err(format!("unknown placeholder '{{{}}}'", other)),
                    };
                    if literal.is_empty() && matches!(segments.last(), Some(Segment::Node | Segment::Port)) {
                        return Err("placeholders must be separated by literal text".to_string());
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(placeholder);
                }
                '}' => return Err("unmatched '}'".to_string()),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if segments.is_empty() {
            return Err("exchange name is empty".to_string());
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_templated(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| !matches!(segment, Segment::Literal(_)))
    }

    /// Substitute the placeholders.
    pub fn expand(&self, node: &str, port: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Node => node,
                Segment::Port => port,
            })
            .collect()
    }

    /// Whether `concrete` is an expansion of this template. `{node}` only
    /// binds to names accepted by `is_node`; `{port}` binds to any
    /// non-empty text.
    pub fn matches(&self, concrete: &str, is_node: &dyn Fn(&str) -> bool) -> bool {
        match_segments(&self.segments, concrete, is_node)
    }
}

fn match_segments(segments: &[Segment], rest: &str, is_node: &dyn Fn(&str) -> bool) -> bool {
    let Some((first, tail)) = segments.split_first() else {
        return rest.is_empty();
    };

    match first {
        Segment::Literal(text) => rest
            .strip_prefix(text.as_str())
            .is_some_and(|remaining| match_segments(tail, remaining, is_node)),
        Segment::Node | Segment::Port => {
            // Try every non-empty binding, shortest first.
            rest.char_indices()
                .skip(1)
                .map(|(idx, _)| idx)
                .chain(std::iter::once(rest.len()))
                .filter(|&end| end > 0)
                .any(|end| {
                    let candidate = &rest[..end];
                    let accepted = match first {
                        Segment::Node => is_node(candidate),
                        _ => true,
                    };
                    accepted && match_segments(tail, &rest[end..], is_node)
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(name: &str) -> bool {
        matches!(name, "video-capture" | "lidar")
    }

    #[test]
    fn literal_names_are_not_templated() {
        let template = ExchangeTemplate::parse("video").unwrap();
        assert!(!template.is_templated());
        assert_eq!(template.expand("any", "OUTPUT"), "video");
        assert!(template.matches("video", &nodes));
        assert!(!template.matches("video2", &nodes));
    }

    #[test]
    fn expand_node_and_port() {
        let template = ExchangeTemplate::parse("{node}.{port}").unwrap();
        assert!(template.is_templated());
        assert_eq!(template.expand("merger", "VIDEO"), "merger.VIDEO");
    }

    #[test]
    fn node_placeholder_only_matches_declared_nodes() {
        let template = ExchangeTemplate::parse("exchange-{node}").unwrap();
        assert!(template.matches("exchange-video-capture", &nodes));
        assert!(template.matches("exchange-lidar", &nodes));
        assert!(!template.matches("exchange-radar", &nodes));
        assert!(!template.matches("exchange-", &nodes));
    }

    #[test]
    fn port_placeholder_matches_any_text() {
        let template = ExchangeTemplate::parse("{node}/{port}").unwrap();
        assert!(template.matches("lidar/POINTS", &nodes));
        assert!(!template.matches("lidar/", &nodes));
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(ExchangeTemplate::parse("exchange-{node").is_err());
        assert!(ExchangeTemplate::parse("exchange-node}").is_err());
        assert!(ExchangeTemplate::parse("exchange-{host}").is_err());
        assert!(ExchangeTemplate::parse("{node}{port}").is_err());
        assert!(ExchangeTemplate::parse("").is_err());
    }
}
