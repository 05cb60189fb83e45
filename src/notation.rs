//! Native text notation for planar diagrams.
//!
//! ## Format
//!
//! ```text
//! a=V(b0 c0 d3) b=V(a0 d2 c1) c=X(a1 b2 d1 d0) d=X(c3 c2 b1 a2) [framing=0, name=theta]
//! ```
//!
//! - `a=V(...)` declares vertex `a`, `a=X(...)` a crossing. The tokens in
//!   parentheses list, counter-clockwise from position 0, the twin of
//!   each position.
//! - A twin token is `<node><position>`, optionally followed by `:in` or
//!   `:out` (orientation of this half-edge) and `{key=value,...}`
//!   (attributes of this half-edge).
//! - An optional trailing `[...]` section holds `framing=<int>` and any
//!   other diagram attribute.
//! - Attribute keys and values are percent-encoded: every byte outside
//!   `[A-Za-z0-9_.+-]` is written as `%XX`, so values may contain
//!   separators, brackets or whitespace.
//!
//! Node ids start with a letter or `_` and must not end in a digit, so
//! that `ab12` reads unambiguously as position 12 on `ab`.
//!
//! Parsing only uses the public construction primitives and finishes with
//! [`PlanarDiagram::sanity_check`]. `to_native` lists nodes in label
//! order, so `parse_native(&to_native(&k)) == k`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{
    Attributes, DiagramError, Endpoint, EndpointKind, NodeId, NodeKind, PlanarDiagram,
};

/// Error type for notation parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    /// Text that is not a node declaration or a trailing section.
    #[error("Syntax error at byte {offset}: {snippet:?}")]
    Syntax {
        /// Byte offset of the offending text.
        offset: usize,
        /// The offending text.
        snippet: String,
    },
    /// Malformed twin token or attribute.
    #[error("Bad token {0:?}")]
    BadToken(String),
    /// A node declared twice.
    #[error("Node {0} declared twice")]
    DuplicateNode(NodeId),
    /// The parsed diagram is structurally invalid.
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

fn node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*([A-Za-z])\s*\(([^)]*)\)")
            .expect("node pattern is valid")
    })
}

fn endpoint_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*?)([0-9]+)(?::(in|out))?(?:\{([^}]*)\})?$")
            .expect("endpoint pattern is valid")
    })
}

/// Percent-encode an attribute key or value.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'+' | b'-') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&hex::encode_upper([b]));
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, NotationError> {
    let bad = || NotationError::BadToken(text.to_string());
    let raw = text.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let code = raw.get(i + 1..i + 3).ok_or_else(bad)?;
            bytes.extend(hex::decode(code).map_err(|_| bad())?);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).map_err(|_| bad())
}

/// Split `key=value,...` into raw (still encoded) pairs.
fn split_pairs(text: &str) -> Result<Vec<(&str, &str)>, NotationError> {
    let mut pairs = Vec::new();
    for pair in text.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| NotationError::BadToken(pair.to_string()))?;
        pairs.push((key.trim(), value.trim()));
    }
    Ok(pairs)
}

fn parse_pairs(text: &str) -> Result<Attributes, NotationError> {
    let mut attrs = Attributes::new();
    for (key, value) in split_pairs(text)? {
        attrs.insert(unescape(key)?, unescape(value)?);
    }
    Ok(attrs)
}

struct TwinToken {
    twin: Endpoint,
    kind: EndpointKind,
    attrs: Attributes,
}

fn parse_twin(token: &str) -> Result<TwinToken, NotationError> {
    let bad = || NotationError::BadToken(token.to_string());
    let caps = endpoint_regex().captures(token).ok_or_else(bad)?;
    let node = caps.get(1).ok_or_else(bad)?.as_str();
    let position: usize = caps
        .get(2)
        .ok_or_else(bad)?
        .as_str()
        .parse()
        .map_err(|_| bad())?;
    let kind = EndpointKind::from_suffix(caps.get(3).map_or("", |m| m.as_str())).ok_or_else(bad)?;
    let attrs = match caps.get(4) {
        Some(m) => parse_pairs(m.as_str())?,
        None => Attributes::new(),
    };
    Ok(TwinToken {
        twin: Endpoint::new(node, position),
        kind,
        attrs,
    })
}

/// Split `[ ... ]` off the end of `text`.
fn split_trailer(text: &str) -> Result<(&str, Option<&str>), NotationError> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(']') {
        return Ok((text, None));
    }
    let open = trimmed.rfind('[').ok_or_else(|| NotationError::Syntax {
        offset: trimmed.len() - 1,
        snippet: "]".to_string(),
    })?;
    Ok((&trimmed[..open], Some(&trimmed[open + 1..trimmed.len() - 1])))
}

/// Parse native notation.
pub fn parse_native(text: &str) -> Result<PlanarDiagram, NotationError> {
    let (body, trailer) = split_trailer(text)?;
    let mut k = PlanarDiagram::new();
    let mut declared: Vec<(NodeId, Vec<TwinToken>)> = Vec::new();

    let mut cursor = 0;
    for caps in node_regex().captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        let gap = &body[cursor..whole.start()];
        if !gap.trim().is_empty() {
            return Err(NotationError::Syntax {
                offset: cursor,
                snippet: gap.trim().to_string(),
            });
        }
        cursor = whole.end();

        let id = caps.get(1).map_or("", |m| m.as_str());
        if id.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(NotationError::BadToken(id.to_string()));
        }
        let id = NodeId::from(id);
        let letter = caps
            .get(2)
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or(' ');
        let kind = NodeKind::from_letter(letter)
            .ok_or_else(|| NotationError::BadToken(letter.to_string()))?;
        let twins = caps
            .get(3)
            .map_or("", |m| m.as_str())
            .split_whitespace()
            .map(parse_twin)
            .collect::<Result<Vec<_>, _>>()?;

        if k.contains_node(&id) {
            return Err(NotationError::DuplicateNode(id));
        }
        k.add_node(id.clone(), kind, twins.len())?;
        declared.push((id, twins));
    }
    let rest = &body[cursor..];
    if !rest.trim().is_empty() {
        return Err(NotationError::Syntax {
            offset: cursor,
            snippet: rest.trim().to_string(),
        });
    }

    for (id, twins) in declared {
        for (position, token) in twins.into_iter().enumerate() {
            k.set_endpoint(
                Endpoint::new(id.clone(), position),
                token.twin,
                token.kind,
                token.attrs,
            )?;
        }
    }

    if let Some(trailer) = trailer {
        for (key, value) in split_pairs(trailer)? {
            // Only the literal key sets the framing; an attribute named
            // `framing` is written with its first byte encoded.
            if key == "framing" {
                let framing = value
                    .parse()
                    .map_err(|_| NotationError::BadToken(format!("framing={value}")))?;
                k.set_framing(Some(framing));
            } else {
                k.attrs_mut().insert(unescape(key)?, unescape(value)?);
            }
        }
    }

    k.sanity_check()?;
    Ok(k)
}

fn write_pairs(out: &mut String, attrs: &Attributes) {
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(key));
        out.push('=');
        out.push_str(&escape(value));
    }
}

/// Render native notation.
pub fn to_native(k: &PlanarDiagram) -> String {
    let mut out = String::new();
    for (i, (id, node)) in k.node_entries().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(id.as_str());
        out.push('=');
        out.push(node.kind().letter());
        out.push('(');
        for (p, slot) in node.slots().iter().enumerate() {
            if p > 0 {
                out.push(' ');
            }
            match slot {
                None => out.push('_'),
                Some(slot) => {
                    out.push_str(&slot.twin.to_string());
                    if slot.kind != EndpointKind::Undirected {
                        out.push(':');
                        out.push_str(slot.kind.suffix());
                    }
                    if !slot.attrs.is_empty() {
                        out.push('{');
                        write_pairs(&mut out, &slot.attrs);
                        out.push('}');
                    }
                }
            }
        }
        out.push(')');
    }

    if k.framing().is_some() || !k.attrs().is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push('[');
        if let Some(framing) = k.framing() {
            out.push_str(&format!("framing={framing}"));
            if !k.attrs().is_empty() {
                out.push_str(", ");
            }
        }
        for (i, (key, value)) in k.attrs().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if key == "framing" {
                out.push_str("%66raming");
            } else {
                out.push_str(&escape(key));
            }
            out.push('=');
            out.push_str(&escape(value));
        }
        out.push(']');
    }
    out
}

impl fmt::Display for PlanarDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_native(self))
    }
}

impl FromStr for PlanarDiagram {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_native(s)
    }
}

impl Serialize for PlanarDiagram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_native(self))
    }
}

impl<'de> Deserialize<'de> for PlanarDiagram {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_native(&text).map_err(serde::de::Error::custom)
    }
}
