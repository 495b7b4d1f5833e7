//! Property paths: dotted addresses into a layer (`fill.color.r`,
//! `transform.position.x`, `text.fontSize`).
//!
//! Parsed with `winnow` into raw tokens, normalized into canonical
//! segments (aliases expanded, `fill` → `fills[0]`), then typed into a
//! [`PropertyPath`]. Lock matching works on canonical segments so that
//! locking a prefix blocks every path below it.

use crate::error::PathError;
use crate::model::Layer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::dec_uint;
use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::prelude::*;
use winnow::token::take_while;

// ─── Typed paths ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformField {
    All,
    Position(Option<Axis>),
    Size(Option<Axis>),
    Rotation,
    SkewX,
    SkewY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintField {
    Paint,
    Color,
    Channel(Channel),
    GradientType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrokeField {
    Stroke,
    Color,
    Width,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Content,
    FontFamily,
    FontSize,
    FontWeight,
    Color,
    Align,
    LineHeight,
    LetterSpacing,
    Italic,
}

/// A typed address of one editable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    Name,
    Visible,
    Opacity,
    Transform(TransformField),
    /// The whole fill list.
    Fills,
    /// One fill by index.
    Fill(usize, PaintField),
    Stroke(StrokeField),
    CornerRadii,
    Text(TextField),
}

/// Broad property groups that revision scopes are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyCategory {
    /// Name and visibility.
    Identity,
    /// Fill, stroke, gradient and text colors.
    Color,
    /// Text content.
    Copy,
    /// Font family, size, weight, alignment, spacing.
    Typography,
    /// Transform and corner radii.
    Geometry,
    /// Opacity and stroke width.
    Appearance,
}

impl PropertyPath {
    /// Parse a raw path string.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segments = canonical_segments(raw)?;
        // A bare `text` addresses the content when used as an edit target.
        let segments = if segments == ["text"] {
            vec!["text".to_string(), "content".to_string()]
        } else {
            segments
        };
        Self::from_segments(&segments).ok_or_else(|| PathError::Unknown(raw.to_string()))
    }

    fn from_segments(segments: &[String]) -> Option<Self> {
        let s: Vec<&str> = segments.iter().map(String::as_str).collect();
        let path = match s.as_slice() {
            ["name"] => PropertyPath::Name,
            ["visible"] => PropertyPath::Visible,
            ["opacity"] => PropertyPath::Opacity,
            ["transform"] => PropertyPath::Transform(TransformField::All),
            ["transform", "position"] => PropertyPath::Transform(TransformField::Position(None)),
            ["transform", "position", axis] => {
                PropertyPath::Transform(TransformField::Position(Some(parse_axis(axis)?)))
            }
            ["transform", "size"] => PropertyPath::Transform(TransformField::Size(None)),
            ["transform", "size", axis] => {
                PropertyPath::Transform(TransformField::Size(Some(parse_axis(axis)?)))
            }
            ["transform", "rotation"] => PropertyPath::Transform(TransformField::Rotation),
            ["transform", "skewX"] => PropertyPath::Transform(TransformField::SkewX),
            ["transform", "skewY"] => PropertyPath::Transform(TransformField::SkewY),
            ["fills"] => PropertyPath::Fills,
            ["fills", n, rest @ ..] => {
                let index: usize = n.parse().ok()?;
                let field = match rest {
                    [] => PaintField::Paint,
                    ["color"] => PaintField::Color,
                    ["color", ch] => PaintField::Channel(parse_channel(ch)?),
                    ["gradientType"] => PaintField::GradientType,
                    _ => return None,
                };
                PropertyPath::Fill(index, field)
            }
            ["stroke"] => PropertyPath::Stroke(StrokeField::Stroke),
            ["stroke", "color"] => PropertyPath::Stroke(StrokeField::Color),
            ["stroke", "width"] => PropertyPath::Stroke(StrokeField::Width),
            ["cornerRadii"] => PropertyPath::CornerRadii,
            ["text", field] => PropertyPath::Text(match *field {
                "content" => TextField::Content,
                "fontFamily" => TextField::FontFamily,
                "fontSize" => TextField::FontSize,
                "fontWeight" => TextField::FontWeight,
                "color" => TextField::Color,
                "align" => TextField::Align,
                "lineHeight" => TextField::LineHeight,
                "letterSpacing" => TextField::LetterSpacing,
                "italic" => TextField::Italic,
                _ => return None,
            }),
            _ => return None,
        };
        Some(path)
    }

    /// Canonical segments, used for prefix lock matching.
    pub fn segments(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(4);
        let mut push = |s: &str| out.push(s.to_string());
        match self {
            PropertyPath::Name => push("name"),
            PropertyPath::Visible => push("visible"),
            PropertyPath::Opacity => push("opacity"),
            PropertyPath::Transform(field) => {
                push("transform");
                match field {
                    TransformField::All => {}
                    TransformField::Position(axis) => {
                        push("position");
                        if let Some(axis) = axis {
                            push(axis_name(*axis));
                        }
                    }
                    TransformField::Size(axis) => {
                        push("size");
                        if let Some(axis) = axis {
                            push(axis_name(*axis));
                        }
                    }
                    TransformField::Rotation => push("rotation"),
                    TransformField::SkewX => push("skewX"),
                    TransformField::SkewY => push("skewY"),
                }
            }
            PropertyPath::Fills => push("fills"),
            PropertyPath::Fill(index, field) => {
                push("fills");
                push(&index.to_string());
                match field {
                    PaintField::Paint => {}
                    PaintField::Color => push("color"),
                    PaintField::Channel(ch) => {
                        push("color");
                        push(channel_name(*ch));
                    }
                    PaintField::GradientType => push("gradientType"),
                }
            }
            PropertyPath::Stroke(field) => {
                push("stroke");
                match field {
                    StrokeField::Stroke => {}
                    StrokeField::Color => push("color"),
                    StrokeField::Width => push("width"),
                }
            }
            PropertyPath::CornerRadii => push("cornerRadii"),
            PropertyPath::Text(field) => {
                push("text");
                push(match field {
                    TextField::Content => "content",
                    TextField::FontFamily => "fontFamily",
                    TextField::FontSize => "fontSize",
                    TextField::FontWeight => "fontWeight",
                    TextField::Color => "color",
                    TextField::Align => "align",
                    TextField::LineHeight => "lineHeight",
                    TextField::LetterSpacing => "letterSpacing",
                    TextField::Italic => "italic",
                });
            }
        }
        out
    }

    pub fn category(&self) -> PropertyCategory {
        match self {
            PropertyPath::Name | PropertyPath::Visible => PropertyCategory::Identity,
            PropertyPath::Opacity | PropertyPath::Stroke(StrokeField::Width) => {
                PropertyCategory::Appearance
            }
            PropertyPath::Transform(_) | PropertyPath::CornerRadii => PropertyCategory::Geometry,
            PropertyPath::Fills
            | PropertyPath::Fill(..)
            | PropertyPath::Stroke(StrokeField::Stroke | StrokeField::Color)
            | PropertyPath::Text(TextField::Color) => PropertyCategory::Color,
            PropertyPath::Text(TextField::Content) => PropertyCategory::Copy,
            PropertyPath::Text(_) => PropertyCategory::Typography,
        }
    }

    /// Whether the path moves or resizes the layer.
    pub fn is_structural(&self) -> bool {
        matches!(self, PropertyPath::Transform(_))
    }

    /// Whether `layer`'s kind has this property at all. Fill indices
    /// past the end of the list do not apply.
    pub fn applies_to(&self, layer: &Layer) -> bool {
        match self {
            PropertyPath::Name
            | PropertyPath::Visible
            | PropertyPath::Opacity
            | PropertyPath::Transform(_) => true,
            PropertyPath::Fills => layer.fills().is_some(),
            PropertyPath::Fill(index, field) => match layer.fills() {
                // Writing a whole paint into slot 0 of an empty list appends it.
                Some(fills) => {
                    *index < fills.len()
                        || (*index == 0 && fills.is_empty() && *field == PaintField::Paint)
                }
                None => false,
            },
            PropertyPath::Stroke(StrokeField::Stroke) => layer.stroke().is_some(),
            PropertyPath::Stroke(_) => layer.stroke().is_some_and(Option::is_some),
            PropertyPath::CornerRadii => layer.corner_radii().is_some(),
            PropertyPath::Text(_) => layer.text_data().is_some(),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_segments(&self.segments()))
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyPath::parse(s)
    }
}

impl Serialize for PropertyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PropertyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PropertyPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Segment helpers ─────────────────────────────────────────────────────

fn parse_axis(s: &str) -> Option<Axis> {
    match s {
        "x" | "width" => Some(Axis::X),
        "y" | "height" => Some(Axis::Y),
        _ => None,
    }
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "x",
        Axis::Y => "y",
    }
}

fn parse_channel(s: &str) -> Option<Channel> {
    match s {
        "r" => Some(Channel::R),
        "g" => Some(Channel::G),
        "b" => Some(Channel::B),
        "a" => Some(Channel::A),
        _ => None,
    }
}

fn channel_name(ch: Channel) -> &'static str {
    match ch {
        Channel::R => "r",
        Channel::G => "g",
        Channel::B => "b",
        Channel::A => "a",
    }
}

/// `fills.0.color` → `fill.color`, `fills.2` → `fills[2]`.
fn display_segments(segments: &[String]) -> String {
    let mut out = String::new();
    let mut iter = segments.iter().peekable();
    if segments.len() >= 2 && segments[0] == "fills" && segments[1] == "0" {
        out.push_str("fill");
        iter.next();
        iter.next();
    }
    for seg in iter {
        if seg.bytes().all(|b| b.is_ascii_digit()) {
            out.push('[');
            out.push_str(seg);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(seg);
        }
    }
    out
}

/// Parse and normalize a raw path into canonical segments without typing
/// it. Lock paths go through here so that a lock on a partial prefix
/// (`text`, `transform.position`) stays a prefix.
///
/// `*` is kept as-is and matches everything.
pub fn canonical_segments(raw: &str) -> Result<Vec<String>, PathError> {
    let trimmed = raw.trim();
    if trimmed == "*" {
        return Ok(vec!["*".to_string()]);
    }
    let mut rest = trimmed;
    let tokens = path_tokens
        .parse_next(&mut rest)
        .map_err(|_| PathError::Malformed {
            path: raw.to_string(),
            offset: trimmed.len() - rest.len(),
        })?;
    if !rest.is_empty() {
        return Err(PathError::Malformed {
            path: raw.to_string(),
            offset: trimmed.len() - rest.len(),
        });
    }

    let raw_segments: Vec<String> = tokens
        .into_iter()
        .map(|t| match t {
            Token::Key(k) => k.to_string(),
            Token::Index(i) => i.to_string(),
        })
        .collect();
    Ok(expand_aliases(raw_segments))
}

/// Whether `prefix` covers `path` segment-wise (`fills.0` covers
/// `fills.0.color.r`, not `fillsX`).
pub fn is_prefix_of(prefix: &[String], path: &[String]) -> bool {
    if prefix.first().is_some_and(|s| s == "*") {
        return true;
    }
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}

fn expand_aliases(segments: Vec<String>) -> Vec<String> {
    let Some((head, tail)) = segments.split_first() else {
        return segments;
    };
    let tail: Vec<String> = tail.to_vec();
    let prefixed = |front: &[&str], tail: Vec<String>| -> Vec<String> {
        front.iter().map(|s| s.to_string()).chain(tail).collect()
    };

    let expanded = match head.as_str() {
        "fill" => prefixed(&["fills", "0"], tail),
        "gradient" => {
            let mut tail = tail;
            if tail.first().is_some_and(|s| s == "type") {
                tail[0] = "gradientType".to_string();
            }
            prefixed(&["fills", "0"], tail)
        }
        "x" => prefixed(&["transform", "position", "x"], tail),
        "y" => prefixed(&["transform", "position", "y"], tail),
        "width" => prefixed(&["transform", "size", "x"], tail),
        "height" => prefixed(&["transform", "size", "y"], tail),
        "position" | "size" | "rotation" | "skewX" | "skewY" => {
            prefixed(&["transform", head.as_str()], tail)
        }
        "content" => prefixed(&["text", "content"], tail),
        "cornerRadius" => prefixed(&["cornerRadii"], tail),
        _ => segments.clone(),
    };

    // Inner aliases.
    let mut out = Vec::with_capacity(expanded.len());
    let mut i = 0;
    while i < expanded.len() {
        let seg = expanded[i].as_str();
        match seg {
            "gradient" if expanded.get(i + 1).is_some_and(|s| s == "type") => {
                out.push("gradientType".to_string());
                i += 2;
                continue;
            }
            "width" | "height" if out.last().is_some_and(|s| s == "size") => {
                out.push(if seg == "width" { "x" } else { "y" }.to_string());
            }
            _ => out.push(seg.to_string()),
        }
        i += 1;
    }
    out
}

// ─── Low-level parsers ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_key<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn parse_index(input: &mut &str) -> ModalResult<usize> {
    delimited('[', dec_uint, ']').parse_next(input)
}

fn parse_tail<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    alt((
        preceded('.', parse_key).map(Token::Key),
        parse_index.map(Token::Index),
    ))
    .parse_next(input)
}

fn path_tokens<'a>(input: &mut &'a str) -> ModalResult<Vec<Token<'a>>> {
    let first = parse_key.map(Token::Key).parse_next(input)?;
    let rest: Vec<Token<'a>> = repeat(0.., parse_tail).parse_next(input)?;
    let mut tokens = Vec::with_capacity(rest.len() + 1);
    tokens.push(first);
    tokens.extend(rest);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layer, ShapeKind};
    use pretty_assertions::assert_eq;

    fn segs(raw: &str) -> Vec<String> {
        canonical_segments(raw).unwrap()
    }

    #[test]
    fn fill_aliases_first_fill() {
        assert_eq!(
            PropertyPath::parse("fill").unwrap(),
            PropertyPath::Fill(0, PaintField::Paint)
        );
        assert_eq!(
            PropertyPath::parse("fills[0].color.r").unwrap(),
            PropertyPath::Fill(0, PaintField::Channel(Channel::R))
        );
        assert_eq!(
            PropertyPath::parse("fill.color.r").unwrap(),
            PropertyPath::parse("fills.0.color.r").unwrap()
        );
    }

    #[test]
    fn transform_aliases() {
        assert_eq!(
            PropertyPath::parse("x").unwrap(),
            PropertyPath::Transform(TransformField::Position(Some(Axis::X)))
        );
        assert_eq!(
            PropertyPath::parse("transform.size.width").unwrap(),
            PropertyPath::Transform(TransformField::Size(Some(Axis::X)))
        );
        assert_eq!(
            PropertyPath::parse("rotation").unwrap(),
            PropertyPath::Transform(TransformField::Rotation)
        );
    }

    #[test]
    fn text_paths() {
        assert_eq!(
            PropertyPath::parse("text").unwrap(),
            PropertyPath::Text(TextField::Content)
        );
        assert_eq!(
            PropertyPath::parse("content").unwrap(),
            PropertyPath::Text(TextField::Content)
        );
        assert_eq!(
            PropertyPath::parse("text.fontSize").unwrap(),
            PropertyPath::Text(TextField::FontSize)
        );
        assert_eq!(
            PropertyPath::parse("gradient.type").unwrap(),
            PropertyPath::Fill(0, PaintField::GradientType)
        );
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(PropertyPath::parse("fill.color").unwrap().to_string(), "fill.color");
        assert_eq!(PropertyPath::parse("fills[2]").unwrap().to_string(), "fills[2]");
        assert_eq!(
            PropertyPath::parse("width").unwrap().to_string(),
            "transform.size.x"
        );
        assert_eq!(PropertyPath::parse("text").unwrap().to_string(), "text.content");
    }

    #[test]
    fn malformed_and_unknown_paths() {
        assert!(matches!(
            PropertyPath::parse("fill..color"),
            Err(PathError::Malformed { .. })
        ));
        assert!(matches!(
            PropertyPath::parse("fills[x]"),
            Err(PathError::Malformed { .. })
        ));
        assert!(matches!(PropertyPath::parse(""), Err(PathError::Malformed { .. })));
        assert!(matches!(
            PropertyPath::parse("blendMode"),
            Err(PathError::Unknown(_))
        ));
        assert!(matches!(
            PropertyPath::parse("fill.color.q"),
            Err(PathError::Unknown(_))
        ));
    }

    #[test]
    fn prefix_matching_is_segment_wise() {
        let lock = segs("fill");
        assert!(is_prefix_of(&lock, &segs("fill.color.r")));
        assert!(is_prefix_of(&lock, &segs("fills[0]")));
        assert!(!is_prefix_of(&lock, &segs("fills[1].color")));
        assert!(is_prefix_of(&segs("fills"), &segs("fill.color")));
        assert!(is_prefix_of(&segs("text"), &segs("text.fontSize")));
        assert!(!is_prefix_of(&segs("text.content"), &segs("text.fontSize")));
        assert!(is_prefix_of(&segs("*"), &segs("opacity")));
    }

    #[test]
    fn applicability_by_kind() {
        let text = Layer::text("hi");
        let shape = Layer::shape(ShapeKind::Rect, 1.0, 1.0);
        let fill = PropertyPath::parse("fill").unwrap();
        let content = PropertyPath::parse("text").unwrap();
        assert!(fill.applies_to(&shape));
        assert!(!fill.applies_to(&text));
        assert!(content.applies_to(&text));
        assert!(!content.applies_to(&shape));
        assert!(!PropertyPath::parse("fills[3]").unwrap().applies_to(&shape));
        assert!(!PropertyPath::parse("stroke.width").unwrap().applies_to(&shape));
    }

    #[test]
    fn categories() {
        let cat = |p: &str| PropertyPath::parse(p).unwrap().category();
        assert_eq!(cat("fill"), PropertyCategory::Color);
        assert_eq!(cat("text.color"), PropertyCategory::Color);
        assert_eq!(cat("text"), PropertyCategory::Copy);
        assert_eq!(cat("text.fontWeight"), PropertyCategory::Typography);
        assert_eq!(cat("x"), PropertyCategory::Geometry);
        assert_eq!(cat("opacity"), PropertyCategory::Appearance);
        assert_eq!(cat("name"), PropertyCategory::Identity);
    }
}
