//! Layer schema for design documents.
//!
//! A document is a tree of [`Layer`] values addressed by [`LayerId`].
//! Containers (group, frame, boolean group) hold an ordered list of child
//! ids; children never point back at their parent. Everything here is
//! plain data that serializes to nested records with no cycles.

use crate::id::LayerId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi << 4 | lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (byte(self.r), byte(self.g), byte(self.b), byte(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Clamp every channel into [0, 1]. Returns the color and whether
    /// anything changed.
    pub fn clamped(self) -> (Self, bool) {
        let c = Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        );
        (c, c != self)
    }

    /// Channel-wise equality after quantizing to 8 bits.
    pub fn same_rgb8(&self, other: &Color) -> bool {
        self.to_hex() == other.to_hex()
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32, // 0.0 .. 1.0
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

/// What happens past the last stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spread {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    pub gradient_type: GradientType,
    pub stops: Vec<GradientStop>,
    /// 2×3 affine matrix `[a, b, c, d, e, f]` in unit space.
    #[serde(default = "identity_matrix")]
    pub transform: [f32; 6],
    #[serde(default)]
    pub spread: Spread,
}

fn identity_matrix() -> [f32; 6] {
    [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
}

impl Gradient {
    pub fn linear(stops: Vec<GradientStop>) -> Self {
        Self {
            gradient_type: GradientType::Linear,
            stops,
            transform: identity_matrix(),
            spread: Spread::Pad,
        }
    }
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Paint {
    Solid { color: Color },
    Gradient(Gradient),
}

impl Paint {
    pub const fn solid(color: Color) -> Self {
        Paint::Solid { color }
    }

    /// The solid color, if this paint is solid.
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            Paint::Solid { color } => Some(*color),
            Paint::Gradient(_) => None,
        }
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

/// Missing fields take the default stroke's values when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeJoin {
    Miter,
    Round,
    Bevel,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            paint: Paint::solid(Color::BLACK),
            width: 1.0,
            cap: StrokeCap::Butt,
            join: StrokeJoin::Miter,
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Default run style of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16, // 100..900
    pub color: Color,
    pub align: TextAlign,
    pub line_height: f32,
    pub letter_spacing: f32,
    pub italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_size: 16.0,
            font_weight: 400,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
            italic: false,
        }
    }
}

/// Per-paragraph overrides. One entry per line of `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub align: Option<TextAlign>,
    pub indent: f32,
    pub spacing_after: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub content: String,
    pub style: TextStyle,
    pub paragraphs: Vec<Paragraph>,
}

impl TextData {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let paragraphs = vec![Paragraph::default(); content.lines().count().max(1)];
        Self {
            content,
            style: TextStyle::default(),
            paragraphs,
        }
    }

    /// Replace the content, keeping existing paragraph overrides and
    /// padding or truncating so there is one per line.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        let lines = self.content.lines().count().max(1);
        self.paragraphs.resize(lines, Paragraph::default());
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command (SVG-like but simplified).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),            // control, end
    CubicTo(f32, f32, f32, f32, f32, f32), // c1, c2, end
    Close,
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub position: Vec2,
    pub size: Vec2,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Transform {
    pub fn sized(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Default::default()
        }
    }
}

// ─── Layer kinds ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Polygon { sides: u32 },
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    pub shape: ShapeKind,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
    /// top-left, top-right, bottom-right, bottom-left
    pub corner_radii: Option<[f32; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub source: String,
    pub fit: ImageFit,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
    pub corner_radii: Option<[f32; 4]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    pub children: Vec<LayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    pub children: Vec<LayerId>,
    pub clip: bool,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
    pub corner_radii: Option<[f32; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub commands: Vec<PathCmd>,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    #[default]
    Union,
    Subtract,
    Intersect,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanGroupData {
    pub op: BooleanOp,
    pub children: Vec<LayerId>,
    pub fills: Vec<Paint>,
    pub stroke: Option<Stroke>,
}

/// The layer kinds in a document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerKind {
    Text(TextData),
    Shape(ShapeData),
    Image(ImageData),
    Group(GroupData),
    Frame(FrameData),
    Path(PathData),
    BooleanGroup(BooleanGroupData),
}

impl LayerKind {
    /// Stable tag name, also used as the id prefix for minted layers.
    pub fn tag(&self) -> &'static str {
        match self {
            LayerKind::Text(_) => "text",
            LayerKind::Shape(_) => "shape",
            LayerKind::Image(_) => "image",
            LayerKind::Group(_) => "group",
            LayerKind::Frame(_) => "frame",
            LayerKind::Path(_) => "path",
            LayerKind::BooleanGroup(_) => "boolean-group",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            LayerKind::BooleanGroup(_) => "boolean",
            other => other.tag(),
        }
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────

/// A single node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub transform: Transform,
    pub opacity: f32,
    pub visible: bool,
    pub locked: bool,
    /// Semantic labels for broadcast addressing. Not unique.
    pub tags: SmallVec<[String; 2]>,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Build a layer with an explicit id and safe defaults.
    pub fn new(id: LayerId, kind: LayerKind) -> Self {
        let name = default_name(&kind);
        Self {
            id,
            name,
            transform: Transform::default(),
            opacity: 1.0,
            visible: true,
            locked: false,
            tags: SmallVec::new(),
            kind,
        }
    }

    /// Build a layer with a freshly minted id.
    pub fn with_fresh_id(kind: LayerKind) -> Self {
        let id = LayerId::fresh(kind.id_prefix());
        Self::new(id, kind)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_fresh_id(LayerKind::Text(TextData::new(content)))
    }

    pub fn shape(shape: ShapeKind, width: f32, height: f32) -> Self {
        let mut layer = Self::with_fresh_id(LayerKind::Shape(ShapeData {
            shape,
            fills: vec![Paint::solid(Color::rgba(0.85, 0.85, 0.85, 1.0))],
            stroke: None,
            corner_radii: None,
        }));
        layer.transform = Transform::sized(width, height);
        layer
    }

    pub fn image(source: impl Into<String>, width: f32, height: f32) -> Self {
        let mut layer = Self::with_fresh_id(LayerKind::Image(ImageData {
            source: source.into(),
            fit: ImageFit::Cover,
            fills: Vec::new(),
            stroke: None,
            corner_radii: None,
        }));
        layer.transform = Transform::sized(width, height);
        layer
    }

    pub fn group() -> Self {
        Self::with_fresh_id(LayerKind::Group(GroupData::default()))
    }

    pub fn frame(width: f32, height: f32) -> Self {
        let mut layer = Self::with_fresh_id(LayerKind::Frame(FrameData {
            children: Vec::new(),
            clip: true,
            fills: vec![Paint::solid(Color::WHITE)],
            stroke: None,
            corner_radii: None,
        }));
        layer.transform = Transform::sized(width, height);
        layer
    }

    pub fn path(commands: Vec<PathCmd>) -> Self {
        Self::with_fresh_id(LayerKind::Path(PathData {
            commands,
            fills: Vec::new(),
            stroke: Some(Stroke::default()),
        }))
    }

    pub fn boolean_group(op: BooleanOp) -> Self {
        Self::with_fresh_id(LayerKind::BooleanGroup(BooleanGroupData {
            op,
            children: Vec::new(),
            fills: vec![Paint::solid(Color::BLACK)],
            stroke: None,
        }))
    }

    // ── builder helpers ──

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn tagged<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.position = Vec2::new(x, y);
        self
    }

    /// Replace the fill list with a single paint. No-op for kinds
    /// without fills.
    #[must_use]
    pub fn filled(mut self, paint: Paint) -> Self {
        if let Some(fills) = self.fills_mut() {
            *fills = vec![paint];
        }
        self
    }

    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    // ── accessors ──

    pub fn kind_tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_container(&self) -> bool {
        self.children().is_some()
    }

    /// Ordered child ids, for container kinds.
    pub fn children(&self) -> Option<&[LayerId]> {
        match &self.kind {
            LayerKind::Group(g) => Some(&g.children),
            LayerKind::Frame(f) => Some(&f.children),
            LayerKind::BooleanGroup(b) => Some(&b.children),
            LayerKind::Text(_) | LayerKind::Shape(_) | LayerKind::Image(_) | LayerKind::Path(_) => {
                None
            }
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<LayerId>> {
        match &mut self.kind {
            LayerKind::Group(g) => Some(&mut g.children),
            LayerKind::Frame(f) => Some(&mut f.children),
            LayerKind::BooleanGroup(b) => Some(&mut b.children),
            LayerKind::Text(_) | LayerKind::Shape(_) | LayerKind::Image(_) | LayerKind::Path(_) => {
                None
            }
        }
    }

    pub fn fills(&self) -> Option<&[Paint]> {
        match &self.kind {
            LayerKind::Shape(s) => Some(&s.fills),
            LayerKind::Image(i) => Some(&i.fills),
            LayerKind::Frame(f) => Some(&f.fills),
            LayerKind::Path(p) => Some(&p.fills),
            LayerKind::BooleanGroup(b) => Some(&b.fills),
            LayerKind::Text(_) | LayerKind::Group(_) => None,
        }
    }

    pub fn fills_mut(&mut self) -> Option<&mut Vec<Paint>> {
        match &mut self.kind {
            LayerKind::Shape(s) => Some(&mut s.fills),
            LayerKind::Image(i) => Some(&mut i.fills),
            LayerKind::Frame(f) => Some(&mut f.fills),
            LayerKind::Path(p) => Some(&mut p.fills),
            LayerKind::BooleanGroup(b) => Some(&mut b.fills),
            LayerKind::Text(_) | LayerKind::Group(_) => None,
        }
    }

    pub fn stroke(&self) -> Option<&Option<Stroke>> {
        match &self.kind {
            LayerKind::Shape(s) => Some(&s.stroke),
            LayerKind::Image(i) => Some(&i.stroke),
            LayerKind::Frame(f) => Some(&f.stroke),
            LayerKind::Path(p) => Some(&p.stroke),
            LayerKind::BooleanGroup(b) => Some(&b.stroke),
            LayerKind::Text(_) | LayerKind::Group(_) => None,
        }
    }

    pub fn stroke_mut(&mut self) -> Option<&mut Option<Stroke>> {
        match &mut self.kind {
            LayerKind::Shape(s) => Some(&mut s.stroke),
            LayerKind::Image(i) => Some(&mut i.stroke),
            LayerKind::Frame(f) => Some(&mut f.stroke),
            LayerKind::Path(p) => Some(&mut p.stroke),
            LayerKind::BooleanGroup(b) => Some(&mut b.stroke),
            LayerKind::Text(_) | LayerKind::Group(_) => None,
        }
    }

    pub fn corner_radii(&self) -> Option<&Option<[f32; 4]>> {
        match &self.kind {
            LayerKind::Shape(s) => Some(&s.corner_radii),
            LayerKind::Image(i) => Some(&i.corner_radii),
            LayerKind::Frame(f) => Some(&f.corner_radii),
            LayerKind::Text(_)
            | LayerKind::Group(_)
            | LayerKind::Path(_)
            | LayerKind::BooleanGroup(_) => None,
        }
    }

    pub fn corner_radii_mut(&mut self) -> Option<&mut Option<[f32; 4]>> {
        match &mut self.kind {
            LayerKind::Shape(s) => Some(&mut s.corner_radii),
            LayerKind::Image(i) => Some(&mut i.corner_radii),
            LayerKind::Frame(f) => Some(&mut f.corner_radii),
            LayerKind::Text(_)
            | LayerKind::Group(_)
            | LayerKind::Path(_)
            | LayerKind::BooleanGroup(_) => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind {
            LayerKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            LayerKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The gradient of the primary fill, if it is one.
    pub fn primary_gradient_mut(&mut self) -> Option<&mut Gradient> {
        match self.fills_mut()?.first_mut()? {
            Paint::Gradient(g) => Some(g),
            Paint::Solid { .. } => None,
        }
    }

    /// Set opacity, clamped into [0, 1]. NaN reads as fully opaque.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }
}

fn default_name(kind: &LayerKind) -> String {
    match kind {
        LayerKind::Text(t) => {
            let first = t.content.lines().next().unwrap_or("").trim();
            if first.is_empty() {
                "Text".into()
            } else {
                first.chars().take(32).collect()
            }
        }
        LayerKind::Shape(s) => match s.shape {
            ShapeKind::Rect => "Rectangle".into(),
            ShapeKind::Ellipse => "Ellipse".into(),
            ShapeKind::Polygon { .. } => "Polygon".into(),
            ShapeKind::Line => "Line".into(),
        },
        LayerKind::Image(_) => "Image".into(),
        LayerKind::Group(_) => "Group".into(),
        LayerKind::Frame(_) => "Frame".into(),
        LayerKind::Path(_) => "Path".into(),
        LayerKind::BooleanGroup(_) => "Boolean".into(),
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// A shallow partial of a layer, merged by `update_layer`.
///
/// Fields that do not exist on the target kind are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub transform: Option<Transform>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub tags: Option<SmallVec<[String; 2]>>,
    pub content: Option<String>,
    pub text_style: Option<TextStyle>,
    pub fills: Option<Vec<Paint>>,
    pub stroke: Option<Option<Stroke>>,
    pub corner_radii: Option<Option<[f32; 4]>>,
}

impl LayerPatch {
    /// Whether this patch touches structural fields.
    pub fn is_structural(&self) -> bool {
        self.transform.is_some()
    }

    /// Drop the structural fields, keeping cosmetic ones.
    #[must_use]
    pub fn cosmetic_only(mut self) -> Self {
        self.transform = None;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == LayerPatch::default()
    }

    /// Merge onto `layer`. Opacity is clamped into [0, 1].
    pub fn merge_into(&self, layer: &mut Layer) {
        if let Some(name) = &self.name {
            layer.name = name.clone();
        }
        if let Some(transform) = self.transform {
            layer.transform = transform;
        }
        if let Some(opacity) = self.opacity {
            layer.set_opacity(opacity);
        }
        if let Some(visible) = self.visible {
            layer.visible = visible;
        }
        if let Some(locked) = self.locked {
            layer.locked = locked;
        }
        if let Some(tags) = &self.tags {
            layer.tags = tags.clone();
        }
        if let Some(text) = layer.text_data_mut() {
            if let Some(content) = &self.content {
                text.set_content(content.clone());
            }
            if let Some(style) = &self.text_style {
                text.style = style.clone();
            }
        }
        if let (Some(fills), Some(slot)) = (&self.fills, layer.fills_mut()) {
            *slot = fills.clone();
        }
        if let (Some(stroke), Some(slot)) = (&self.stroke, layer.stroke_mut()) {
            *slot = stroke.clone();
        }
        if let (Some(radii), Some(slot)) = (&self.corner_radii, layer.corner_radii_mut()) {
            *slot = *radii;
        }
    }
}
