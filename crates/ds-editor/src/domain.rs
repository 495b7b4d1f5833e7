//! Value decoding for patch ops.
//!
//! Turns a JSON value into a write on one layer property. Numbers and
//! colors outside their range are clamped and reported; values of the
//! wrong shape and unknown enum names are errors.

use ds_core::model::{Color, GradientType, Layer, Paint, Stroke, TextAlign, Transform, Vec2};
use ds_core::path::{Axis, Channel, PaintField, PropertyPath, StrokeField, TextField, TransformField};
use serde_json::{Value, json};

/// A value that was written after clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct Clamp {
    pub requested: Value,
    pub applied: Value,
}

type DomainResult = Result<Option<Clamp>, String>;

const FONT_SIZE: (f32, f32) = (1.0, 1000.0);
const FONT_WEIGHT: (f32, f32) = (100.0, 900.0);
const LINE_HEIGHT: (f32, f32) = (0.5, 10.0);
const LETTER_SPACING: (f32, f32) = (-100.0, 100.0);
const STROKE_WIDTH: (f32, f32) = (0.0, 1000.0);

/// Write `value` to `path` on `layer`. `layer` is left untouched on error.
pub fn apply_value(layer: &mut Layer, path: &PropertyPath, value: &Value) -> DomainResult {
    match path {
        PropertyPath::Name => {
            layer.name = string(value)?;
            Ok(None)
        }
        PropertyPath::Visible => {
            layer.visible = boolean(value)?;
            Ok(None)
        }
        PropertyPath::Opacity => {
            let (v, clamp) = ranged(value, 0.0, 1.0)?;
            layer.opacity = v;
            Ok(clamp)
        }
        PropertyPath::Transform(field) => apply_transform(&mut layer.transform, *field, value),
        PropertyPath::Fills => {
            let items = value.as_array().ok_or("expected an array of paints")?;
            let mut clamps = None;
            let mut paints = Vec::with_capacity(items.len());
            for item in items {
                let (paint, changed) = paint(item)?;
                if changed {
                    clamps = Some(Clamp {
                        requested: value.clone(),
                        applied: Value::Null,
                    });
                }
                paints.push(paint);
            }
            let fills = layer.fills_mut().ok_or("layer has no fills")?;
            *fills = paints;
            Ok(clamps.map(|c| Clamp {
                applied: json!(fills.iter().map(paint_json).collect::<Vec<_>>()),
                ..c
            }))
        }
        PropertyPath::Fill(index, field) => apply_fill(layer, *index, *field, value),
        PropertyPath::Stroke(field) => apply_stroke(layer, *field, value),
        PropertyPath::CornerRadii => {
            let radii = match value {
                Value::Null => None,
                Value::Number(_) => {
                    let (r, _) = ranged(value, 0.0, f32::MAX)?;
                    Some([r; 4])
                }
                Value::Array(items) if items.len() == 4 => {
                    let mut out = [0.0; 4];
                    for (slot, item) in out.iter_mut().zip(items) {
                        *slot = number(item)?.max(0.0);
                    }
                    Some(out)
                }
                _ => return Err("expected a radius or four radii".into()),
            };
            let slot = layer.corner_radii_mut().ok_or("layer has no corner radii")?;
            *slot = radii;
            Ok(None)
        }
        PropertyPath::Text(field) => apply_text(layer, *field, value),
    }
}

fn apply_transform(t: &mut Transform, field: TransformField, value: &Value) -> DomainResult {
    match field {
        TransformField::All => {
            let next: Transform =
                serde_json::from_value(value.clone()).map_err(|e| format!("bad transform: {e}"))?;
            let clamped = next.size.x < 0.0 || next.size.y < 0.0;
            *t = Transform {
                size: Vec2::new(next.size.x.max(0.0), next.size.y.max(0.0)),
                ..next
            };
            Ok(clamped.then(|| Clamp {
                requested: value.clone(),
                applied: json!(t),
            }))
        }
        TransformField::Position(None) => {
            t.position = vec2(value)?;
            Ok(None)
        }
        TransformField::Position(Some(axis)) => {
            *axis_mut(&mut t.position, axis) = number(value)?;
            Ok(None)
        }
        TransformField::Size(None) => {
            let size = vec2(value)?;
            t.size = Vec2::new(size.x.max(0.0), size.y.max(0.0));
            let clamped = size != t.size;
            Ok(clamped.then(|| Clamp {
                requested: value.clone(),
                applied: json!(t.size),
            }))
        }
        TransformField::Size(Some(axis)) => {
            let (v, clamp) = ranged(value, 0.0, f32::MAX)?;
            *axis_mut(&mut t.size, axis) = v;
            Ok(clamp)
        }
        TransformField::Rotation => {
            t.rotation = number(value)?;
            Ok(None)
        }
        TransformField::SkewX => {
            t.skew_x = number(value)?;
            Ok(None)
        }
        TransformField::SkewY => {
            t.skew_y = number(value)?;
            Ok(None)
        }
    }
}

fn apply_fill(layer: &mut Layer, index: usize, field: PaintField, value: &Value) -> DomainResult {
    let fills = layer.fills_mut().ok_or("layer has no fills")?;
    if field == PaintField::Paint {
        let (paint, changed) = paint(value)?;
        let applied = paint_json(&paint);
        if index < fills.len() {
            fills[index] = paint;
        } else if index == fills.len() {
            fills.push(paint);
        } else {
            return Err(format!("fill index {index} out of bounds"));
        }
        return Ok(changed.then(|| Clamp {
            requested: value.clone(),
            applied,
        }));
    }

    let slot = fills
        .get_mut(index)
        .ok_or_else(|| format!("fill index {index} out of bounds"))?;
    match field {
        PaintField::Paint => Ok(None),
        PaintField::Color => {
            let (c, changed) = color(value)?;
            match slot {
                Paint::Solid { color } => *color = c,
                Paint::Gradient(_) => return Err("fill is a gradient, not a solid color".into()),
            }
            Ok(changed.then(|| Clamp {
                requested: value.clone(),
                applied: json!(c.to_hex()),
            }))
        }
        PaintField::Channel(ch) => {
            let Paint::Solid { color } = slot else {
                return Err("fill is a gradient, not a solid color".into());
            };
            let (v, clamp) = ranged(value, 0.0, 1.0)?;
            *channel_mut(color, ch) = v;
            Ok(clamp)
        }
        PaintField::GradientType => {
            let Paint::Gradient(gradient) = slot else {
                return Err("fill is not a gradient".into());
            };
            gradient.gradient_type = match string(value)?.as_str() {
                "linear" => GradientType::Linear,
                "radial" => GradientType::Radial,
                other => return Err(format!("unknown gradient type `{other}`")),
            };
            Ok(None)
        }
    }
}

fn apply_stroke(layer: &mut Layer, field: StrokeField, value: &Value) -> DomainResult {
    let slot = layer.stroke_mut().ok_or("layer has no stroke")?;
    match field {
        StrokeField::Stroke => {
            let next = match value {
                Value::Null => None,
                Value::String(_) => {
                    let (c, _) = color(value)?;
                    let mut stroke = slot.clone().unwrap_or_default();
                    stroke.paint = Paint::solid(c);
                    Some(stroke)
                }
                _ => {
                    let stroke: Stroke = serde_json::from_value(value.clone())
                        .map_err(|e| format!("bad stroke: {e}"))?;
                    let (paint, paint_changed) = clamp_paint(stroke.paint);
                    let width = stroke.width.clamp(STROKE_WIDTH.0, STROKE_WIDTH.1);
                    let next = Stroke {
                        paint,
                        width,
                        ..stroke
                    };
                    if paint_changed || width != stroke.width {
                        let applied = json!(next);
                        *slot = Some(next);
                        return Ok(Some(Clamp {
                            requested: value.clone(),
                            applied,
                        }));
                    }
                    Some(next)
                }
            };
            *slot = next;
            Ok(None)
        }
        StrokeField::Color => {
            let stroke = slot.as_mut().ok_or("layer has no stroke")?;
            let (c, changed) = color(value)?;
            stroke.paint = Paint::solid(c);
            Ok(changed.then(|| Clamp {
                requested: value.clone(),
                applied: json!(c.to_hex()),
            }))
        }
        StrokeField::Width => {
            let stroke = slot.as_mut().ok_or("layer has no stroke")?;
            let (w, clamp) = ranged(value, STROKE_WIDTH.0, STROKE_WIDTH.1)?;
            stroke.width = w;
            Ok(clamp)
        }
    }
}

fn apply_text(layer: &mut Layer, field: TextField, value: &Value) -> DomainResult {
    let text = layer.text_data_mut().ok_or("layer is not text")?;
    match field {
        TextField::Content => {
            text.set_content(string(value)?);
            Ok(None)
        }
        TextField::FontFamily => {
            let family = string(value)?;
            if family.trim().is_empty() {
                return Err("font family must not be empty".into());
            }
            text.style.font_family = family;
            Ok(None)
        }
        TextField::FontSize => {
            let (v, clamp) = ranged(value, FONT_SIZE.0, FONT_SIZE.1)?;
            text.style.font_size = v;
            Ok(clamp)
        }
        TextField::FontWeight => {
            let weight = match value {
                Value::String(s) => named_weight(s).ok_or_else(|| format!("unknown font weight `{s}`"))?,
                _ => number(value)?,
            };
            let applied = (weight.clamp(FONT_WEIGHT.0, FONT_WEIGHT.1) / 100.0).round() * 100.0;
            text.style.font_weight = applied as u16;
            Ok((applied != weight).then(|| Clamp {
                requested: value.clone(),
                applied: json!(text.style.font_weight),
            }))
        }
        TextField::Color => {
            let (c, changed) = color(value)?;
            text.style.color = c;
            Ok(changed.then(|| Clamp {
                requested: value.clone(),
                applied: json!(c.to_hex()),
            }))
        }
        TextField::Align => {
            let name = string(value)?;
            text.style.align =
                TextAlign::from_name(&name).ok_or_else(|| format!("unknown alignment `{name}`"))?;
            Ok(None)
        }
        TextField::LineHeight => {
            let (v, clamp) = ranged(value, LINE_HEIGHT.0, LINE_HEIGHT.1)?;
            text.style.line_height = v;
            Ok(clamp)
        }
        TextField::LetterSpacing => {
            let (v, clamp) = ranged(value, LETTER_SPACING.0, LETTER_SPACING.1)?;
            text.style.letter_spacing = v;
            Ok(clamp)
        }
        TextField::Italic => {
            text.style.italic = boolean(value)?;
            Ok(None)
        }
    }
}

// ─── Reading ─────────────────────────────────────────────────────────────

/// Current value at `path`, in the shape `apply_value` accepts. `None`
/// when the path does not apply to the layer.
pub fn read_value(layer: &Layer, path: &PropertyPath) -> Option<Value> {
    if !path.applies_to(layer) {
        return None;
    }
    let t = &layer.transform;
    let value = match path {
        PropertyPath::Name => json!(layer.name),
        PropertyPath::Visible => json!(layer.visible),
        PropertyPath::Opacity => json!(layer.opacity),
        PropertyPath::Transform(field) => match field {
            TransformField::All => serde_json::to_value(t).ok()?,
            TransformField::Position(None) => json!(t.position),
            TransformField::Position(Some(axis)) => json!(axis_of(&t.position, *axis)),
            TransformField::Size(None) => json!(t.size),
            TransformField::Size(Some(axis)) => json!(axis_of(&t.size, *axis)),
            TransformField::Rotation => json!(t.rotation),
            TransformField::SkewX => json!(t.skew_x),
            TransformField::SkewY => json!(t.skew_y),
        },
        PropertyPath::Fills => json!(layer.fills()?.iter().map(paint_json).collect::<Vec<_>>()),
        PropertyPath::Fill(index, field) => {
            let paint = layer.fills()?.get(*index)?;
            match field {
                PaintField::Paint => paint_json(paint),
                PaintField::Color => json!(paint.solid_color()?.to_hex()),
                PaintField::Channel(ch) => {
                    let c = paint.solid_color()?;
                    json!(match ch {
                        Channel::R => c.r,
                        Channel::G => c.g,
                        Channel::B => c.b,
                        Channel::A => c.a,
                    })
                }
                PaintField::GradientType => match paint {
                    Paint::Gradient(g) => serde_json::to_value(g.gradient_type).ok()?,
                    Paint::Solid { .. } => return None,
                },
            }
        }
        PropertyPath::Stroke(field) => {
            let stroke = layer.stroke()?.as_ref();
            match field {
                StrokeField::Stroke => match stroke {
                    Some(s) => serde_json::to_value(s).ok()?,
                    None => Value::Null,
                },
                StrokeField::Color => json!(stroke?.paint.solid_color()?.to_hex()),
                StrokeField::Width => json!(stroke?.width),
            }
        }
        PropertyPath::CornerRadii => json!(layer.corner_radii()?),
        PropertyPath::Text(field) => {
            let text = layer.text_data()?;
            let style = &text.style;
            match field {
                TextField::Content => json!(text.content),
                TextField::FontFamily => json!(style.font_family),
                TextField::FontSize => json!(style.font_size),
                TextField::FontWeight => json!(style.font_weight),
                TextField::Color => json!(style.color.to_hex()),
                TextField::Align => json!(style.align.name()),
                TextField::LineHeight => json!(style.line_height),
                TextField::LetterSpacing => json!(style.letter_spacing),
                TextField::Italic => json!(style.italic),
            }
        }
    };
    Some(value)
}

fn axis_of(v: &Vec2, axis: Axis) -> f32 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
    }
}

// ─── Scalar decoders ─────────────────────────────────────────────────────

fn float(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| format!("expected a number, got {value}"))
}

/// Magnitudes beyond `f32` saturate instead of becoming infinite.
fn number(value: &Value) -> Result<f32, String> {
    Ok(float(value)?.clamp(f32::MIN as f64, f32::MAX as f64) as f32)
}

fn ranged(value: &Value, min: f32, max: f32) -> Result<(f32, Option<Clamp>), String> {
    let v = float(value)?;
    let clamped = v.clamp(min as f64, max as f64);
    let applied = clamped as f32;
    let clamp = (clamped != v).then(|| Clamp {
        requested: value.clone(),
        applied: json!(applied),
    });
    Ok((applied, clamp))
}

fn boolean(value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("expected a boolean, got {value}"))
}

fn string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("expected a string, got {value}"))
}

fn vec2(value: &Value) -> Result<Vec2, String> {
    let get = |keys: [&str; 2]| {
        keys.iter()
            .find_map(|k| value.get(*k))
            .ok_or_else(|| format!("expected {{x, y}}, got {value}"))
            .and_then(number)
    };
    Ok(Vec2::new(get(["x", "width"])?, get(["y", "height"])?))
}

/// A hex string or an `{r, g, b, a?}` record. Returns whether any
/// channel was clamped.
fn color(value: &Value) -> Result<(Color, bool), String> {
    match value {
        Value::String(s) => Color::from_hex(s)
            .map(|c| (c, false))
            .ok_or_else(|| format!("invalid hex color `{s}`")),
        Value::Object(_) => {
            let channel = |k: &str| value.get(k).map(number).transpose();
            let c = Color::rgba(
                channel("r")?.ok_or("missing channel r")?,
                channel("g")?.ok_or("missing channel g")?,
                channel("b")?.ok_or("missing channel b")?,
                channel("a")?.unwrap_or(1.0),
            );
            Ok(c.clamped())
        }
        _ => Err(format!("expected a color, got {value}")),
    }
}

/// A hex string (solid) or a serialized paint.
fn paint(value: &Value) -> Result<(Paint, bool), String> {
    if value.is_string() {
        let (c, changed) = color(value)?;
        return Ok((Paint::solid(c), changed));
    }
    let paint: Paint = serde_json::from_value(value.clone()).map_err(|e| format!("bad paint: {e}"))?;
    Ok(clamp_paint(paint))
}

/// Clamp color channels and stop offsets. Returns whether anything moved.
fn clamp_paint(paint: Paint) -> (Paint, bool) {
    match paint {
        Paint::Solid { color } => {
            let (c, changed) = color.clamped();
            (Paint::solid(c), changed)
        }
        Paint::Gradient(mut g) => {
            let mut changed = false;
            for stop in &mut g.stops {
                let (c, stop_changed) = stop.color.clamped();
                stop.color = c;
                let offset = stop.offset.clamp(0.0, 1.0);
                changed |= stop_changed || offset != stop.offset;
                stop.offset = offset;
            }
            (Paint::Gradient(g), changed)
        }
    }
}

fn paint_json(paint: &Paint) -> Value {
    match paint {
        Paint::Solid { color } => json!(color.to_hex()),
        Paint::Gradient(_) => serde_json::to_value(paint).unwrap_or(Value::Null),
    }
}

fn named_weight(name: &str) -> Option<f32> {
    Some(match name {
        "thin" => 100.0,
        "light" => 300.0,
        "regular" | "normal" => 400.0,
        "medium" => 500.0,
        "semibold" => 600.0,
        "bold" => 700.0,
        "black" => 900.0,
        _ => return None,
    })
}

fn axis_mut(v: &mut Vec2, axis: Axis) -> &mut f32 {
    match axis {
        Axis::X => &mut v.x,
        Axis::Y => &mut v.y,
    }
}

fn channel_mut(c: &mut Color, ch: Channel) -> &mut f32 {
    match ch {
        Channel::R => &mut c.r,
        Channel::G => &mut c.g,
        Channel::B => &mut c.b,
        Channel::A => &mut c.a,
    }
}
