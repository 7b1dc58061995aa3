use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireMap, WireValue};

use super::geometry::{Coordinate, Shape, classify, read_nested};
use crate::types::geometry::{Line, LineF, Point, PointF, Rect, RectF, Size, SizeF};
use crate::{Error, Priority, SerializationHelper, TypeConverter};

/// Reads geometry primitives from the JSON objects older documents used.
///
/// | type | object |
/// |---|---|
/// | sizes | `{"width", "height"}` |
/// | points | `{"x", "y"}` |
/// | lines | `{"p1", "p2"}` |
/// | rectangles | `{"topLeft", "bottomRight"}` |
///
/// Registered at [`Priority::VERY_LOW`], so [`GeometryConverter`](super::GeometryConverter)
/// always writes. Only JSON input is read.
pub struct LegacyGeometryConverter;

/// The two entries of `map`, which must hold exactly the keys `a` and `b`.
fn entries<'m>(map: &'m WireMap, a: &str, b: &str) -> Result<(&'m WireValue, &'m WireValue), Error> {
    match (map.len(), map.get_str(a), map.get_str(b)) {
        (2, Some(first), Some(second)) => Ok((first, second)),
        _ => Err(Error::deserialization(format!(
            "JSON object has no {a} or {b} properties or does have extra properties"
        ))),
    }
}

fn numbers<T: Coordinate>(map: &WireMap, a: &str, b: &str) -> Result<(T, T), Error> {
    let (first, second) = entries(map, a, b)?;
    Ok((T::read(first)?, T::read(second)?))
}

fn nested<A: Reflect, B: Reflect>(
    helper: &dyn SerializationHelper,
    map: &WireMap,
    a: &str,
    b: &str,
) -> Result<(A, B), Error> {
    let (first, second) = entries(map, a, b)?;
    Ok((read_nested(helper, first, a)?, read_nested(helper, second, b)?))
}

impl TypeConverter for LegacyGeometryConverter {
    fn name(&self) -> &'static str {
        "LegacyGeometryConverter"
    }

    fn priority(&self) -> Priority {
        Priority::VERY_LOW
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        classify(ty).is_some()
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Map]
    }

    fn serialize(
        &self,
        _ty: TypeId,
        _value: &dyn Reflect,
        _helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        Err(Error::serialization("The legacy geometry converter cannot serialize data"))
    }

    fn deserialize_cbor(
        &self,
        _ty: TypeId,
        _value: &WireValue,
        _owner: Option<&Owner>,
        _helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        Err(Error::deserialization(
            "The legacy geometry converter cannot deserialize CBOR data",
        ))
    }

    fn deserialize_json(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let shape = classify(ty).ok_or_else(|| {
            Error::deserialization(format!("{} is not a geometry type", helper.type_name(ty)))
        })?;
        let Some(map) = value.untagged().as_map() else {
            return Err(Error::deserialization(format!(
                "Expected a JSON object for {}, but got {}",
                helper.type_name(ty),
                value.untagged().kind()
            )));
        };

        Ok(match shape {
            Shape::Size => {
                let (width, height) = numbers(map, "width", "height")?;
                Box::new(Size::new(width, height))
            }
            Shape::SizeF => {
                let (width, height) = numbers(map, "width", "height")?;
                Box::new(SizeF::new(width, height))
            }
            Shape::Point => {
                let (x, y) = numbers(map, "x", "y")?;
                Box::new(Point::new(x, y))
            }
            Shape::PointF => {
                let (x, y) = numbers(map, "x", "y")?;
                Box::new(PointF::new(x, y))
            }
            Shape::Line => {
                let (p1, p2) = nested(helper, map, "p1", "p2")?;
                Box::new(Line::new(p1, p2))
            }
            Shape::LineF => {
                let (p1, p2) = nested(helper, map, "p1", "p2")?;
                Box::new(LineF::new(p1, p2))
            }
            Shape::Rect => {
                let (top_left, bottom_right) = nested(helper, map, "topLeft", "bottomRight")?;
                Box::new(Rect::from_corners(top_left, bottom_right))
            }
            Shape::RectF => {
                let (top_left, bottom_right) = nested(helper, map, "topLeft", "bottomRight")?;
                Box::new(RectF::from_corners(top_left, bottom_right))
            }
        })
    }
}
