use core::any::TypeId;

use wc_reflect::{Owner, Reflect};
use wc_wire::{Tag, WireKind, WireValue};

use super::registered;
use crate::converter::{expect_array, expect_value, take_value};
use crate::types::geometry::{Line, LineF, Point, PointF, Rect, RectF, Size, SizeF};
use crate::{Error, SerializationHelper, TypeConverter};

/// Converts the [`types::geometry`](crate::types::geometry) primitives to
/// tagged two element arrays.
///
/// Sizes and points hold two numbers, lines their two end points and
/// rectangles their top left corner and size. Erased values are read as
/// the floating point variants.
pub struct GeometryConverter;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum Shape {
    Size,
    SizeF,
    Point,
    PointF,
    Line,
    LineF,
    Rect,
    RectF,
}

pub(super) fn classify(ty: TypeId) -> Option<Shape> {
    [
        (TypeId::of::<Size>(), Shape::Size),
        (TypeId::of::<SizeF>(), Shape::SizeF),
        (TypeId::of::<Point>(), Shape::Point),
        (TypeId::of::<PointF>(), Shape::PointF),
        (TypeId::of::<Line>(), Shape::Line),
        (TypeId::of::<LineF>(), Shape::LineF),
        (TypeId::of::<Rect>(), Shape::Rect),
        (TypeId::of::<RectF>(), Shape::RectF),
    ]
    .into_iter()
    .find_map(|(of, shape)| (of == ty).then_some(shape))
}

impl Shape {
    fn tag(self) -> Tag {
        match self {
            Shape::Size | Shape::SizeF => Tag::GEOM_SIZE,
            Shape::Point | Shape::PointF => Tag::GEOM_POINT,
            Shape::Line | Shape::LineF => Tag::GEOM_LINE,
            Shape::Rect | Shape::RectF => Tag::GEOM_RECT,
        }
    }
}

// -----------------------------------------------------------------------------
// Coordinates

/// A number stored in a geometry primitive.
pub(super) trait Coordinate: Copy + Into<WireValue> {
    fn read(value: &WireValue) -> Result<Self, Error>;
}

impl Coordinate for i32 {
    fn read(value: &WireValue) -> Result<Self, Error> {
        let Some(value) = value.as_integer() else {
            return Err(Error::deserialization(format!(
                "Expected integer, but got {}",
                value.kind()
            )));
        };
        i32::try_from(value)
            .map_err(|_| Error::deserialization(format!("Value {value} is out of range for type i32")))
    }
}

impl Coordinate for f64 {
    fn read(value: &WireValue) -> Result<Self, Error> {
        value.as_f64().ok_or_else(|| {
            Error::deserialization(format!("Expected double, but got {}", value.kind()))
        })
    }
}

fn numbers<T: Coordinate>(tag: Tag, a: T, b: T) -> WireValue {
    WireValue::tagged(tag, vec![a.into(), b.into()])
}

/// Writes two nested primitives through the helper.
fn nested<A: Reflect, B: Reflect>(
    helper: &dyn SerializationHelper,
    tag: Tag,
    (a_name, a): (&str, &A),
    (b_name, b): (&str, &B),
) -> Result<WireValue, Error> {
    let a = helper.serialize_subtype(TypeId::of::<A>(), a, a_name)?;
    let b = helper.serialize_subtype(TypeId::of::<B>(), b, b_name)?;
    Ok(WireValue::tagged(tag, vec![a, b]))
}

/// Reads a nested primitive through the helper.
pub(super) fn read_nested<T: Reflect>(
    helper: &dyn SerializationHelper,
    value: &WireValue,
    name: &str,
) -> Result<T, Error> {
    take_value(helper.deserialize_subtype(TypeId::of::<T>(), value, None, name)?)
}

// -----------------------------------------------------------------------------
// Converter

impl GeometryConverter {
    fn read(
        &self,
        shape: Shape,
        items: &[WireValue],
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let [a, b] = items else {
            let message = match shape {
                Shape::Size | Shape::SizeF => "A size requires an array with exactly two numbers",
                Shape::Point | Shape::PointF => "A point requires an array with exactly two numbers",
                Shape::Line | Shape::LineF => "A line requires an array with exactly two points",
                Shape::Rect | Shape::RectF => {
                    "A rectangle requires an array with exactly a point and a size"
                }
            };
            return Err(Error::deserialization(message));
        };
        Ok(match shape {
            Shape::Size => Box::new(Size::new(i32::read(a)?, i32::read(b)?)),
            Shape::SizeF => Box::new(SizeF::new(f64::read(a)?, f64::read(b)?)),
            Shape::Point => Box::new(Point::new(i32::read(a)?, i32::read(b)?)),
            Shape::PointF => Box::new(PointF::new(f64::read(a)?, f64::read(b)?)),
            Shape::Line => Box::new(Line::new(
                read_nested(helper, a, "p1")?,
                read_nested(helper, b, "p2")?,
            )),
            Shape::LineF => Box::new(LineF::new(
                read_nested(helper, a, "p1")?,
                read_nested(helper, b, "p2")?,
            )),
            Shape::Rect => Box::new(Rect::new(
                read_nested(helper, a, "topLeft")?,
                read_nested(helper, b, "size")?,
            )),
            Shape::RectF => Box::new(RectF::new(
                read_nested(helper, a, "topLeft")?,
                read_nested(helper, b, "size")?,
            )),
        })
    }
}

impl TypeConverter for GeometryConverter {
    fn name(&self) -> &'static str {
        "GeometryConverter"
    }

    fn can_convert(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> bool {
        classify(ty).is_some()
    }

    fn allowed_tags(&self, ty: TypeId, _helper: &dyn SerializationHelper) -> Vec<Option<Tag>> {
        classify(ty).map(|shape| Some(shape.tag())).into_iter().collect()
    }

    fn allowed_kinds(
        &self,
        _ty: TypeId,
        _tag: Option<Tag>,
        _helper: &dyn SerializationHelper,
    ) -> Vec<WireKind> {
        vec![WireKind::Array]
    }

    fn guess_type(
        &self,
        tag: Option<Tag>,
        kind: WireKind,
        helper: &dyn SerializationHelper,
    ) -> Option<TypeId> {
        if kind != WireKind::Array {
            return None;
        }
        let ty = match tag? {
            Tag::GEOM_SIZE => TypeId::of::<SizeF>(),
            Tag::GEOM_POINT => TypeId::of::<PointF>(),
            Tag::GEOM_LINE => TypeId::of::<LineF>(),
            Tag::GEOM_RECT => TypeId::of::<RectF>(),
            _ => return None,
        };
        registered(helper, ty)
    }

    fn serialize(
        &self,
        ty: TypeId,
        value: &dyn Reflect,
        helper: &dyn SerializationHelper,
    ) -> Result<WireValue, Error> {
        let Some(shape) = classify(ty) else {
            return Err(Error::serialization(format!(
                "{} is not a geometry type",
                helper.type_name(ty)
            )));
        };
        let tag = shape.tag();
        match shape {
            Shape::Size => {
                let size = expect_value::<Size>(value)?;
                Ok(numbers(tag, size.width, size.height))
            }
            Shape::SizeF => {
                let size = expect_value::<SizeF>(value)?;
                Ok(numbers(tag, size.width, size.height))
            }
            Shape::Point => {
                let point = expect_value::<Point>(value)?;
                Ok(numbers(tag, point.x, point.y))
            }
            Shape::PointF => {
                let point = expect_value::<PointF>(value)?;
                Ok(numbers(tag, point.x, point.y))
            }
            Shape::Line => {
                let line = expect_value::<Line>(value)?;
                nested(helper, tag, ("p1", &line.p1), ("p2", &line.p2))
            }
            Shape::LineF => {
                let line = expect_value::<LineF>(value)?;
                nested(helper, tag, ("p1", &line.p1), ("p2", &line.p2))
            }
            Shape::Rect => {
                let rect = expect_value::<Rect>(value)?;
                nested(helper, tag, ("topLeft", &rect.top_left), ("size", &rect.size))
            }
            Shape::RectF => {
                let rect = expect_value::<RectF>(value)?;
                nested(helper, tag, ("topLeft", &rect.top_left), ("size", &rect.size))
            }
        }
    }

    fn deserialize_cbor(
        &self,
        ty: TypeId,
        value: &WireValue,
        _owner: Option<&Owner>,
        helper: &dyn SerializationHelper,
    ) -> Result<Box<dyn Reflect>, Error> {
        let shape = classify(ty).ok_or_else(|| {
            Error::deserialization(format!("{} is not a geometry type", helper.type_name(ty)))
        })?;
        let items = expect_array(value, helper.type_name(ty))?;
        self.read(shape, items, helper)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::converters::LegacyGeometryConverter;
    use crate::testing::*;
    use crate::{Dynamic, SerializerBuilder};

    #[test]
    fn tagged_arrays() {
        let serializer = serializer().build();
        let wire = serializer.serialize(&Size::new(3, 4)).unwrap();
        assert_eq!(
            wire,
            WireValue::tagged(Tag::GEOM_SIZE, vec![WireValue::from(3), WireValue::from(4)])
        );

        let rect = Rect::from_corners(Point::new(1, 2), Point::new(4, 8));
        let json = serializer.to_json(&rect).unwrap();
        assert_eq!(json, json!([[1, 2], [3, 6]]));
        assert_eq!(serializer.from_json::<Rect>(&json).unwrap(), rect);

        let line = LineF::new(PointF::new(0.5, 1.0), PointF::new(2.0, 2.5));
        let wire = serializer.serialize(&line).unwrap();
        assert_eq!(serializer.deserialize::<LineF>(&wire).unwrap(), line);
    }

    #[test]
    fn number_kinds() {
        let serializer = serializer().build();
        assert_eq!(
            serializer.from_json::<PointF>(&json!([1, 2.5])).unwrap(),
            PointF::new(1.0, 2.5)
        );
        let err = serializer.from_json::<Point>(&json!([1, 2.5])).unwrap_err();
        assert_eq!(err.message(), "Expected integer, but got float");

        let err = serializer.from_json::<Size>(&json!([1])).unwrap_err();
        assert_eq!(err.message(), "A size requires an array with exactly two numbers");
    }

    #[test]
    fn nested_hints() {
        let serializer = serializer().build();
        let err = serializer
            .from_json::<Line>(&json!([[0, 0], [1, "x"]]))
            .unwrap_err();
        assert_eq!(err.trace()[0].name, "p2");
    }

    #[test]
    fn own_tag_only() {
        let serializer = serializer().build();
        let point = WireValue::tagged(Tag::GEOM_SIZE, vec![WireValue::from(1), WireValue::from(2)]);
        assert!(serializer.deserialize::<Point>(&point).is_err());

        let value: Dynamic = serializer.deserialize(&point).unwrap();
        assert_eq!(value.downcast_ref::<SizeF>(), Some(&SizeF::new(1.0, 2.0)));
    }

    #[test]
    fn outranks_legacy_converter_registered_first() {
        let serializer = SerializerBuilder::empty()
            .register::<Rect>()
            .register::<Point>()
            .register::<Size>()
            .converter(LegacyGeometryConverter)
            .converter(GeometryConverter)
            .build();
        let names: Vec<_> = serializer.converters().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["GeometryConverter", "LegacyGeometryConverter"]);

        let rect = Rect::from_corners(Point::new(1, 2), Point::new(4, 8));
        let wire = serializer.serialize(&rect).unwrap();
        assert_eq!(wire.tag(), Some(Tag::GEOM_RECT));
        assert_eq!(serializer.deserialize::<Rect>(&wire).unwrap(), rect);

        let json = wire.to_json();
        assert_eq!(json, json!([[1, 2], [3, 6]]));
        assert_eq!(serializer.from_json::<Rect>(&json).unwrap(), rect);
    }
}
