//! Integer and floating point geometry primitives.

use wc_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry};

macro_rules! geometry_types {
    ($(
        $(#[$attr:meta])*
        $name:ident { $($field:ident: $ty:ty),+ $(,)? }
    )+) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Default)]
            pub struct $name {
                $(pub $field: $ty,)+
            }

            impl $name {
                #[inline]
                pub const fn new($($field: $ty),+) -> Self {
                    Self { $($field),+ }
                }
            }

            impl GetTypeMeta for $name {
                fn get_type_meta() -> TypeMeta {
                    TypeMeta::opaque::<Self>().with_default::<Self>()
                }
            }
        )+

        /// Registers every geometry type.
        pub(crate) fn register_types(registry: &mut TypeRegistry) {
            $(registry.register::<$name>();)+
        }
    };
}

geometry_types! {
    Size { width: i32, height: i32 }
    SizeF { width: f64, height: f64 }
    Point { x: i32, y: i32 }
    PointF { x: f64, y: f64 }
    /// A segment from `p1` to `p2`.
    Line { p1: Point, p2: Point }
    LineF { p1: PointF, p2: PointF }
    /// An axis aligned rectangle anchored at its top left corner.
    Rect { top_left: Point, size: Size }
    RectF { top_left: PointF, size: SizeF }
}

impl Rect {
    /// The rectangle spanned from `top_left` to `bottom_right`.
    pub const fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            size: Size::new(bottom_right.x - top_left.x, bottom_right.y - top_left.y),
        }
    }

    pub const fn bottom_right(&self) -> Point {
        Point::new(self.top_left.x + self.size.width, self.top_left.y + self.size.height)
    }
}

impl RectF {
    pub fn from_corners(top_left: PointF, bottom_right: PointF) -> Self {
        Self {
            top_left,
            size: SizeF::new(bottom_right.x - top_left.x, bottom_right.y - top_left.y),
        }
    }

    pub fn bottom_right(&self) -> PointF {
        PointF::new(self.top_left.x + self.size.width, self.top_left.y + self.size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners() {
        let rect = Rect::from_corners(Point::new(1, 2), Point::new(4, 8));
        assert_eq!(rect.size, Size::new(3, 6));
        assert_eq!(rect.bottom_right(), Point::new(4, 8));

        let rect = RectF::from_corners(PointF::new(0.5, 0.0), PointF::new(1.0, 2.0));
        assert_eq!(rect.size, SizeF::new(0.5, 2.0));
    }
}
