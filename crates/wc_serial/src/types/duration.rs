//! Integer durations with a fixed unit.
//!
//! Each unit is its own type, so a stored count keeps its meaning. A
//! duration written with a coarser unit can be read into a finer one.
//! Conversions into [`chrono::TimeDelta`] saturate beyond ±292 years.

use core::any::TypeId;

use wc_reflect::Reflect;
use wc_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use wc_wire::Tag;

/// Static description of one duration type.
pub(crate) struct UnitInfo {
    pub type_id: TypeId,
    pub tag: Tag,
    /// Length of one unit in nanoseconds.
    pub nanos: i64,
    pub count: fn(&dyn Reflect) -> Option<i64>,
    pub build: fn(i64) -> Box<dyn Reflect>,
}

macro_rules! duration_units {
    ($($(#[$attr:meta])* $name:ident = $tag:ident * $nanos:expr;)+) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
            pub struct $name(pub i64);

            impl GetTypeMeta for $name {
                fn get_type_meta() -> TypeMeta {
                    TypeMeta::opaque::<Self>().with_default::<Self>()
                }
            }

            impl From<$name> for chrono::TimeDelta {
                fn from(value: $name) -> Self {
                    chrono::TimeDelta::nanoseconds(value.0.saturating_mul($nanos))
                }
            }
        )+

        /// Every unit, finest first.
        pub(crate) fn units() -> [UnitInfo; 6] {
            [$(
                UnitInfo {
                    type_id: TypeId::of::<$name>(),
                    tag: Tag::$tag,
                    nanos: $nanos,
                    count: |value| value.downcast_ref::<$name>().map(|d| d.0),
                    build: |count| Box::new($name(count)),
                },
            )+]
        }

        pub(crate) fn register_types(registry: &mut TypeRegistry) {
            $(registry.register::<$name>();)+
        }
    };
}

duration_units! {
    Nanoseconds = CHRONO_NANOSECONDS * 1;
    Microseconds = CHRONO_MICROSECONDS * 1_000;
    Milliseconds = CHRONO_MILLISECONDS * 1_000_000;
    Seconds = CHRONO_SECONDS * 1_000_000_000;
    Minutes = CHRONO_MINUTES * 60_000_000_000;
    Hours = CHRONO_HOURS * 3_600_000_000_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_ordered() {
        let units = units();
        assert!(units.windows(2).all(|w| w[0].nanos < w[1].nanos));
        assert_eq!(units[3].type_id, TypeId::of::<Seconds>());
        assert_eq!((units[5].count)(&Hours(2)), Some(2));
        assert_eq!((units[5].count)(&Minutes(2)), None);
    }

    #[test]
    fn into_time_delta() {
        assert_eq!(chrono::TimeDelta::from(Minutes(2)), chrono::TimeDelta::seconds(120));
    }
}
