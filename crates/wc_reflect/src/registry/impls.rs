use alloc::string::String;

use crate::registry::{GetTypeMeta, TypeMeta};

macro_rules! impl_opaque_meta {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl GetTypeMeta for $ty {
                fn get_type_meta() -> TypeMeta {
                    TypeMeta::opaque::<Self>().with_default::<Self>()
                }
            }
        )+
    };
}

impl_opaque_meta!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
    f32,
    f64,
    String,
);
