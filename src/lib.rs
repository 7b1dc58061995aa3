#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use wc_reflect as reflect;
pub use wc_serial as serial;
pub use wc_utils as utils;
pub use wc_wire as wire;

pub use wc_serial::{Dynamic, Error, Serializer, SerializerBuilder, TypeConverter};
pub use wc_wire::{Tag, WireValue};
