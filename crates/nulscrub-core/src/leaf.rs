//! Leaf impls
//!
//! Atomic types terminate the walk: they are visited, counted, and left
//! unchanged. `String` is a leaf too; its bytes are not character slots,
//! so embedded NUL in a `String` survives a walk untouched.
//!
//! `char` itself carries no [`Scrub`] impl. Character data is reachable
//! only through the `char_field` and `chars` schema arms, which keeps
//! `Vec<char>` and `[char; N]` on the in-place scan path instead of the
//! per-element visit path.

use crate::schema::Schema;
use crate::Scrub;

macro_rules! leaf_types {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Scrub for $ty {
                fn schema(&self) -> Schema {
                    Schema::leaf($name)
                }
            }
        )+
    };
}

leaf_types! {
    bool => "bool",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    f32 => "f32",
    f64 => "f64",
    String => "String",
    std::time::Duration => "Duration",
    std::time::SystemTime => "SystemTime",
    std::time::Instant => "Instant",
}

#[cfg(feature = "chrono")]
leaf_types! {
    chrono::NaiveDate => "NaiveDate",
    chrono::NaiveTime => "NaiveTime",
    chrono::NaiveDateTime => "NaiveDateTime",
    chrono::DateTime<chrono::Utc> => "DateTime<Utc>",
    chrono::DateTime<chrono::FixedOffset> => "DateTime<FixedOffset>",
}

#[cfg(feature = "uuid")]
leaf_types! {
    uuid::Uuid => "Uuid",
}
