use std::{
    fmt::{Display, Write as _},
    io,
};

use serde::Serialize;
use serde_json::{Map, Serializer, Value, ser::Formatter};

use crate::{EmitError, record::Extras};

/// A value that can be attached to a record as an extra attribute.
///
/// Encoding tries [`to_json`][Attribute::to_json] first, then
/// [`to_text`][Attribute::to_text] as a JSON string, then gives up with `null`.
pub trait Attribute {
    fn to_json(&self) -> Option<Value>;

    fn to_text(&self) -> Option<String> {
        None
    }
}

/// Attaches any [`Serialize`] value.
#[derive(Debug, Clone, Copy)]
pub struct Json<T>(pub T);

impl<T: Serialize> Attribute for Json<T> {
    fn to_json(&self) -> Option<Value> {
        serde_json::to_value(&self.0).ok()
    }
}

/// Attaches a value that only knows how to [`Display`] itself.
#[derive(Debug, Clone, Copy)]
pub struct Text<T>(pub T);

impl<T: Display> Attribute for Text<T> {
    fn to_json(&self) -> Option<Value> {
        None
    }

    fn to_text(&self) -> Option<String> {
        display_to_string(&self.0)
    }
}

impl Attribute for Value {
    fn to_json(&self) -> Option<Value> {
        Some(self.clone())
    }
}

impl Attribute for log::kv::Value<'_> {
    fn to_json(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn to_text(&self) -> Option<String> {
        display_to_string(self)
    }
}

macro_rules! native_attribute {
    ($($typ:ty),+ $(,)?) => {$(
        impl Attribute for $typ {
            fn to_json(&self) -> Option<Value> {
                Some(Value::from(self.clone()))
            }
        }
    )+};
}

native_attribute!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, String, &str);

/// `Display` may fail by returning [`std::fmt::Error`], which `to_string` would turn into a panic.
fn display_to_string(value: &(impl Display + ?Sized)) -> Option<String> {
    let mut text = String::new();
    write!(text, "{value}").ok()?;
    Some(text)
}

/// Encodes a single attribute, degrading to `null` when nothing works.
pub fn encode_value(attribute: &dyn Attribute) -> Value {
    attribute
        .to_json()
        .or_else(|| attribute.to_text().map(Value::String))
        .unwrap_or(Value::Null)
}

/// Encodes the extra attributes as a JSON object, in insertion order,
/// with `", "` and `": "` separators.
pub fn encode_extras(extras: &Extras<'_>) -> Result<String, EmitError> {
    let object: Map<String, Value> = extras
        .iter()
        .map(|(key, value)| (key.to_owned(), encode_value(value)))
        .collect();

    let mut buf = Vec::new();
    object.serialize(&mut Serializer::with_formatter(&mut buf, SpacedFormatter))?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self, writer: &mut W, first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self, writer: &mut W, first: bool,
    ) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
