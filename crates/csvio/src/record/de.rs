//! Row-to-record Serde Deserializer implementation.
//!
//! Maps one parsed [`Row`] plus the session Header Set onto a target
//! struct. Column values are dispatched through the Serde data model;
//! see the [module docs](super) for the supported member shapes.

use std::collections::HashSet;

use serde::de::{self, DeserializeSeed, DeserializeOwned, EnumAccess, MapAccess, VariantAccess, Visitor};

use crate::{
    error::{CsvError, CsvResult},
    parse::{Field, Row},
};

/// Deserializes one row into a record of type `T`.
///
/// `headers` and `row` are matched positionally; headers with no
/// counterpart field in `T` are ignored (binding checks live in
/// [`CsvReader::into_records`](crate::reader::CsvReader::into_records)).
pub fn from_row<T: DeserializeOwned>(headers: &[String], row: &Row) -> CsvResult<T> {
    from_row_masked(headers, row, &HashSet::new())
}

/// As [`from_row`], but column positions in `masked` are skipped
/// entirely, leaving the corresponding members at their defaults.
pub(crate) fn from_row_masked<T: DeserializeOwned>(
    headers: &[String],
    row: &Row,
    masked: &HashSet<usize>,
) -> CsvResult<T> {
    let mut de = RowDeserializer::new(headers, row, masked);
    T::deserialize(&mut de)
}

/// Serde `Deserializer` over one row of fields.
///
/// Walks the header positions as map keys; the value for each key is
/// the row field at the same position, converted by the target member's
/// declared type.
pub struct RowDeserializer<'a> {
    headers: &'a [String],
    row: &'a [Field],
    /// Column positions whose values are discarded.
    masked: &'a HashSet<usize>,
    /// Column currently being deserialized.
    current: Option<usize>,
}

impl<'a> RowDeserializer<'a> {
    /// Creates a deserializer for one row.
    pub fn new(headers: &'a [String], row: &'a [Field], masked: &'a HashSet<usize>) -> Self {
        Self { headers, row, masked, current: None }
    }

    fn take_current(&mut self) -> CsvResult<usize> {
        self.current
            .take()
            .ok_or_else(|| CsvError::Message("no current column".to_string()))
    }

    /// Takes the current column, requiring a non-null value.
    fn current_text(&mut self) -> CsvResult<(usize, &'a str)> {
        let idx = self.take_current()?;
        match &self.row[idx] {
            Some(text) => Ok((idx, text.as_str())),
            None => Err(CsvError::NullNotPermitted { column: self.headers[idx].clone() }),
        }
    }

    fn conversion_error(&self, index: usize, value: &str, target: &str) -> CsvError {
        CsvError::ValueConversion {
            column: self.headers[index].clone(),
            index,
            value: value.to_string(),
            message: format!("not a valid {target}"),
        }
    }
}

impl<'de> de::Deserializer<'de> for &mut RowDeserializer<'_> {
    type Error = CsvError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("self-describing value"))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v = match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(self.conversion_error(idx, text, "bool")),
        };
        visitor.visit_bool(v)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: i8 = text.parse().map_err(|_| self.conversion_error(idx, text, "i8"))?;
        visitor.visit_i8(v)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: i16 = text.parse().map_err(|_| self.conversion_error(idx, text, "i16"))?;
        visitor.visit_i16(v)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: i32 = text.parse().map_err(|_| self.conversion_error(idx, text, "i32"))?;
        visitor.visit_i32(v)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: i64 = text.parse().map_err(|_| self.conversion_error(idx, text, "i64"))?;
        visitor.visit_i64(v)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: u8 = text.parse().map_err(|_| self.conversion_error(idx, text, "u8"))?;
        visitor.visit_u8(v)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: u16 = text.parse().map_err(|_| self.conversion_error(idx, text, "u16"))?;
        visitor.visit_u16(v)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: u32 = text.parse().map_err(|_| self.conversion_error(idx, text, "u32"))?;
        visitor.visit_u32(v)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: u64 = text.parse().map_err(|_| self.conversion_error(idx, text, "u64"))?;
        visitor.visit_u64(v)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: f32 = text.parse().map_err(|_| self.conversion_error(idx, text, "f32"))?;
        visitor.visit_f32(v)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let v: f64 = text.parse().map_err(|_| self.conversion_error(idx, text, "f64"))?;
        visitor.visit_f64(v)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.conversion_error(idx, text, "char")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (_, text) = self.current_text()?;
        visitor.visit_str(text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let (_, text) = self.current_text()?;
        visitor.visit_string(text.to_string())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("bytes"))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("byte buffer"))
    }

    /// `Option<_>` is the nullable wrapper: a null field maps to `None`,
    /// anything else re-dispatches as the inner type.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        let idx = match self.current {
            Some(idx) => idx,
            None => return Err(CsvError::Message("no current column".to_string())),
        };
        if self.row[idx].is_none() {
            self.current = None;
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("unit"))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("unit struct"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> CsvResult<V::Value> {
        // Transparent: the wrapper takes the inner type's conversion.
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("sequence"))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> CsvResult<V::Value> {
        if self.current.is_some() {
            // A struct inside one CSV field has nowhere to live.
            return Err(CsvError::UnsupportedShape("nested struct"));
        }
        visitor.visit_map(RowMapAccess { de: self, pos: 0 })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> CsvResult<V::Value> {
        let (idx, text) = self.current_text()?;
        visitor
            .visit_enum(RowEnumAccess { text, variants })
            .map_err(|e| match e {
                // Unknown-variant reports become conversion failures so
                // the tolerance policy can apply to them.
                CsvError::Message(message) => CsvError::ValueConversion {
                    column: self.headers[idx].clone(),
                    index: idx,
                    value: text.to_string(),
                    message,
                },
                other => other,
            })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::Message("deserialize_identifier should not be called directly".to_string()))
    }

    /// Values of columns the target type does not declare.
    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> CsvResult<V::Value> {
        self.current = None;
        visitor.visit_unit()
    }
}

/// MapAccess walking header positions in order; masked positions and
/// positions beyond the row width are skipped.
struct RowMapAccess<'a, 'b> {
    de: &'a mut RowDeserializer<'b>,
    pos: usize,
}

impl<'de> MapAccess<'de> for RowMapAccess<'_, '_> {
    type Error = CsvError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> CsvResult<Option<K::Value>> {
        loop {
            if self.pos >= self.de.headers.len() {
                return Ok(None);
            }
            if self.de.masked.contains(&self.pos) || self.pos >= self.de.row.len() {
                self.pos += 1;
                continue;
            }
            break;
        }

        let name = self.de.headers[self.pos].as_str();
        seed.deserialize(de::value::StrDeserializer::<CsvError>::new(name)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> CsvResult<V::Value> {
        self.de.current = Some(self.pos);
        self.pos += 1;
        seed.deserialize(&mut *self.de)
    }
}

/// EnumAccess accepting a unit variant by name or by ordinal index.
struct RowEnumAccess<'a> {
    text: &'a str,
    variants: &'static [&'static str],
}

impl<'de> EnumAccess<'de> for RowEnumAccess<'_> {
    type Error = CsvError;
    type Variant = RowVariantAccess;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> CsvResult<(V::Value, Self::Variant)> {
        if let Ok(ordinal) = self.text.parse::<u32>() {
            if (ordinal as usize) < self.variants.len() {
                let val = seed.deserialize(de::value::U32Deserializer::<CsvError>::new(ordinal))?;
                return Ok((val, RowVariantAccess));
            }
        }
        let val = seed.deserialize(de::value::StrDeserializer::<CsvError>::new(self.text))?;
        Ok((val, RowVariantAccess))
    }
}

/// VariantAccess for unit variants only.
struct RowVariantAccess;

impl<'de> VariantAccess<'de> for RowVariantAccess {
    type Error = CsvError;

    fn unit_variant(self) -> CsvResult<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, _seed: T) -> CsvResult<T::Value> {
        Err(CsvError::UnsupportedShape("newtype enum variant"))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("tuple enum variant"))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("struct enum variant"))
    }
}
