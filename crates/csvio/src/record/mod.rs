//! Serde-based record mapping for CSV rows.
//!
//! This module provides custom Serde `Serializer` and `Deserializer`
//! implementations that bind CSV columns to the named fields of a target
//! record type. Member names come from the type's `#[derive(Serialize,
//! Deserialize)]` field list; per-type value conversion is the Serde data
//! model itself (one `deserialize_*`/`serialize_*` method per supported
//! scalar type).
//!
//! # Supported member shapes
//!
//! Integers, floats, `bool` (`true`/`false`, `1`/`0`, `yes`/`no`),
//! `char`, `String`, unit-variant enums (accepted by variant name or by
//! ordinal index), `Option<_>` of any of these as the nullable wrapper,
//! and newtype wrappers transparently. Types with their own string-based
//! Serde impls (dates, for instance) work through `deserialize_str`.
//! Anything that cannot occupy a single CSV field — sequences, maps,
//! nested structs, tuples — is a [`CsvError::UnsupportedShape`]
//! configuration error and is never suppressed by `ignore_errors`.
//!
//! # Example
//!
//! ```
//! use csvio::record::{from_row, to_row};
//! use csvio::settings::CsvSettings;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Account {
//!     id: u64,
//!     name: String,
//! }
//!
//! let settings = CsvSettings::default();
//! let headers = vec!["id".to_string(), "name".to_string()];
//! let row = vec![Some("7".to_string()), Some("alice".to_string())];
//!
//! let account: Account = from_row(&headers, &row).unwrap();
//! assert_eq!(account, Account { id: 7, name: "alice".to_string() });
//!
//! let (names, out) = to_row(&settings, &account).unwrap();
//! assert_eq!(names, vec!["id", "name"]);
//! assert_eq!(out, row);
//! ```

mod de;
mod ser;

pub use de::{RowDeserializer, from_row};
pub(crate) use de::from_row_masked;
pub use ser::{RowSerializer, to_row};

use serde::{de::DeserializeOwned, forward_to_deserialize_any};

use crate::error::{CsvError, CsvResult};

/// Captures the static field list of a struct type without reading any
/// data: `deserialize_struct` records the `fields` slice the derive
/// passes in, then aborts the walk.
struct FieldProbe {
    fields: Option<&'static [&'static str]>,
}

impl<'de> serde::de::Deserializer<'de> for &mut FieldProbe {
    type Error = CsvError;

    fn deserialize_any<V: serde::de::Visitor<'de>>(self, _visitor: V) -> CsvResult<V::Value> {
        Err(CsvError::UnsupportedShape("record type is not a struct"))
    }

    fn deserialize_struct<V: serde::de::Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> CsvResult<V::Value> {
        self.fields = Some(fields);
        // The probe never produces a value; the caller only wants `fields`.
        Err(CsvError::Message("field probe".to_string()))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Returns the declared member names of `T`, or `None` if `T` does not
/// deserialize as a struct.
pub(crate) fn struct_fields<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    let mut probe = FieldProbe { fields: None };
    let _ = T::deserialize(&mut probe);
    probe.fields
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(rename = "ID")]
        _id: u64,
        _name: String,
    }

    #[test]
    fn test_struct_fields_probe() {
        let fields = struct_fields::<Sample>().unwrap();
        assert_eq!(fields, &["ID", "_name"]);
    }

    #[test]
    fn test_probe_rejects_non_struct() {
        assert!(struct_fields::<u32>().is_none());
        assert!(struct_fields::<Vec<String>>().is_none());
    }
}
