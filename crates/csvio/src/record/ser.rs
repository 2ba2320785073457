//! Record-to-row Serde Serializer implementation.
//!
//! Flattens one record into its member names (declared order) and one
//! [`Row`] of field values. Scalars format to their canonical text,
//! unit enum variants to the variant name, `None` to the null marker.

use serde::ser::{self, Serialize};

use crate::{
    error::{CsvError, CsvResult},
    parse::{Field, Row},
    settings::CsvSettings,
};

/// Serializes one record into `(member names, row)`.
///
/// `None` members become null markers when `allow_null` is set,
/// otherwise [`CsvError::NullNotPermitted`].
pub fn to_row<T: Serialize>(
    settings: &CsvSettings,
    record: &T,
) -> CsvResult<(Vec<&'static str>, Row)> {
    let mut ser = RowSerializer::new(settings);
    record.serialize(&mut ser)?;
    ser.into_parts()
}

/// Serde `Serializer` collecting one record's fields.
pub struct RowSerializer<'a> {
    settings: &'a CsvSettings,
    /// Member names in declared order.
    names: Vec<&'static str>,
    /// Field values, parallel to `names`.
    fields: Row,
    /// Value produced by the innermost scalar serializer.
    current: Option<Field>,
    /// Member currently being serialized, for error reporting.
    current_key: Option<&'static str>,
}

impl<'a> RowSerializer<'a> {
    /// Creates a serializer for one record.
    pub fn new(settings: &'a CsvSettings) -> Self {
        Self { settings, names: Vec::new(), fields: Row::new(), current: None, current_key: None }
    }

    /// Consumes the serializer, returning the collected names and row.
    pub fn into_parts(self) -> CsvResult<(Vec<&'static str>, Row)> {
        if self.names.is_empty() {
            return Err(CsvError::UnsupportedShape("record type is not a struct"));
        }
        Ok((self.names, self.fields))
    }

    fn set_current(&mut self, field: Field) {
        self.current = Some(field);
    }

    fn column_name(&self) -> String {
        self.current_key.unwrap_or("?").to_string()
    }
}

impl<'a, 's> ser::Serializer for &'a mut RowSerializer<'s> {
    type Ok = ();
    type Error = CsvError;

    type SerializeSeq = ser::Impossible<(), CsvError>;
    type SerializeTuple = ser::Impossible<(), CsvError>;
    type SerializeTupleStruct = ser::Impossible<(), CsvError>;
    type SerializeTupleVariant = ser::Impossible<(), CsvError>;
    type SerializeMap = ser::Impossible<(), CsvError>;
    type SerializeStruct = RowStructSerializer<'a, 's>;
    type SerializeStructVariant = ser::Impossible<(), CsvError>;

    fn serialize_bool(self, v: bool) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_char(self, v: char) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> CsvResult<()> {
        self.set_current(Some(v.to_string()));
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> CsvResult<()> {
        Err(CsvError::UnsupportedShape("bytes"))
    }

    fn serialize_none(self) -> CsvResult<()> {
        if !self.settings.allow_null {
            return Err(CsvError::NullNotPermitted { column: self.column_name() });
        }
        self.set_current(None);
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> CsvResult<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CsvResult<()> {
        Err(CsvError::UnsupportedShape("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> CsvResult<()> {
        Err(CsvError::UnsupportedShape("unit struct"))
    }

    /// Unit enum variants serialize as the variant name, matching the
    /// by-name acceptance on the deserialize side.
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> CsvResult<()> {
        self.set_current(Some(variant.to_string()));
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> CsvResult<()> {
        // Transparent wrapper.
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> CsvResult<()> {
        Err(CsvError::UnsupportedShape("newtype enum variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> CsvResult<Self::SerializeSeq> {
        Err(CsvError::UnsupportedShape("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> CsvResult<Self::SerializeTuple> {
        Err(CsvError::UnsupportedShape("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> CsvResult<Self::SerializeTupleStruct> {
        Err(CsvError::UnsupportedShape("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CsvResult<Self::SerializeTupleVariant> {
        Err(CsvError::UnsupportedShape("tuple enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> CsvResult<Self::SerializeMap> {
        Err(CsvError::UnsupportedShape("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> CsvResult<Self::SerializeStruct> {
        if self.current_key.is_some() {
            return Err(CsvError::UnsupportedShape("nested struct"));
        }
        Ok(RowStructSerializer { ser: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> CsvResult<Self::SerializeStructVariant> {
        Err(CsvError::UnsupportedShape("struct enum variant"))
    }
}

/// Collects struct members as `(name, field)` pairs in declared order.
pub struct RowStructSerializer<'a, 's> {
    ser: &'a mut RowSerializer<'s>,
}

impl ser::SerializeStruct for RowStructSerializer<'_, '_> {
    type Ok = ();
    type Error = CsvError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> CsvResult<()> {
        self.ser.current_key = Some(key);
        value.serialize(&mut *self.ser)?;
        self.ser.current_key = None;

        let field = self
            .ser
            .current
            .take()
            .ok_or(CsvError::UnsupportedShape("member produced no value"))?;
        self.ser.names.push(key);
        self.ser.fields.push(field);
        Ok(())
    }

    fn end(self) -> CsvResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Debug, Clone, Copy, Serialize)]
    enum Status {
        #[serde(rename = "ACTIVE")]
        Active,
        #[serde(rename = "CLOSED")]
        Closed,
    }

    #[derive(Debug, Serialize)]
    struct Account {
        id: u64,
        name: String,
        status: Status,
        balance: i64,
    }

    fn sample() -> Account {
        Account { id: 7, name: "alice".to_string(), status: Status::Active, balance: -250 }
    }

    #[test]
    fn test_names_and_values() {
        let settings = CsvSettings::default();
        let (names, row) = to_row(&settings, &sample()).unwrap();
        assert_eq!(names, vec!["id", "name", "status", "balance"]);
        assert_eq!(
            row,
            vec![
                Some("7".to_string()),
                Some("alice".to_string()),
                Some("ACTIVE".to_string()),
                Some("-250".to_string()),
            ]
        );
    }

    #[test]
    fn test_closed_variant_name() {
        let settings = CsvSettings::default();
        let account = Account { status: Status::Closed, ..sample() };
        let (_, row) = to_row(&settings, &account).unwrap();
        assert_eq!(row[2], Some("CLOSED".to_string()));
    }

    #[test]
    fn test_none_with_allow_null() {
        #[derive(Serialize)]
        struct Reading {
            sensor: String,
            value: Option<f64>,
        }

        let settings = CsvSettings::default().with_allow_null("NULL");
        let reading = Reading { sensor: "t1".to_string(), value: None };
        let (_, row) = to_row(&settings, &reading).unwrap();
        assert_eq!(row, vec![Some("t1".to_string()), None]);
    }

    #[test]
    fn test_none_without_allow_null_is_error() {
        #[derive(Serialize)]
        struct Reading {
            value: Option<f64>,
        }

        let settings = CsvSettings::default();
        let err = to_row(&settings, &Reading { value: None }).unwrap_err();
        match err {
            CsvError::NullNotPermitted { column } => assert_eq!(column, "value"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_some_serializes_inner() {
        #[derive(Serialize)]
        struct Reading {
            value: Option<f64>,
        }

        let settings = CsvSettings::default();
        let (_, row) = to_row(&settings, &Reading { value: Some(21.5) }).unwrap();
        assert_eq!(row, vec![Some("21.5".to_string())]);
    }

    #[test]
    fn test_non_struct_record_is_error() {
        let settings = CsvSettings::default();
        let err = to_row(&settings, &42u32).unwrap_err();
        assert!(matches!(err, CsvError::UnsupportedShape(_)));
    }

    #[test]
    fn test_nested_struct_is_error() {
        #[derive(Serialize)]
        struct Inner {
            x: u32,
        }

        #[derive(Serialize)]
        struct Outer {
            inner: Inner,
        }

        let settings = CsvSettings::default();
        let err = to_row(&settings, &Outer { inner: Inner { x: 1 } }).unwrap_err();
        assert!(matches!(err, CsvError::UnsupportedShape(_)));
    }

    #[test]
    fn test_newtype_wrapper_is_transparent() {
        #[derive(Serialize)]
        struct UserId(u64);

        #[derive(Serialize)]
        struct Rec {
            user: UserId,
        }

        let settings = CsvSettings::default();
        let (names, row) = to_row(&settings, &Rec { user: UserId(42) }).unwrap();
        assert_eq!(names, vec!["user"]);
        assert_eq!(row, vec![Some("42".to_string())]);
    }
}
