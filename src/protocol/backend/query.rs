//! Query-related backend messages.

use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U16 as U16BE, U32 as U32BE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::error::{Error, Result};
use crate::protocol::codec::{read_cstr, read_i32, read_u16};
use crate::protocol::types::{FormatCode, Oid};

/// Fixed-size tail of a field description (18 bytes).
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
pub struct FieldDescriptionTail {
    /// Table OID (0 if not a table column)
    pub table_oid: U32BE,
    /// Column attribute number (0 if not a table column)
    pub column_id: I16BE,
    /// Data type OID
    pub type_oid: U32BE,
    /// Type size (-1 for variable, -2 for null-terminated)
    pub type_size: I16BE,
    /// Type modifier (type-specific)
    pub type_modifier: I32BE,
    /// Format code (0=text, 1=binary)
    pub format: U16BE,
}

/// Metadata of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// Column name
    pub name: String,
    /// Table OID (0 if not a table column)
    pub table_oid: Oid,
    /// Column attribute number within the table (0 if not a table column)
    pub column_id: i16,
    /// Data type OID
    pub type_oid: Oid,
    /// Type size (negative means variable-length)
    pub type_size: i16,
    /// Type modifier (type-specific)
    pub type_modifier: i32,
    /// Wire format the server will use for values of this column
    pub format: FormatCode,
}

impl FieldDescription {
    fn from_parts(name: &str, tail: &FieldDescriptionTail) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            table_oid: tail.table_oid.get(),
            column_id: tail.column_id.get(),
            type_oid: tail.type_oid.get(),
            type_size: tail.type_size.get(),
            type_modifier: tail.type_modifier.get(),
            format: FormatCode::try_from(tail.format.get())?,
        })
    }

    /// Returns true if values of this type have no fixed size.
    pub fn is_variable_length(&self) -> bool {
        self.type_size < 0
    }
}

/// RowDescription message - describes the columns in a result set.
///
/// Fields are kept in the order the server sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDescription {
    fields: Vec<FieldDescription>,
}

impl RowDescription {
    /// Parse a RowDescription message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (num_fields, mut data) = read_u16(payload)?;
        let mut fields = Vec::with_capacity(num_fields as usize);

        for _ in 0..num_fields {
            let (name, rest) = read_cstr(data)?;
            let (tail, rest) = FieldDescriptionTail::ref_from_prefix(rest)
                .map_err(|e| Error::Protocol(format!("FieldDescription tail: {e:?}")))?;
            fields.push(FieldDescription::from_parts(name, tail)?);
            data = rest;
        }

        Ok(Self { fields })
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field descriptions.
    pub fn fields(&self) -> &[FieldDescription] {
        &self.fields
    }

    /// Iterate over field descriptions.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescription> {
        self.fields.iter()
    }

    /// Take ownership of the field descriptions.
    pub fn into_fields(self) -> Vec<FieldDescription> {
        self.fields
    }
}

/// DataRow message - contains a single row of data.
#[derive(Debug, Clone, Copy)]
pub struct DataRow<'a> {
    /// Number of columns
    num_columns: u16,
    /// Column data (after the column count)
    columns_data: &'a [u8],
}

impl<'a> DataRow<'a> {
    /// Parse a DataRow message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (num_columns, columns_data) = read_u16(payload)?;
        Ok(Self {
            num_columns,
            columns_data,
        })
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.num_columns as usize
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.num_columns == 0
    }

    /// Create an iterator over column values.
    ///
    /// Each item is `Ok(None)` for NULL and `Ok(Some(bytes))` otherwise.
    pub fn iter(&self) -> DataRowIter<'a> {
        DataRowIter {
            remaining: self.columns_data,
            columns_left: self.num_columns,
        }
    }
}

/// Iterator over column values in a DataRow.
#[derive(Debug, Clone)]
pub struct DataRowIter<'a> {
    remaining: &'a [u8],
    columns_left: u16,
}

impl<'a> Iterator for DataRowIter<'a> {
    type Item = Result<Option<&'a [u8]>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.columns_left == 0 {
            return None;
        }
        self.columns_left -= 1;
        Some(self.next_value())
    }
}

impl<'a> DataRowIter<'a> {
    fn next_value(&mut self) -> Result<Option<&'a [u8]>> {
        let (len, rest) = read_i32(self.remaining)?;
        if len == -1 {
            self.remaining = rest;
            return Ok(None);
        }
        let value_len = usize::try_from(len)
            .map_err(|_e| Error::Protocol(format!("DataRow: invalid value length {len}")))?;
        let (value, rest) = rest.split_at_checked(value_len).ok_or_else(|| {
            Error::Protocol(format!(
                "DataRow: value length {value_len} exceeds remaining {}",
                rest.len()
            ))
        })?;
        self.remaining = rest;
        Ok(Some(value))
    }
}

/// CommandComplete message - indicates successful completion of a command.
#[derive(Debug, Clone, Copy)]
pub struct CommandComplete<'a> {
    /// Command tag (e.g., "SELECT 5", "INSERT 0 1", "UPDATE 10")
    pub tag: &'a str,
}

impl<'a> CommandComplete<'a> {
    /// Parse a CommandComplete message from payload bytes.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (tag, _) = read_cstr(payload)?;
        Ok(Self { tag })
    }

    /// Parse the number of rows affected from the command tag.
    ///
    /// Returns `Some(count)` for commands like SELECT, INSERT, UPDATE, DELETE.
    /// Returns `None` for other commands or parse failures.
    pub fn rows_affected(&self) -> Option<u64> {
        let parts: Vec<&str> = self.tag.split_whitespace().collect();

        match parts.as_slice() {
            ["INSERT", _oid, count] => count.parse().ok(),
            ["SELECT" | "UPDATE" | "DELETE" | "MERGE" | "COPY" | "MOVE" | "FETCH", count] => {
                count.parse().ok()
            }
            _ => None,
        }
    }

    /// Get the command name from the tag.
    pub fn command(&self) -> Option<&str> {
        self.tag.split_whitespace().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_description_payload(columns: &[(&str, Oid)]) -> Vec<u8> {
        let mut payload = (columns.len() as u16).to_be_bytes().to_vec();
        for (i, (name, oid)) in columns.iter().enumerate() {
            payload.extend_from_slice(name.as_bytes());
            payload.push(0);
            payload.extend_from_slice(&16384_u32.to_be_bytes());
            payload.extend_from_slice(&(i as i16 + 1).to_be_bytes());
            payload.extend_from_slice(&oid.to_be_bytes());
            payload.extend_from_slice(&(if *oid == 25 { -1_i16 } else { 4 }).to_be_bytes());
            payload.extend_from_slice(&(-1_i32).to_be_bytes());
            payload.extend_from_slice(&1_u16.to_be_bytes());
        }
        payload
    }

    #[test]
    fn row_description_fields() {
        let desc = RowDescription::parse(&row_description_payload(&[("id", 23), ("name", 25)]))
            .unwrap();
        assert_eq!(desc.len(), 2);

        let id = &desc.fields()[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.table_oid, 16384);
        assert_eq!(id.column_id, 1);
        assert_eq!(id.type_oid, 23);
        assert_eq!(id.type_size, 4);
        assert_eq!(id.type_modifier, -1);
        assert_eq!(id.format, FormatCode::Binary);
        assert!(!id.is_variable_length());

        let name = &desc.fields()[1];
        assert_eq!(name.name, "name");
        assert!(name.is_variable_length());
    }

    #[test]
    fn row_description_preserves_order() {
        let first = RowDescription::parse(&row_description_payload(&[("id", 23), ("name", 25)]))
            .unwrap();
        let second = RowDescription::parse(&row_description_payload(&[("name", 25), ("id", 23)]))
            .unwrap();

        let names = |d: &RowDescription| d.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), ["id", "name"]);
        assert_eq!(names(&second), ["name", "id"]);
    }

    #[test]
    fn row_description_truncated() {
        let payload = row_description_payload(&[("id", 23)]);
        assert!(matches!(
            RowDescription::parse(&payload[..payload.len() - 1]),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(RowDescription::parse(&[0]), Err(Error::Protocol(_))));
    }

    #[test]
    fn data_row_values() {
        let mut payload = vec![0, 3];
        payload.extend_from_slice(&2_i32.to_be_bytes());
        payload.extend_from_slice(b"42");
        payload.extend_from_slice(&(-1_i32).to_be_bytes());
        payload.extend_from_slice(&0_i32.to_be_bytes());

        let row = DataRow::parse(&payload).unwrap();
        assert_eq!(row.len(), 3);
        let values: Vec<_> = row.iter().collect::<Result<_>>().unwrap();
        assert_eq!(values, [Some(b"42".as_slice()), None, Some(b"".as_slice())]);
    }

    #[test]
    fn data_row_overlong_value() {
        let mut payload = vec![0, 1];
        payload.extend_from_slice(&10_i32.to_be_bytes());
        payload.extend_from_slice(b"short");

        let row = DataRow::parse(&payload).unwrap();
        assert!(matches!(row.iter().next(), Some(Err(Error::Protocol(_)))));
    }

    #[test]
    fn command_complete_rows() {
        let cases = [
            ("SELECT 5", Some(5)),
            ("INSERT 0 1", Some(1)),
            ("UPDATE 10", Some(10)),
            ("CREATE TABLE", None),
        ];
        for (tag, rows) in cases {
            let mut payload = tag.as_bytes().to_vec();
            payload.push(0);
            let cc = CommandComplete::parse(&payload).unwrap();
            assert_eq!(cc.rows_affected(), rows, "{tag}");
        }
    }
}
