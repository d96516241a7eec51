//! COPY protocol backend messages.

use crate::error::Result;
use crate::protocol::codec::{read_u8, read_u16};
use crate::protocol::types::FormatCode;

/// Body shared by CopyInResponse, CopyOutResponse and CopyBothResponse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResponse {
    /// Overall format (0=text, 1=binary)
    pub format: FormatCode,
    /// Per-column format codes
    pub column_formats: Vec<FormatCode>,
}

impl CopyResponse {
    /// Parse a Copy{In,Out,Both}Response message from payload bytes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (format_byte, rest) = read_u8(payload)?;
        let format = FormatCode::try_from(u16::from(format_byte))?;

        let (num_columns, mut rest) = read_u16(rest)?;
        let mut column_formats = Vec::with_capacity(num_columns as usize);

        for _ in 0..num_columns {
            let (fmt, remaining) = read_u16(rest)?;
            column_formats.push(FormatCode::try_from(fmt)?);
            rest = remaining;
        }

        Ok(Self {
            format,
            column_formats,
        })
    }

    /// Check if binary format is used.
    pub fn is_binary(&self) -> bool {
        matches!(self.format, FormatCode::Binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_in_response() {
        let resp = CopyResponse::parse(&[0, 0, 2, 0, 0, 0, 0]).unwrap();
        assert!(!resp.is_binary());
        assert_eq!(resp.column_formats, [FormatCode::Text, FormatCode::Text]);

        let resp = CopyResponse::parse(&[1, 0, 1, 0, 1]).unwrap();
        assert!(resp.is_binary());

        assert!(CopyResponse::parse(&[0, 0, 1, 0, 7]).is_err());
    }
}
