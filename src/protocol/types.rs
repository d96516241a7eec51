//! Scalar types shared by frontend and backend messages.

use crate::error::{Error, Result};

/// Object identifier of a type, table or other catalog row.
pub type Oid = u32;

/// Wire format of a parameter or column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatCode {
    #[default]
    Text,
    Binary,
}

impl FormatCode {
    /// Code written on the wire.
    pub fn code(self) -> u16 {
        match self {
            FormatCode::Text => 0,
            FormatCode::Binary => 1,
        }
    }
}

impl TryFrom<u16> for FormatCode {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self> {
        match code {
            0 => Ok(FormatCode::Text),
            1 => Ok(FormatCode::Binary),
            other => Err(Error::Protocol(format!("unknown format code {other}"))),
        }
    }
}

/// Transaction state reported by ReadyForQuery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    /// `I`: outside a transaction block
    #[default]
    Idle,
    /// `T`: inside a transaction block
    InTransaction,
    /// `E`: inside a failed transaction block, rejecting statements until rollback
    Failed,
}

impl TryFrom<u8> for TransactionStatus {
    type Error = Error;

    fn try_from(indicator: u8) -> Result<Self> {
        match indicator {
            b'I' => Ok(TransactionStatus::Idle),
            b'T' => Ok(TransactionStatus::InTransaction),
            b'E' => Ok(TransactionStatus::Failed),
            other => Err(Error::Protocol(format!(
                "unknown transaction status {:?}",
                other as char
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_codes() {
        assert_eq!(FormatCode::try_from(1).unwrap(), FormatCode::Binary);
        assert_eq!(FormatCode::Binary.code(), 1);
        assert_eq!(FormatCode::default().code(), 0);
        assert!(matches!(FormatCode::try_from(2), Err(Error::Protocol(_))));
    }

    #[test]
    fn transaction_status_indicators() {
        assert_eq!(
            TransactionStatus::try_from(b'T').unwrap(),
            TransactionStatus::InTransaction
        );
        assert!(matches!(
            TransactionStatus::try_from(b'X'),
            Err(Error::Protocol(_))
        ));
    }
}
