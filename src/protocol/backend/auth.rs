//! Authentication requests ('R').

use crate::error::{Error, Result};
use crate::protocol::codec::{read_cstr, read_i32};

/// Request codes carried in the first field of an Authentication message.
pub mod auth_code {
    pub const OK: i32 = 0;
    pub const KERBEROS_V5: i32 = 2;
    pub const CLEARTEXT_PASSWORD: i32 = 3;
    pub const MD5_PASSWORD: i32 = 5;
    pub const GSS: i32 = 7;
    pub const GSS_CONTINUE: i32 = 8;
    pub const SSPI: i32 = 9;
    pub const SASL: i32 = 10;
    pub const SASL_CONTINUE: i32 = 11;
    pub const SASL_FINAL: i32 = 12;
}

/// What the server asks of the client during authentication.
#[derive(Debug)]
pub enum AuthenticationMessage<'a> {
    Ok,
    CleartextPassword,
    Md5Password {
        salt: [u8; 4],
    },
    /// SASL mechanisms offered, in server preference order
    Sasl {
        mechanisms: Vec<&'a str>,
    },
    /// server-first-message
    SaslContinue {
        data: &'a [u8],
    },
    /// server-final-message
    SaslFinal {
        data: &'a [u8],
    },
    /// Kerberos, GSSAPI or SSPI; recognized but not implemented here.
    Unsupported {
        method: &'static str,
    },
}

impl<'a> AuthenticationMessage<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        let (code, data) = read_i32(payload)?;

        Ok(match code {
            auth_code::OK => Self::Ok,
            auth_code::CLEARTEXT_PASSWORD => Self::CleartextPassword,
            auth_code::MD5_PASSWORD => match data.first_chunk::<4>() {
                Some(salt) => Self::Md5Password { salt: *salt },
                None => return Err(Error::Protocol("MD5 request without salt".into())),
            },
            auth_code::SASL => Self::Sasl {
                mechanisms: sasl_mechanisms(data)?,
            },
            auth_code::SASL_CONTINUE => Self::SaslContinue { data },
            auth_code::SASL_FINAL => Self::SaslFinal { data },
            auth_code::KERBEROS_V5 => Self::Unsupported {
                method: "Kerberos V5",
            },
            auth_code::GSS | auth_code::GSS_CONTINUE => Self::Unsupported { method: "GSSAPI" },
            auth_code::SSPI => Self::Unsupported { method: "SSPI" },
            other => {
                return Err(Error::Protocol(format!(
                    "unknown authentication request {other}"
                )));
            }
        })
    }
}

/// Mechanism names, each NUL-terminated, with an empty name ending the list.
fn sasl_mechanisms(mut data: &[u8]) -> Result<Vec<&str>> {
    let mut mechanisms = Vec::new();
    loop {
        let (name, rest) = read_cstr(data)?;
        if name.is_empty() {
            return Ok(mechanisms);
        }
        mechanisms.push(name);
        data = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_and_cleartext() {
        assert!(matches!(
            AuthenticationMessage::parse(&[0, 0, 0, 0]).unwrap(),
            AuthenticationMessage::Ok
        ));
        assert!(matches!(
            AuthenticationMessage::parse(&[0, 0, 0, 3]).unwrap(),
            AuthenticationMessage::CleartextPassword
        ));
    }

    #[test]
    fn md5_salt() {
        match AuthenticationMessage::parse(&[0, 0, 0, 5, 9, 8, 7, 6]).unwrap() {
            AuthenticationMessage::Md5Password { salt } => assert_eq!(salt, [9, 8, 7, 6]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            AuthenticationMessage::parse(&[0, 0, 0, 5, 9, 8]),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn sasl_mechanism_list() {
        let payload = b"\0\0\0\x0aSCRAM-SHA-256-PLUS\0SCRAM-SHA-256\0\0";
        match AuthenticationMessage::parse(payload).unwrap() {
            AuthenticationMessage::Sasl { mechanisms } => {
                assert_eq!(mechanisms, ["SCRAM-SHA-256-PLUS", "SCRAM-SHA-256"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        // list without its terminator
        assert!(matches!(
            AuthenticationMessage::parse(b"\0\0\0\x0aSCRAM-SHA-256\0"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn unimplemented_methods() {
        for (code, method) in [(2, "Kerberos V5"), (7, "GSSAPI"), (9, "SSPI")] {
            let payload = i32::to_be_bytes(code);
            match AuthenticationMessage::parse(&payload).unwrap() {
                AuthenticationMessage::Unsupported { method: got } => assert_eq!(got, method),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matches!(
            AuthenticationMessage::parse(&[0, 0, 0, 99]),
            Err(Error::Protocol(_))
        ));
    }
}
