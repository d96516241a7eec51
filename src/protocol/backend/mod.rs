//! PostgreSQL backend (server → client) messages.

pub mod auth;
pub mod copy;
pub mod error;
pub mod extended;
pub mod query;
pub mod session;

pub use auth::AuthenticationMessage;
pub use copy::CopyResponse;
pub use error::{ErrorField, ErrorResponse, NoticeResponse};
pub use extended::ParameterDescription;
pub use query::{CommandComplete, DataRow, FieldDescription, RowDescription};
pub use session::{BackendKeyData, NegotiateProtocolVersion, NotificationResponse, ParameterStatus};

use crate::error::{Result, ServerError};
use crate::protocol::types::TransactionStatus;

/// Backend message type bytes.
pub mod msg_type {
    /// Authentication message
    pub const AUTHENTICATION: u8 = b'R';
    /// BackendKeyData
    pub const BACKEND_KEY_DATA: u8 = b'K';
    /// ParameterStatus
    pub const PARAMETER_STATUS: u8 = b'S';
    /// ReadyForQuery
    pub const READY_FOR_QUERY: u8 = b'Z';
    /// RowDescription
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// EmptyQueryResponse
    pub const EMPTY_QUERY_RESPONSE: u8 = b'I';
    /// ErrorResponse
    pub const ERROR_RESPONSE: u8 = b'E';
    /// NoticeResponse
    pub const NOTICE_RESPONSE: u8 = b'N';
    /// NotificationResponse
    pub const NOTIFICATION_RESPONSE: u8 = b'A';
    /// ParseComplete
    pub const PARSE_COMPLETE: u8 = b'1';
    /// BindComplete
    pub const BIND_COMPLETE: u8 = b'2';
    /// CloseComplete
    pub const CLOSE_COMPLETE: u8 = b'3';
    /// ParameterDescription
    pub const PARAMETER_DESCRIPTION: u8 = b't';
    /// NoData
    pub const NO_DATA: u8 = b'n';
    /// PortalSuspended
    pub const PORTAL_SUSPENDED: u8 = b's';
    /// CopyInResponse
    pub const COPY_IN_RESPONSE: u8 = b'G';
    /// CopyOutResponse
    pub const COPY_OUT_RESPONSE: u8 = b'H';
    /// CopyBothResponse
    pub const COPY_BOTH_RESPONSE: u8 = b'W';
    /// CopyData
    pub const COPY_DATA: u8 = b'd';
    /// CopyDone
    pub const COPY_DONE: u8 = b'c';
    /// FunctionCallResponse
    pub const FUNCTION_CALL_RESPONSE: u8 = b'V';
    /// NegotiateProtocolVersion
    pub const NEGOTIATE_PROTOCOL_VERSION: u8 = b'v';
}

/// Raw message from the PostgreSQL server.
///
/// This is a thin wrapper around the message type byte and payload.
/// [`BackendMessage::parse`] decodes it on demand.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a> {
    /// Message type byte
    pub type_byte: u8,
    /// Message payload (after length field)
    pub payload: &'a [u8],
}

impl<'a> RawMessage<'a> {
    /// Create a new RawMessage.
    pub fn new(type_byte: u8, payload: &'a [u8]) -> Self {
        Self { type_byte, payload }
    }
}

/// A decoded backend message.
#[derive(Debug)]
pub enum BackendMessage<'a> {
    Authentication(AuthenticationMessage<'a>),
    BackendKeyData(BackendKeyData),
    ParameterStatus(ParameterStatus<'a>),
    ReadyForQuery(TransactionStatus),
    RowDescription(RowDescription),
    DataRow(DataRow<'a>),
    CommandComplete(CommandComplete<'a>),
    EmptyQueryResponse,
    ParameterDescription(ParameterDescription),
    NoData,
    ParseComplete,
    BindComplete,
    CloseComplete,
    PortalSuspended,
    CopyInResponse(CopyResponse),
    CopyOutResponse(CopyResponse),
    CopyBothResponse(CopyResponse),
    CopyData(&'a [u8]),
    CopyDone,
    Notification(NotificationResponse<'a>),
    NegotiateProtocolVersion(NegotiateProtocolVersion<'a>),
    /// ErrorResponse: the in-flight command failed.
    Error(ServerError),
    /// NoticeResponse: informational, does not interrupt the command.
    Notice(ServerError),
    /// A tag this codec does not decode (e.g. FunctionCallResponse).
    Unrecognized(RawMessage<'a>),
}

impl<'a> BackendMessage<'a> {
    /// Route a raw message to the decoder for its type byte.
    ///
    /// Fails only when the payload is malformed for a recognized tag.
    pub fn parse(msg: RawMessage<'a>) -> Result<Self> {
        let payload = msg.payload;
        Ok(match msg.type_byte {
            msg_type::AUTHENTICATION => {
                BackendMessage::Authentication(AuthenticationMessage::parse(payload)?)
            }
            msg_type::BACKEND_KEY_DATA => {
                BackendMessage::BackendKeyData(BackendKeyData::parse(payload)?)
            }
            msg_type::PARAMETER_STATUS => {
                BackendMessage::ParameterStatus(ParameterStatus::parse(payload)?)
            }
            msg_type::READY_FOR_QUERY => {
                BackendMessage::ReadyForQuery(session::ready_for_query(payload)?)
            }
            msg_type::ROW_DESCRIPTION => {
                BackendMessage::RowDescription(RowDescription::parse(payload)?)
            }
            msg_type::DATA_ROW => BackendMessage::DataRow(DataRow::parse(payload)?),
            msg_type::COMMAND_COMPLETE => {
                BackendMessage::CommandComplete(CommandComplete::parse(payload)?)
            }
            msg_type::EMPTY_QUERY_RESPONSE => BackendMessage::EmptyQueryResponse,
            msg_type::PARAMETER_DESCRIPTION => {
                BackendMessage::ParameterDescription(ParameterDescription::parse(payload)?)
            }
            msg_type::NO_DATA => BackendMessage::NoData,
            msg_type::PARSE_COMPLETE => BackendMessage::ParseComplete,
            msg_type::BIND_COMPLETE => BackendMessage::BindComplete,
            msg_type::CLOSE_COMPLETE => BackendMessage::CloseComplete,
            msg_type::PORTAL_SUSPENDED => BackendMessage::PortalSuspended,
            msg_type::COPY_IN_RESPONSE => {
                BackendMessage::CopyInResponse(CopyResponse::parse(payload)?)
            }
            msg_type::COPY_OUT_RESPONSE => {
                BackendMessage::CopyOutResponse(CopyResponse::parse(payload)?)
            }
            msg_type::COPY_BOTH_RESPONSE => {
                BackendMessage::CopyBothResponse(CopyResponse::parse(payload)?)
            }
            msg_type::COPY_DATA => BackendMessage::CopyData(payload),
            msg_type::COPY_DONE => BackendMessage::CopyDone,
            msg_type::NOTIFICATION_RESPONSE => {
                BackendMessage::Notification(NotificationResponse::parse(payload)?)
            }
            msg_type::NEGOTIATE_PROTOCOL_VERSION => {
                BackendMessage::NegotiateProtocolVersion(NegotiateProtocolVersion::parse(payload)?)
            }
            msg_type::ERROR_RESPONSE => BackendMessage::Error(ErrorResponse::parse(payload)?.0),
            msg_type::NOTICE_RESPONSE => BackendMessage::Notice(NoticeResponse::parse(payload)?.0),
            other => {
                tracing::debug!("Unrecognized backend message type: '{}'", other as char);
                BackendMessage::Unrecognized(msg)
            }
        })
    }
}
