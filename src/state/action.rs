//! What a state machine needs from its transport next.

use crate::error::ServerError;

/// I/O the caller performs before stepping the machine again.
///
/// Reading means one whole frame: the 5-byte header goes to
/// [`BufferSet::prepare_read`](crate::BufferSet::prepare_read) and the
/// payload into the slice it returns.
#[derive(Debug)]
pub enum Action {
    /// Read the next frame.
    ReadMessage,

    /// Send `write_buffer`, clear it, then read the next frame.
    WriteAndReadMessage,

    /// Deliver the message to the application, then read the next frame.
    HandleAsyncMessageAndReadMessage(AsyncMessage),

    /// Done; the connection is ready for queries.
    Finished,
}

/// Server output that is not a reply to anything the client sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncMessage {
    /// LISTEN/NOTIFY delivery
    Notification {
        pid: u32,
        channel: String,
        payload: String,
    },

    Notice(ServerError),

    /// ParameterStatus received after startup
    ParameterChanged { name: String, value: String },
}
