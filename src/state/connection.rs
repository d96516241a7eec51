//! Connection startup and authentication state machine.

use crate::buffer_set::BufferSet;
use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::protocol::backend::{
    AuthenticationMessage, BackendKeyData, BackendMessage, RawMessage,
};
use crate::protocol::frontend::auth::{SCRAM_SHA_256, ScramClient, md5_password};
use crate::protocol::frontend::{write_password, write_sasl_initial_response, write_sasl_response};
use crate::protocol::types::TransactionStatus;

use super::action::{Action, AsyncMessage};

/// Connection state during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Initial,
    WaitingAuth,
    SaslInProgress,
    WaitingAuthResult,
    WaitingReady,
    Ready,
    Failed,
}

/// Connection startup state machine.
///
/// Drives the handshake from StartupMessage to the first ReadyForQuery.
/// TLS negotiation, if any, happens before [`start`](Self::start).
pub struct ConnectionStateMachine {
    state: ConnectionState,
    options: Opts,
    backend_key: Option<BackendKeyData>,
    server_params: Vec<(String, String)>,
    transaction_status: TransactionStatus,
    scram_client: Option<ScramClient>,
}

impl ConnectionStateMachine {
    /// Create a new connection state machine.
    pub fn new(options: Opts) -> Self {
        Self {
            state: ConnectionState::Initial,
            options,
            backend_key: None,
            server_params: Vec::new(),
            transaction_status: TransactionStatus::Idle,
            scram_client: None,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the backend key data (for cancellation).
    pub fn backend_key(&self) -> Option<BackendKeyData> {
        self.backend_key
    }

    /// Get server parameters.
    pub fn server_params(&self) -> &[(String, String)] {
        &self.server_params
    }

    /// Look up a server parameter reported via ParameterStatus.
    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the current transaction status.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.transaction_status
    }

    /// Start the connection process by writing the StartupMessage.
    pub fn start(&mut self, buffer_set: &mut BufferSet) -> Action {
        buffer_set.write_buffer.clear();
        self.options
            .startup_message()
            .write(&mut buffer_set.write_buffer);
        self.transition(ConnectionState::WaitingAuth);
        Action::WriteAndReadMessage
    }

    /// Process the message held in `buffer_set`.
    ///
    /// The caller should fill buffer_set.read_buffer with the message payload
    /// and set buffer_set.type_byte to the message type.
    pub fn step(&mut self, buffer_set: &mut BufferSet) -> Result<Action> {
        let result = self.dispatch(buffer_set);
        if result.is_err() {
            self.transition(ConnectionState::Failed);
        }
        result
    }

    fn dispatch(&mut self, buffer_set: &mut BufferSet) -> Result<Action> {
        // Moved out so the decoded message can borrow it while write_buffer is filled
        let read_buffer = std::mem::take(&mut buffer_set.read_buffer);
        let result = self.handle_message(buffer_set.type_byte, &read_buffer, buffer_set);
        buffer_set.read_buffer = read_buffer;
        result
    }

    fn handle_message(
        &mut self,
        type_byte: u8,
        payload: &[u8],
        buffer_set: &mut BufferSet,
    ) -> Result<Action> {
        let msg = RawMessage::new(type_byte, payload);

        match BackendMessage::parse(msg)? {
            BackendMessage::Error(error) => Err(Error::Server(error)),
            BackendMessage::Notice(notice) => Ok(Action::HandleAsyncMessageAndReadMessage(
                AsyncMessage::Notice(notice),
            )),
            BackendMessage::Notification(notification) => {
                Ok(Action::HandleAsyncMessageAndReadMessage(
                    AsyncMessage::Notification {
                        pid: notification.pid,
                        channel: notification.channel.to_string(),
                        payload: notification.payload.to_string(),
                    },
                ))
            }
            BackendMessage::ParameterStatus(param) => {
                self.set_server_param(param.name, param.value);
                if self.state == ConnectionState::WaitingReady {
                    Ok(Action::ReadMessage)
                } else {
                    Ok(Action::HandleAsyncMessageAndReadMessage(
                        AsyncMessage::ParameterChanged {
                            name: param.name.to_string(),
                            value: param.value.to_string(),
                        },
                    ))
                }
            }
            BackendMessage::NegotiateProtocolVersion(negotiate) => {
                tracing::warn!(
                    "server supports protocol 3.{} and ignored options {:?}",
                    negotiate.newest_minor_version,
                    negotiate.unrecognized_options
                );
                Ok(Action::ReadMessage)
            }
            BackendMessage::Authentication(auth) => match self.state {
                ConnectionState::WaitingAuth => self.handle_auth_request(auth, buffer_set),
                ConnectionState::SaslInProgress => self.handle_sasl_message(auth, buffer_set),
                ConnectionState::WaitingAuthResult => self.handle_auth_result(auth),
                _ => Err(Error::Protocol(format!(
                    "Unexpected Authentication message in state {:?}",
                    self.state
                ))),
            },
            BackendMessage::BackendKeyData(key) if self.state == ConnectionState::WaitingReady => {
                self.backend_key = Some(key);
                Ok(Action::ReadMessage)
            }
            BackendMessage::ReadyForQuery(status) if self.state == ConnectionState::WaitingReady => {
                self.transaction_status = status;
                self.transition(ConnectionState::Ready);
                Ok(Action::Finished)
            }
            _ => Err(Error::Protocol(format!(
                "Unexpected message during startup: '{}' in state {:?}",
                type_byte as char, self.state
            ))),
        }
    }

    fn password(&self) -> Result<&str> {
        self.options
            .password
            .as_deref()
            .ok_or_else(|| Error::Auth("Password required but not provided".into()))
    }

    fn handle_auth_request(
        &mut self,
        auth: AuthenticationMessage<'_>,
        buffer_set: &mut BufferSet,
    ) -> Result<Action> {
        match auth {
            AuthenticationMessage::Ok => {
                self.transition(ConnectionState::WaitingReady);
                Ok(Action::ReadMessage)
            }
            AuthenticationMessage::CleartextPassword => {
                let password = self.password()?;
                buffer_set.write_buffer.clear();
                write_password(&mut buffer_set.write_buffer, password);
                self.transition(ConnectionState::WaitingAuthResult);
                Ok(Action::WriteAndReadMessage)
            }
            AuthenticationMessage::Md5Password { salt } => {
                let hashed = md5_password(&self.options.user, self.password()?, &salt);
                buffer_set.write_buffer.clear();
                write_password(&mut buffer_set.write_buffer, &hashed);
                self.transition(ConnectionState::WaitingAuthResult);
                Ok(Action::WriteAndReadMessage)
            }
            AuthenticationMessage::Sasl { mechanisms } => {
                if !mechanisms.contains(&SCRAM_SHA_256) {
                    tracing::warn!("no supported SASL mechanism among {:?}", mechanisms);
                    return Err(Error::Unsupported(format!(
                        "No supported SASL mechanism. Server offers: {:?}",
                        mechanisms
                    )));
                }

                let scram = ScramClient::new(self.password()?);
                buffer_set.write_buffer.clear();
                write_sasl_initial_response(
                    &mut buffer_set.write_buffer,
                    SCRAM_SHA_256,
                    scram.client_first_message().as_bytes(),
                );

                self.scram_client = Some(scram);
                self.transition(ConnectionState::SaslInProgress);
                Ok(Action::WriteAndReadMessage)
            }
            AuthenticationMessage::Unsupported { method } => Err(Error::Unsupported(format!(
                "{method} authentication is not supported"
            ))),
            other => Err(Error::Protocol(format!(
                "Unexpected authentication request: {:?}",
                other
            ))),
        }
    }

    fn handle_sasl_message(
        &mut self,
        auth: AuthenticationMessage<'_>,
        buffer_set: &mut BufferSet,
    ) -> Result<Action> {
        let scram = self
            .scram_client
            .as_mut()
            .ok_or_else(|| Error::Protocol("SCRAM client not initialized".into()))?;

        match auth {
            AuthenticationMessage::SaslContinue { data } => {
                let server_first = simdutf8::compat::from_utf8(data)
                    .map_err(|e| Error::Auth(format!("Invalid server-first-message: {}", e)))?;

                let client_final = scram.process_server_first(server_first)?;

                buffer_set.write_buffer.clear();
                write_sasl_response(&mut buffer_set.write_buffer, client_final.as_bytes());
                Ok(Action::WriteAndReadMessage)
            }
            AuthenticationMessage::SaslFinal { data } => {
                let server_final = simdutf8::compat::from_utf8(data)
                    .map_err(|e| Error::Auth(format!("Invalid server-final-message: {}", e)))?;

                scram.verify_server_final(server_final)?;

                self.scram_client = None;
                self.transition(ConnectionState::WaitingAuthResult);
                Ok(Action::ReadMessage)
            }
            other => Err(Error::Protocol(format!(
                "Unexpected SASL message: {:?}",
                other
            ))),
        }
    }

    fn handle_auth_result(&mut self, auth: AuthenticationMessage<'_>) -> Result<Action> {
        match auth {
            AuthenticationMessage::Ok => {
                self.transition(ConnectionState::WaitingReady);
                Ok(Action::ReadMessage)
            }
            other => Err(Error::Auth(format!("Unexpected auth result: {:?}", other))),
        }
    }

    fn set_server_param(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.server_params.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value.to_string();
        } else {
            self.server_params
                .push((name.to_string(), value.to_string()));
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::trace!("startup: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
