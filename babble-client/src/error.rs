//! Errors a [`crate::Client`] call can return.

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Wire(#[from] babble_wire::WireError),
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server closed the connection before replying")]
    UnexpectedEof,
    #[error("login was rejected by the server")]
    LoginFailed,
    #[error("server replied with an error: {0}")]
    ServerError(String),
    #[error("unrecognized reply: {0:?}")]
    UnexpectedReply(String),
}
