use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel terminated: {reason}")]
    Terminated { reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
