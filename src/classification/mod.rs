pub mod classification_error;
pub mod classification_session;
