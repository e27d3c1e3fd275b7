//! Text processing errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextProcessingError>;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    #[error("Invalid term pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),
}

impl From<agri_faq_config::ConfigError> for TextProcessingError {
    fn from(err: agri_faq_config::ConfigError) -> Self {
        TextProcessingError::Vocabulary(err.to_string())
    }
}

impl From<TextProcessingError> for agri_faq_core::Error {
    fn from(err: TextProcessingError) -> Self {
        agri_faq_core::Error::Config(err.to_string())
    }
}
