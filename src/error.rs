//! Error types for loading scene files

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum SceneFileError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scene: {message}")]
    Parse {
        message: String,
        span: Option<Span>,
    },
}

impl From<toml::de::Error> for SceneFileError {
    fn from(err: toml::de::Error) -> Self {
        SceneFileError::Parse {
            message: err.message().trim().to_string(),
            span: err.span(),
        }
    }
}

impl SceneFileError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let (message, span) = match self {
            SceneFileError::Io(_) => return self.to_string(),
            SceneFileError::Parse { message, span } => (message, span.clone().unwrap_or(0..0)),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message("invalid scene")
            .with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
