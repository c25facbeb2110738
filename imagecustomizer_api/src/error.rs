use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::config::error::ConfigValidationError;

/// User provided input was invalid.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to load configuration file from '{path}'")]
    LoadConfiguration { path: String },
    #[error("Failed to parse configuration")]
    ParseConfiguration,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigValidationError),
}

#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalError {
    #[error("Internal error: {0}")]
    Internal(&'static str),

    #[error("Failed to serialize resolved storage")]
    SerializeResolvedStorage,
    #[error("Failed to write output file '{path}'")]
    WriteOutput { path: String },
}

/// Each variant of `ErrorKind` corresponds to a different category of error. The categories are
/// intended to be user-meaningful.
#[derive(Debug, Eq, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// An uncategorized error occurred or a bug was encountered.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct ImageCustomizerErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct ImageCustomizerError(Box<ImageCustomizerErrorInner>);
impl ImageCustomizerError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        ImageCustomizerError(Box::new(ImageCustomizerErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

impl From<ConfigValidationError> for ImageCustomizerError {
    #[track_caller]
    fn from(error: ConfigValidationError) -> Self {
        ImageCustomizerError::new(InvalidInputError::from(error))
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured ImageCustomizerError.
    fn structured(self, kind: K) -> Result<T, ImageCustomizerError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, ImageCustomizerError> {
        match self {
            Some(t) => Ok(t),
            None => Err(ImageCustomizerError(Box::new(ImageCustomizerErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: None,
                context: Vec::new(),
            }))),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, ImageCustomizerError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(ImageCustomizerError(Box::new(ImageCustomizerErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: Some(e.into()),
                context: Vec::new(),
            }))),
        }
    }
}

pub trait ImageCustomizerResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, ImageCustomizerError>;
}

impl<T> ImageCustomizerResultExt<T> for Result<T, ImageCustomizerError> {
    #[track_caller]
    fn message(
        mut self,
        context: impl Into<Cow<'static, str>>,
    ) -> Result<T, ImageCustomizerError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Serialize for ImageCustomizerError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("image-customizer-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Internal(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{:?}", e)))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for ImageCustomizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_yaml::Value;

    use crate::config::storage::error::StorageError;

    use super::*;

    #[test]
    fn test_error_serialize() {
        let e = ImageCustomizerError(Box::new(ImageCustomizerErrorInner {
            kind: ErrorKind::InvalidInput(InvalidInputError::LoadConfiguration {
                path: "/config.yaml".into(),
            }),
            location: Location::caller(),
            source: Some(
                std::fs::read("/non-existant-file")
                    .context("failed to read file")
                    .unwrap_err(),
            ),
            context: Vec::new(),
        }));
        match serde_yaml::to_value(e).unwrap() {
            Value::Mapping(m) => {
                assert_eq!(m.len(), 5);
                assert_eq!(m["category"], Value::String("invalid-input".into()));
                assert!(matches!(m["cause"], Value::String(_)));
                assert!(matches!(m["error"], Value::Mapping(_)));
                assert_eq!(
                    m["message"],
                    Value::String("Failed to load configuration file from '/config.yaml'".into())
                );
                match m["location"] {
                    Value::String(ref s) => assert!(s.contains("error.rs:")),
                    _ => panic!("location isn't string"),
                }
            }
            _ => panic!("value isn't mapping"),
        }
    }

    #[test]
    fn test_error_debug() {
        let error = Err::<(), _>(anyhow::anyhow!("z"))
            .context("x\ny")
            .structured(InternalError::Internal("w"))
            .unwrap_err();
        assert_eq!(
            format!("{:?}", error),
            format!(
                "Internal error: w at {}:{}\n\nCaused by:\n    0: x\n       y\n    1: z\n",
                error.0.location.file(),
                error.0.location.line(),
            ),
        );
    }

    #[test]
    fn test_validation_error_message() {
        let error: ImageCustomizerError =
            ConfigValidationError::from(StorageError::MultipleDisks).into();
        let error = Err::<(), _>(error)
            .message("Validating configuration")
            .unwrap_err();
        assert_eq!(
            error.kind().to_string(),
            "Invalid configuration: defining multiple disks is not currently supported"
        );
        assert!(format!("{error:?}").contains("Context:\n    0: Validating configuration at"));
    }
}
