//! Error types shared across the dispatch pipeline.
//!
//! None of these escape [`Dispatcher::run`](crate::dispatcher::Dispatcher::run);
//! they exist so each stage can report precisely what went wrong before the
//! dispatcher logs it and returns the partial response.

use std::fmt;

/// Failure raised by an [`OriginChecker`](crate::origin::OriginChecker).
///
/// The origin gate treats every variant as a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginCheckError {
    /// The source address could not be parsed as an IP address
    InvalidAddress {
        /// The raw address string as supplied by the request
        address: String,
    },
    /// The permit list itself is unusable (e.g. a malformed subnet entry)
    InvalidPermitList {
        /// The offending entry
        entry: String,
    },
    /// Any other collaborator failure
    Backend(String),
}

impl fmt::Display for OriginCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginCheckError::InvalidAddress { address } => {
                write!(f, "origin check failed: '{address}' is not a valid IP address")
            }
            OriginCheckError::InvalidPermitList { entry } => {
                write!(f, "origin check failed: invalid permit list entry '{entry}'")
            }
            OriginCheckError::Backend(msg) => write!(f, "origin check failed: {msg}"),
        }
    }
}

impl std::error::Error for OriginCheckError {}

/// Failure raised by a [`TemplateEngine`](crate::render::TemplateEngine).
#[derive(Debug)]
pub enum TemplateError {
    /// The template file exists but could not be read
    Io {
        /// Template path relative to the template root
        template: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The template failed to compile or render
    Render {
        /// Template path relative to the template root
        template: String,
        /// Underlying engine error
        source: minijinja::Error,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Io { template, source } => {
                write!(f, "failed to read template '{template}': {source}")
            }
            TemplateError::Render { template, source } => {
                write!(f, "failed to render template '{template}': {source}")
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            TemplateError::Render { source, .. } => Some(source),
        }
    }
}

/// A controller whose routes cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    /// A route points at a handler that was never registered
    UnknownHandler {
        /// Route path
        path: String,
        /// Handler name the route refers to
        handler: String,
    },
    /// A route path that does not start with `/`
    InvalidRoutePath {
        /// Route path
        path: String,
    },
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTableError::UnknownHandler { path, handler } => {
                write!(f, "route '{path}' refers to unknown handler '{handler}'")
            }
            RouteTableError::InvalidRoutePath { path } => {
                write!(f, "route path '{path}' must start with '/'")
            }
        }
    }
}

impl std::error::Error for RouteTableError {}

/// A failure during handler invocation or template rendering.
///
/// Caught once at the top of the pipeline and logged with a backtrace.
#[derive(Debug)]
pub enum DispatchError {
    /// The handler returned an error
    Handler {
        /// Name of the failing handler
        handler: String,
        /// Error returned by the handler
        source: anyhow::Error,
    },
    /// The handler panicked
    HandlerPanic {
        /// Name of the failing handler
        handler: String,
        /// Panic payload rendered as text
        message: String,
    },
    /// The companion template failed to render
    Template(TemplateError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler { handler, source } => {
                write!(f, "handler '{handler}' failed: {source:#}")
            }
            DispatchError::HandlerPanic { handler, message } => {
                write!(f, "handler '{handler}' panicked: {message}")
            }
            DispatchError::Template(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler { source, .. } => Some(source.as_ref()),
            DispatchError::HandlerPanic { .. } => None,
            DispatchError::Template(e) => Some(e),
        }
    }
}

impl From<TemplateError> for DispatchError {
    fn from(e: TemplateError) -> Self {
        DispatchError::Template(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_error_messages() {
        let e = OriginCheckError::InvalidAddress {
            address: "not-an-ip".to_string(),
        };
        assert!(e.to_string().contains("not-an-ip"));
        let e = OriginCheckError::Backend("permit list offline".to_string());
        assert_eq!(e.to_string(), "origin check failed: permit list offline");
    }

    #[test]
    fn test_dispatch_error_wraps_template_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DispatchError = TemplateError::Io {
            template: "modules/index.html".to_string(),
            source: io,
        }
        .into();
        assert!(err.to_string().contains("modules/index.html"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_handler_error_includes_chain() {
        let err = DispatchError::Handler {
            handler: "index".to_string(),
            source: anyhow::anyhow!("inner").context("outer"),
        };
        assert_eq!(err.to_string(), "handler 'index' failed: outer: inner");
    }
}
