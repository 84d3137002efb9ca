use thiserror::Error;

/// Failure of a single worker.
///
/// A `TaskError` never escapes the worker that produced it: it is carried
/// inside that worker's `Outcome` and reported per item by the caller.
///
/// Cloneable so a report can be printed and still be inspected afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("io error: {0}")]
    Io(String),
    #[error("worker panicked: {0}")]
    Panicked(String),
    #[error("worker dropped its result")]
    Abandoned,
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

impl TaskError {
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TaskError::Other(msg.into())
    }
}

impl From<std::io::Error> for TaskError {
    fn from(e: std::io::Error) -> Self {
        TaskError::Io(e.to_string())
    }
}

/// Errors raised while reading a signature index.
///
/// These are fatal: they abort a run before any worker is launched.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("bad line {line}: {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_message() {
        let err: TaskError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err, TaskError::Io("gone".into()));
        assert_eq!(err.to_string(), "io error: gone");
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = IndexError::MalformedLine {
            line: 3,
            text: "oops".into(),
        };
        assert_eq!(err.to_string(), "bad line 3: \"oops\"");
    }
}
