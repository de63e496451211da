use std::sync::Arc;

/// Creates a new ad hoc [`Error`] from `format_args!` style arguments.
macro_rules! err {
    ($($tt:tt)*) => {{
        crate::error::Error::from_args(format_args!($($tt)*))
    }}
}

pub(crate) use err;

/// An error that can occur in this crate.
///
/// Errors cover malformed timezone databases, I/O failures while reading
/// them, out-of-range civil fields, timestamp strings that don't fit the
/// grammar and conversions that are explicitly unsupported.
///
/// # Introspection is limited
///
/// Other than implementing the [`std::error::Error`] trait, the
/// [`core::fmt::Debug`] trait and the [`core::fmt::Display`] trait, this
/// error type provides coarse predicates (`is_range`, `is_format`,
/// `is_parse`, `is_io`, `is_unsupported`) and nothing finer grained. Error
/// messages identify the offending field or file where one exists.
///
/// # Design
///
/// This crate follows the "One True God Error Type Pattern": one error type
/// for a variety of different operations, because finer grained error types
/// compose poorly across layers that call each other.
#[derive(Clone)]
pub struct Error {
    /// The internal representation of an error.
    ///
    /// This is in an `Arc` to make an `Error` cloneable (it embeds a
    /// `std::io::Error`, which isn't), to make clones cheap and to keep the
    /// size of `Error` equal to one word.
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Creates a new error value from `core::fmt::Arguments`.
    ///
    /// It is expected to use [`format_args!`](format_args) from Rust's
    /// standard library to create a `core::fmt::Arguments`.
    ///
    /// Callers should generally use their own error types. But in some
    /// circumstances, it can be convenient to manufacture an error value
    /// from this crate specifically.
    ///
    /// # Example
    ///
    /// ```
    /// use zonetime::Error;
    ///
    /// let err = Error::from_args(format_args!("something failed"));
    /// assert_eq!(err.to_string(), "something failed");
    /// ```
    pub fn from_args<'a>(message: core::fmt::Arguments<'a>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::from_args(message)))
    }

    /// Returns true when this error originated as a result of a value being
    /// out of its supported range.
    pub fn is_range(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::Range(_))
    }

    /// Returns true when this error originated from structurally malformed
    /// timezone database data.
    pub fn is_format(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::Format(_))
    }

    /// Returns true when this error originated from a timestamp string that
    /// doesn't fit the grammar.
    pub fn is_parse(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::Parse(_))
    }

    /// Returns true when this error originated from an I/O failure,
    /// including a truncated timezone database stream.
    pub fn is_io(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::IO(_))
    }

    /// Returns true when this error is the result of asking for a conversion
    /// this crate refuses to do.
    pub fn is_unsupported(&self) -> bool {
        matches!(*self.root().kind(), ErrorKind::Unsupported(_))
    }
}

impl Error {
    /// Creates a new error indicating that a `given` value is out of the
    /// specified `min..=max` range. The given `what` label is used in the
    /// error message as a human readable description of what exactly is out
    /// of range. (e.g., "seconds")
    #[inline(never)]
    #[cold]
    pub(crate) fn range(
        what: &'static str,
        given: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Error {
        Error::from(ErrorKind::Range(RangeError::new(what, given, min, max)))
    }

    /// Creates a new error indicating structurally malformed timezone
    /// database data, e.g. bad magic bytes.
    #[inline(never)]
    #[cold]
    pub(crate) fn format<'a>(message: core::fmt::Arguments<'a>) -> Error {
        Error::from(ErrorKind::Format(FormatError {
            message: message.to_string().into_boxed_str(),
        }))
    }

    /// Creates a new error indicating a timestamp string that doesn't fit
    /// the grammar, e.g. a date with a non-numeric month.
    #[inline(never)]
    #[cold]
    pub(crate) fn parse<'a>(message: core::fmt::Arguments<'a>) -> Error {
        Error::from(ErrorKind::Parse(ParseError {
            message: message.to_string().into_boxed_str(),
        }))
    }

    /// Creates a new error for a conversion that this crate refuses to do.
    #[inline(never)]
    #[cold]
    pub(crate) fn unsupported(what: &'static str) -> Error {
        Error::from(ErrorKind::Unsupported(UnsupportedError { what }))
    }

    /// A convenience constructor for building an I/O error.
    ///
    /// This returns an error that is just a simple wrapper around the
    /// `std::io::Error` type. In general, callers should attach some kind of
    /// context to this error (like a file path).
    #[inline(never)]
    #[cold]
    pub(crate) fn io(err: std::io::Error) -> Error {
        Error::from(ErrorKind::IO(IOError { err }))
    }

    /// Contextualizes this error by associating the given file path with it.
    #[inline(never)]
    #[cold]
    pub(crate) fn path(self, path: impl Into<std::path::PathBuf>) -> Error {
        let err = Error::from(ErrorKind::FilePath(FilePathError {
            path: path.into(),
        }));
        self.context(err)
    }

    #[inline(always)]
    pub(crate) fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        let inner = Arc::get_mut(&mut err.inner)
            .expect("fresh consequent error has one reference");
        assert!(inner.cause.is_none(), "cause of consequent must be `None`");
        inner.cause = Some(self);
        err
    }

    /// Returns the root error in this chain.
    fn root(&self) -> &Error {
        // OK because `Error::chain` is guaranteed to return a non-empty
        // iterator.
        self.chain().last().unwrap()
    }

    /// Returns a chain of error values.
    ///
    /// This starts with the most recent error added to the chain, i.e., the
    /// highest level context. The last error in the chain is always the root
    /// cause: the error closest to the point where something went wrong.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.cause.as_ref()?;
            Some(err)
        }))
    }

    /// Returns the kind of this error.
    fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            f.debug_struct("Error")
                .field("kind", &self.inner.kind)
                .field("cause", &self.inner.cause)
                .finish()
        }
    }
}

/// The underlying kind of a [`Error`].
#[derive(Debug)]
enum ErrorKind {
    Adhoc(AdhocError),
    Range(RangeError),
    Format(FormatError),
    Parse(ParseError),
    Unsupported(UnsupportedError),
    IO(IOError),
    FilePath(FilePathError),
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match *self {
            Adhoc(ref err) => err.fmt(f),
            Range(ref err) => err.fmt(f),
            Format(ref err) => err.fmt(f),
            Parse(ref err) => err.fmt(f),
            Unsupported(ref err) => err.fmt(f),
            IO(ref err) => err.fmt(f),
            FilePath(ref err) => err.fmt(f),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { inner: Arc::new(ErrorInner { kind, cause: None }) }
    }
}

/// A generic error message.
struct AdhocError {
    message: Box<str>,
}

impl AdhocError {
    fn from_args<'a>(message: core::fmt::Arguments<'a>) -> AdhocError {
        AdhocError { message: message.to_string().into_boxed_str() }
    }
}

impl core::fmt::Display for AdhocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.message, f)
    }
}

impl core::fmt::Debug for AdhocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.message, f)
    }
}

/// An error that occurs when an input value is out of bounds.
///
/// The error message produced by this type includes a name describing which
/// input was out of bounds, the value given and its minimum and maximum
/// allowed values.
#[derive(Debug)]
struct RangeError {
    what: &'static str,
    given: i64,
    min: i64,
    max: i64,
}

impl RangeError {
    fn new(
        what: &'static str,
        given: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> RangeError {
        RangeError {
            what,
            given: given.into(),
            min: min.into(),
            max: max.into(),
        }
    }
}

impl core::fmt::Display for RangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let RangeError { what, given, min, max } = *self;
        write!(
            f,
            "parameter '{what}' with value {given} \
             is not in the required range of {min}..={max}",
        )
    }
}

/// An error indicating structurally malformed timezone database data.
#[derive(Debug)]
struct FormatError {
    message: Box<str>,
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "malformed timezone data: {}", self.message)
    }
}

/// An error indicating a timestamp string that doesn't fit the grammar.
#[derive(Debug)]
struct ParseError {
    message: Box<str>,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid timestamp string: {}", self.message)
    }
}

/// An error for conversions that are refused rather than approximated.
#[derive(Debug)]
struct UnsupportedError {
    what: &'static str,
}

impl core::fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "operation not supported: {}", self.what)
    }
}

/// A simple wrapper around `std::io::Error`.
struct IOError {
    err: std::io::Error,
}

impl core::fmt::Display for IOError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl core::fmt::Debug for IOError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("IOError").field("err", &self.err).finish()
    }
}

struct FilePathError {
    path: std::path::PathBuf,
}

impl core::fmt::Display for FilePathError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl core::fmt::Debug for FilePathError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FilePathError").field("path", &self.path).finish()
    }
}

/// A simple trait to encapsulate automatic conversion to `Error`.
///
/// This trait basically exists to make `Error::context` work without needing
/// to rely on public `From` impls.
pub(crate) trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for &'static str {
    fn into_error(self) -> Error {
        err!("{self}")
    }
}

impl IntoError for String {
    fn into_error(self) -> Error {
        err!("{self}")
    }
}

/// A trait for contextualizing error values.
///
/// This makes it easy to contextualize either `Error` or `Result<T, Error>`.
/// Specifically, in the latter case, it absolves one of the need to call
/// `map_err` everywhere one wants to add context to an error.
///
/// This trick was borrowed from `anyhow`.
pub(crate) trait ErrorContext<T> {
    /// Contextualize the given consequent error with this (`self`) error as
    /// the cause.
    ///
    /// This is equivalent to saying that "consequent is caused by self."
    fn context(self, consequent: impl IntoError) -> Result<T, Error>;

    /// Like `context`, but hides error construction within a closure.
    ///
    /// This is useful when error construction is potentially "costly" (i.e.,
    /// it allocates). The closure avoids paying the cost of contextual error
    /// creation in the happy path.
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error>;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    #[inline(always)]
    fn context(self, consequent: impl IntoError) -> Result<T, Error> {
        self.map_err(|err| err.context_impl(consequent.into_error()))
    }

    #[inline(always)]
    fn with_context<C: IntoError>(
        self,
        consequent: impl FnOnce() -> C,
    ) -> Result<T, Error> {
        self.map_err(|err| err.context_impl(consequent().into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // We test that our 'Error' type is the size we expect. This isn't an API
    // guarantee, but if the size increases, we really want to make sure we
    // decide to do that intentionally. So this should be a speed bump. And
    // in general, we should not increase the size without a very good
    // reason.
    #[test]
    fn error_size() {
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_chain_display() {
        let root = Error::range("month", 13, 1, 12);
        assert!(root.is_range());
        let err = Err::<(), Error>(root)
            .context("failed to parse timestamp")
            .unwrap_err();
        assert!(err.is_range());
        assert_eq!(
            err.to_string(),
            "failed to parse timestamp: parameter 'month' with value 13 \
             is not in the required range of 1..=12",
        );
    }

    #[test]
    fn path_context() {
        let err = Error::io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ))
        .path("/nonexistent/zone");
        assert!(err.is_io());
        let msg = err.to_string();
        assert!(msg.starts_with("/nonexistent/zone: "), "got: {msg}");
    }
}
