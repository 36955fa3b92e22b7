use std::fmt;

/// A LimitTracker enforces a particular limit within the parser. It keeps
/// track of utilization so that we can report how close to a limit we
/// approached over the lifetime of the tracker.
///
/// The parser uses one to bound how deeply selection sets, list and object
/// values, and list types may nest:
///
/// ```rust
/// use gqlrt_parser::Parser;
///
/// let parser = Parser::new().recursion_limit(2);
/// assert!(parser.parse_query("{ a { b } }").is_ok());
///
/// let err = parser.parse_query("{ a { b { c } } }").unwrap_err();
/// assert_eq!(err.message(), "parser recursion limit reached");
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    pub(crate) current: usize,
    /// High Water mark for this limit
    pub high: usize,
    /// Limit.
    pub limit: usize,
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    /// Return whether the limit was reached
    #[must_use]
    pub fn check_and_increment(&mut self) -> bool {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
        let reached = self.current > self.limit;
        if reached {
            // Caller is gonna return early, keep increments and decrements balanced:
            self.decrement()
        }
        reached
    }

    pub fn decrement(&mut self) {
        self.current -= 1;
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recursion limit: {}, high: {}", self.limit, self.high)
    }
}
