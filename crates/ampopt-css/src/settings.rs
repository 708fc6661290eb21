//! Parser settings.

/// Options controlling how CSS text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Discard malformed list items and rules instead of failing.
    pub lenient_parsing: bool,
}

impl Settings {
    /// Lenient settings, the default.
    #[must_use]
    pub const fn create() -> Self {
        Self {
            lenient_parsing: true,
        }
    }

    /// Turn lenient parsing on or off.
    #[must_use]
    pub const fn with_lenient_parsing(mut self, lenient: bool) -> Self {
        self.lenient_parsing = lenient;
        self
    }

    /// Fail on the first syntax error.
    #[must_use]
    pub const fn be_strict(self) -> Self {
        self.with_lenient_parsing(false)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::create()
    }
}
