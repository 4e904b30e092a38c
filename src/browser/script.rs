use std::borrow::Cow;

/// User JavaScript run once after navigation and the rendering delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedScript {
    source: String,
    is_async: bool,
}

impl InjectedScript {
    /// Returns `None` for empty source.
    ///
    /// A script counts as asynchronous when its text contains `await`
    /// anywhere: case-sensitive, no word-boundary or comment awareness.
    pub fn new(source: impl Into<String>) -> Option<Self> {
        let source = source.into();
        if source.is_empty() {
            return None;
        }
        let is_async = source.contains("await");
        Some(Self { source, is_async })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// The expression actually evaluated: asynchronous scripts are wrapped in
    /// an async IIFE so that top-level `await` works and the page returns a
    /// promise to wait on.
    pub fn expression(&self) -> Cow<'_, str> {
        if self.is_async {
            Cow::Owned(format!("(async () => {{ {} }})();", self.source))
        } else {
            Cow::Borrowed(&self.source)
        }
    }
}
