//! Typed symbols naming tableau rows and columns.

/// The role a symbol plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) enum SymbolKind {
    /// An external variable (the actual unknowns we're solving for)
    #[default]
    External,
    /// A slack variable (for inequality constraints)
    Slack,
    /// An error variable (for non-required constraints)
    Error,
    /// A dummy variable (for required equality constraints)
    Dummy,
}

/// A typed identifier. Id 0 is the null symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Symbol {
    id: u64,
    kind: SymbolKind,
}

impl Symbol {
    pub(crate) const NULL: Symbol = Symbol {
        id: 0,
        kind: SymbolKind::External,
    };

    pub(crate) const fn new(id: u64, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub(crate) fn is_null(&self) -> bool {
        self.id == 0
    }

    pub(crate) fn is_external(&self) -> bool {
        !self.is_null() && self.kind == SymbolKind::External
    }

    pub(crate) fn is_slack(&self) -> bool {
        !self.is_null() && self.kind == SymbolKind::Slack
    }

    pub(crate) fn is_error(&self) -> bool {
        !self.is_null() && self.kind == SymbolKind::Error
    }

    pub(crate) fn is_dummy(&self) -> bool {
        !self.is_null() && self.kind == SymbolKind::Dummy
    }

    /// Slack and error symbols may leave the basis during optimization.
    pub(crate) fn is_pivotable(&self) -> bool {
        self.is_slack() || self.is_error()
    }
}

/// Source of fresh symbol ids.
///
/// Ids are 64-bit and never wrap. A failed insertion can rewind the
/// counter to a saved mark so that ids are not burned.
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolCounter {
    last: u64,
}

impl SymbolCounter {
    pub(crate) fn next(&mut self, kind: SymbolKind) -> Symbol {
        self.last += 1;
        Symbol::new(self.last, kind)
    }

    pub(crate) fn mark(&self) -> u64 {
        self.last
    }

    pub(crate) fn rewind(&mut self, mark: u64) {
        debug_assert!(mark <= self.last);
        self.last = mark;
    }
}
