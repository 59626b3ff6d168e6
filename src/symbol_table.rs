use std::collections::HashMap;

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A code label. Its address is the address of the next emitted byte.
    Code,

    /// A constant label. Its address is the address of the byte holding the constant.
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The address the symbol resolves to.
    pub address: u16,

    /// The 1-based source line declaring the symbol.
    pub line: usize,

    pub kind: SymbolKind,
}

/// Maps symbol names to their declarations.
#[derive(Default, Debug, Clone)]
pub struct SymbolTable {
    inner: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        SymbolTable {
            inner: HashMap::new(),
        }
    }

    /// Declares a symbol.
    ///
    /// # Errors
    /// Returns the existing declaration if the name is already taken. The table is left
    /// unchanged.
    pub(crate) fn define_symbol(&mut self, label: String, symbol: Symbol) -> Result<(), &Symbol> {
        if self.inner.contains_key(&label) {
            return Err(&self.inner[&label]);
        }

        self.inner.insert(label, symbol);

        Ok(())
    }

    pub fn get_symbol_by_label<S: AsRef<str>>(&self, label: S) -> Option<&Symbol> {
        self.inner.get(label.as_ref())
    }

    /// The address of the named symbol.
    pub fn address<S: AsRef<str>>(&self, label: S) -> Option<u16> {
        self.get_symbol_by_label(label).map(|symbol| symbol.address)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the symbols in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.inner.iter().map(|(label, symbol)| (label.as_str(), symbol))
    }
}
