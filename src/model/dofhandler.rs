//! Degree-of-freedom bookkeeping.

/// Assigns global indices to solution variables and equations.
///
/// Variables carry labels for result export and initial-condition lookup;
/// equations are anonymous. A well-formed model registers exactly as many
/// equations as variables.
#[derive(Debug, Default)]
pub struct DofHandler {
    /// Ordered labels of the registered variables.
    pub variables: Vec<String>,
    num_equations: usize,
}

impl DofHandler {
    /// Creates an empty handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable and returns its global index.
    pub fn register_variable(&mut self, label: impl Into<String>) -> usize {
        self.variables.push(label.into());
        self.variables.len() - 1
    }

    /// Registers an equation and returns its global index.
    pub fn register_equation(&mut self) -> usize {
        self.num_equations += 1;
        self.num_equations - 1
    }

    /// Number of registered variables.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of registered equations.
    #[must_use]
    pub fn num_equations(&self) -> usize {
        self.num_equations
    }

    /// Size of the assembled system.
    #[must_use]
    pub fn size(&self) -> usize {
        self.variables.len().max(self.num_equations)
    }

    /// Index of a variable by label, if registered.
    #[must_use]
    pub fn variable_index(&self, label: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == label)
    }
}
