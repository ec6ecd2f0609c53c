//! Exclusion scope tracking.

/// Depth of nested excluded collections during traversal.
///
/// Entered when an excluded collection reference is visited and left when the
/// walker leaves that resource. Any reference made while `depth > 0` is inside
/// an exclusion scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionScope {
    depth: u32,
}

impl ExclusionScope {
    /// Create a tracker outside any exclusion scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a nested exclusion scope.
    pub fn enter(&mut self) {
        self.depth += 1;
    }

    /// Close the innermost exclusion scope.
    ///
    /// Returns `false` without changing state if no scope is open.
    #[must_use]
    pub fn leave(&mut self) -> bool {
        match self.depth.checked_sub(1) {
            Some(depth) => {
                self.depth = depth;
                true
            }
            None => false,
        }
    }

    /// Whether traversal is currently inside an exclusion scope.
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes() {
        let mut scope = ExclusionScope::new();
        assert!(!scope.is_active());

        scope.enter();
        scope.enter();
        assert_eq!(scope.depth(), 2);

        assert!(scope.leave());
        assert!(scope.is_active());
        assert!(scope.leave());
        assert!(!scope.is_active());
    }

    #[test]
    fn test_leave_without_enter() {
        let mut scope = ExclusionScope::new();
        assert!(!scope.leave());
        assert_eq!(scope.depth(), 0);
    }
}
