//! Null-guarding of restore statements.
//!
//! Orthogonal to the chosen strategy: the guard is added as a transform on
//! the finished [`Analysis`], so whatever the strategy rendered ends up inside
//! the braces.
use crate::analysis::{Analysis, Direction};
use crate::field::{FieldDescriptor, RestorePolicy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestorePolicyWrapper {
    global: RestorePolicy,
}

impl RestorePolicyWrapper {
    pub fn new(global: RestorePolicy) -> Self { Self { global } }

    /// Field, then class, then global; a `Default` at any level defers.
    pub fn effective(&self, field: &FieldDescriptor, class_policy: RestorePolicy) -> RestorePolicy {
        field.restore_policy().or(class_policy).or(self.global)
    }

    pub fn apply(&self, analysis: Analysis, field: &FieldDescriptor, class_policy: RestorePolicy) -> Analysis {
        if analysis.direction() != Direction::Restore || field.declared().is_primitive() {
            return analysis;
        }
        let target = field.access().target().to_string();
        match self.effective(field, class_policy) {
            RestorePolicy::IfNull => analysis.transform(move |s| format!("if ({target} == null) {{ {s} }}")),
            RestorePolicy::IfNotNull => analysis.transform(move |s| format!("if ({target} != null) {{ {s} }}")),
            RestorePolicy::Overwrite | RestorePolicy::Default => analysis,
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
