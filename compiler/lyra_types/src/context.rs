//! The shared semantic-analysis context.

use lyra_ir::Compilation;

/// Borrowed view of a compilation while it is being checked.
///
/// Inference, expression checking and specialisation all hang off this
/// type; the split across modules mirrors the pipeline stages.
pub struct Sema<'c> {
    pub comp: &'c mut Compilation,
}

impl<'c> Sema<'c> {
    pub fn new(comp: &'c mut Compilation) -> Self {
        Sema { comp }
    }
}
