//! The experiment expander collaborator.

use arbor_kernel::Tree;
use arbor_types::NodeId;

use crate::error::Result;
use crate::run::RunInstance;

/// Called on each fresh copy of a base simulation before any factor level
/// is applied to it.
pub type Prepare<'a> = dyn Fn(&mut RunInstance) -> Result<()> + 'a;

/// Turns an experiment node into the runs it stands for.
pub trait ExperimentExpander: Send + Sync {
    /// Creates one loaded run per factor combination.
    ///
    /// `prepare` runs on every copy before its levels are set, so levels
    /// always win over anything `prepare` writes.
    fn create(
        &self,
        tree: &Tree,
        experiment: NodeId,
        prepare: &Prepare<'_>,
    ) -> Result<Vec<RunInstance>>;

    /// Names of the runs [`create`](Self::create) would produce, without cloning anything.
    fn names(&self, tree: &Tree, experiment: NodeId) -> Result<Vec<String>>;
}
