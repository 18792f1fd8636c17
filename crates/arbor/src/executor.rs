//! Run executors.

use arbor_kernel::{Event, Timestep, Tree, events};
use arbor_types::NodeId;

use crate::builtin::{CLOCK, Clock, DATE_FORMAT};
use crate::error::ExecutionError;

/// What an executor did to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionSummary {
    /// Timesteps published.
    pub steps: u64,
    /// Nodes that received each event.
    pub nodes: usize,
}

/// Drives a bound run from commencement to completion.
pub trait Executor {
    fn execute(
        &mut self,
        tree: &mut Tree,
        root: NodeId,
    ) -> Result<ExecutionSummary, ExecutionError>;
}

/// Publishes `Commencing`, one `Timestep` per day of the first [`Clock`]
/// found under the run root, then `Completed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockExecutor;

impl Executor for ClockExecutor {
    fn execute(
        &mut self,
        tree: &mut Tree,
        root: NodeId,
    ) -> Result<ExecutionSummary, ExecutionError> {
        let clock = tree
            .subtree(root)
            .into_iter()
            .find(|&id| tree.node(id).is_some_and(|n| n.kind() == CLOCK))
            .ok_or_else(|| ExecutionError::NoClock(tree.full_path(root)))?;

        let nodes = events::publish(tree, root, Event::Commencing)?;

        let attributes = tree
            .node(clock)
            .map(|node| node.attributes().clone())
            .unwrap_or_default();
        let (start, end) = Clock::range(&attributes, &tree.full_path(clock))?;

        let mut steps = 0;
        for day in start.iter_days().take_while(|day| *day <= end) {
            if let Some(clock) = tree.downcast_mut::<Clock>(clock) {
                clock.set_today(day);
            }
            events::publish(tree, root, Event::Timestep(Timestep { index: steps }))?;
            steps += 1;
        }

        events::publish(tree, root, Event::Completed)?;

        tracing::debug!(
            run = %tree.full_path(root),
            start = %start.format(DATE_FORMAT),
            end = %end.format(DATE_FORMAT),
            steps,
            "clock finished"
        );
        Ok(ExecutionSummary { steps, nodes })
    }
}
