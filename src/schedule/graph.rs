//! Dependency graph construction and topological sequencing.
//!
//! Tasks are stored in an index-addressed arena. Sequencing is a depth-first
//! traversal driven by an explicit stack, so deep dependency chains cannot
//! overflow the call stack.
//!
//! ## Ordering rules
//!
//! - Roots are visited in descending priority; ties keep input order.
//! - A task's dependencies are emitted before the task itself.
//! - Dependencies outside the batch are treated as already satisfied.
//! - Re-entering a task that is still being visited drops that back edge. The
//!   order stays complete (every task exactly once) and the dropped cycle is
//!   reported through [`Sequence::CycleDetected`].

use crate::schedule::error::{Result, SchedulingError};
use crate::task::{Task, TaskId, TaskPriority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// What to do with an order that had to drop dependency cycles
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Use the truncated order as-is
    #[default]
    Tolerate,
    /// Fail with [`SchedulingError::CycleDetected`]
    Reject,
}

/// Outcome of sequencing a dependency graph
#[derive(Debug, Clone, PartialEq)]
pub enum Sequence {
    Ordered(Vec<TaskId>),
    CycleDetected {
        order: Vec<TaskId>,
        /// Each cycle as the path from the re-entered task to the task that closed it
        cycles: Vec<Vec<TaskId>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

#[derive(Debug, Clone)]
struct Node {
    id: TaskId,
    priority: TaskPriority,
    dependencies: Vec<usize>,
}

/// Adjacency of a task batch, restricted to the batch itself
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<TaskId, usize>,
}

impl DependencyGraph {
    /// Build the graph for a batch; duplicate ids keep their first occurrence
    pub fn build(tasks: &[Task]) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        let mut kept = Vec::with_capacity(tasks.len());

        for task in tasks {
            if index.contains_key(&task.id) {
                debug!("Ignoring duplicate task {} in batch", task.id);
                continue;
            }
            index.insert(task.id, kept.len());
            kept.push(task);
        }

        let nodes = kept
            .into_iter()
            .map(|task| Node {
                id: task.id,
                priority: task.priority,
                dependencies: task
                    .dependencies
                    .iter()
                    .filter_map(|dep_id| index.get(dep_id).copied())
                    .collect(),
            })
            .collect();

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.index.contains_key(&task_id)
    }

    /// In-batch dependencies of a task
    pub fn dependencies_of(&self, task_id: TaskId) -> Vec<TaskId> {
        self.index
            .get(&task_id)
            .map(|&idx| {
                self.nodes[idx]
                    .dependencies
                    .iter()
                    .map(|&dep| self.nodes[dep].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Task id -> in-batch dependency ids
    pub fn adjacency(&self) -> HashMap<TaskId, Vec<TaskId>> {
        self.nodes
            .iter()
            .map(|node| {
                let deps = node.dependencies.iter().map(|&d| self.nodes[d].id).collect();
                (node.id, deps)
            })
            .collect()
    }

    /// Order the batch so dependencies come before dependents
    pub fn sequence(&self) -> Sequence {
        let mut roots: Vec<usize> = (0..self.nodes.len()).collect();
        roots.sort_by(|&a, &b| self.nodes[b].priority.cmp(&self.nodes[a].priority));

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cycles = Vec::new();
        // (node, position of the next dependency to look at)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in roots {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Visiting;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                match self.nodes[node].dependencies.get(cursor) {
                    Some(&dep) => {
                        frame.1 += 1;
                        match marks[dep] {
                            Mark::Unvisited => {
                                marks[dep] = Mark::Visiting;
                                stack.push((dep, 0));
                            }
                            Mark::Visiting => {
                                let from = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                                let cycle: Vec<TaskId> =
                                    stack[from..].iter().map(|&(n, _)| self.nodes[n].id).collect();
                                warn!(
                                    "Dropping dependency {} -> {} to break a cycle of {} task(s)",
                                    self.nodes[node].id,
                                    self.nodes[dep].id,
                                    cycle.len()
                                );
                                cycles.push(cycle);
                            }
                            Mark::Visited => {}
                        }
                    }
                    None => {
                        stack.pop();
                        marks[node] = Mark::Visited;
                        order.push(self.nodes[node].id);
                    }
                }
            }
        }

        if cycles.is_empty() {
            Sequence::Ordered(order)
        } else {
            Sequence::CycleDetected { order, cycles }
        }
    }
}

impl Sequence {
    pub fn order(&self) -> &[TaskId] {
        match self {
            Sequence::Ordered(order) | Sequence::CycleDetected { order, .. } => order,
        }
    }

    pub fn into_order(self) -> Vec<TaskId> {
        match self {
            Sequence::Ordered(order) | Sequence::CycleDetected { order, .. } => order,
        }
    }

    pub fn has_cycle(&self) -> bool {
        matches!(self, Sequence::CycleDetected { .. })
    }

    pub fn cycles(&self) -> &[Vec<TaskId>] {
        match self {
            Sequence::Ordered(_) => &[],
            Sequence::CycleDetected { cycles, .. } => cycles,
        }
    }

    /// Resolve the outcome under a cycle policy
    pub fn into_result(self, policy: CyclePolicy) -> Result<Vec<TaskId>> {
        match (self, policy) {
            (Sequence::Ordered(order), _) => Ok(order),
            (Sequence::CycleDetected { order, .. }, CyclePolicy::Tolerate) => Ok(order),
            (Sequence::CycleDetected { cycles, .. }, CyclePolicy::Reject) => {
                Err(SchedulingError::CycleDetected { cycles })
            }
        }
    }
}
