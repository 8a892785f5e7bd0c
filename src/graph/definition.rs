//! Graph topology: steps, fixed edges and router-resolved edges.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::router::{self, Route};
use crate::error::{BotError, Result};
use crate::types::MessageHistory;

/// A node of the graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    Respond,
    InvokeTool,
    Summarize,
}

/// Where an edge leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Step(Step),
    Terminal,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(step) => fmt::Display::fmt(step, f),
            Self::Terminal => f.write_str("__end__"),
        }
    }
}

impl From<Step> for Target {
    fn from(step: Step) -> Self {
        Self::Step(step)
    }
}

/// Label-to-target mapping for a conditional edge group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    targets: HashMap<Route, Target>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, route: Route, target: impl Into<Target>) -> Self {
        self.targets.insert(route, target.into());
        self
    }

    pub fn target(&self, route: Route) -> Option<Target> {
        self.targets.get(&route).copied()
    }
}

/// The single outgoing rule of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Always(Target),
    Route(RouteTable),
}

/// A validated, read-only graph. Shared across invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDefinition {
    start: Step,
    transitions: HashMap<Step, Transition>,
}

impl GraphDefinition {
    /// The chatbot topology:
    ///
    /// ```text
    /// start -> respond -(tools)-----> invoke_tool -> respond
    ///                  -(summarize)-> summarize -> end
    ///                  -(terminate)-> end
    /// ```
    pub fn chatbot() -> Self {
        let respond_table = RouteTable::new()
            .on(Route::Tools, Step::InvokeTool)
            .on(Route::Summarize, Step::Summarize)
            .on(Route::Terminate, Target::Terminal);
        Self {
            start: Step::Respond,
            transitions: HashMap::from([
                (Step::Respond, Transition::Route(respond_table)),
                (Step::InvokeTool, Transition::Always(Step::Respond.into())),
                (Step::Summarize, Transition::Always(Target::Terminal)),
            ]),
        }
    }

    pub fn start(&self) -> Step {
        self.start
    }

    pub fn transition(&self, step: Step) -> Option<&Transition> {
        self.transitions.get(&step)
    }

    /// Resolve what follows `step`, consulting the router for conditional
    /// edges. Returns the route label when one was evaluated.
    pub fn next(&self, step: Step, history: &MessageHistory) -> Result<(Target, Option<Route>)> {
        match self.transition(step) {
            Some(Transition::Always(target)) => Ok((*target, None)),
            Some(Transition::Route(table)) => {
                let label = router::route(history)?;
                let target = table.target(label).ok_or_else(|| {
                    BotError::PreconditionViolation(format!(
                        "no target for label '{label}' from step '{step}'"
                    ))
                })?;
                Ok((target, Some(label)))
            }
            None => Err(BotError::PreconditionViolation(format!(
                "step '{step}' has no outgoing transition"
            ))),
        }
    }
}

/// Assembles and validates a [`GraphDefinition`].
#[derive(Debug)]
pub struct GraphBuilder {
    start: Step,
    transitions: HashMap<Step, Transition>,
    errors: Vec<String>,
}

impl GraphBuilder {
    pub fn new(start: Step) -> Self {
        Self {
            start,
            transitions: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_edge(self, from: Step, to: impl Into<Target>) -> Self {
        self.insert(from, Transition::Always(to.into()))
    }

    pub fn add_conditional_edges(self, from: Step, table: RouteTable) -> Self {
        self.insert(from, Transition::Route(table))
    }

    fn insert(mut self, from: Step, transition: Transition) -> Self {
        if self.transitions.insert(from, transition).is_some() {
            self.errors
                .push(format!("step '{from}' has more than one outgoing transition"));
        }
        self
    }

    /// Check that every step reachable from start has exactly one rule and
    /// that every conditional group covers all router labels.
    pub fn compile(mut self) -> Result<GraphDefinition> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.start]);

        while let Some(step) = queue.pop_front() {
            if !seen.insert(step) {
                continue;
            }
            let targets: Vec<Target> = match self.transitions.get(&step) {
                None => {
                    self.errors
                        .push(format!("step '{step}' has no outgoing transition"));
                    continue;
                }
                Some(Transition::Always(target)) => vec![*target],
                Some(Transition::Route(table)) => Route::iter()
                    .filter_map(|label| {
                        let target = table.target(label);
                        if target.is_none() {
                            self.errors.push(format!(
                                "conditional edges from '{step}' do not cover label '{label}'"
                            ));
                        }
                        target
                    })
                    .collect(),
            };
            queue.extend(targets.into_iter().filter_map(|target| match target {
                Target::Step(next) => Some(next),
                Target::Terminal => None,
            }));
        }

        if !self.errors.is_empty() {
            return Err(BotError::InvalidGraph(self.errors.join("; ")));
        }

        Ok(GraphDefinition {
            start: self.start,
            transitions: self.transitions,
        })
    }
}
