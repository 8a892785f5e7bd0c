//! The step graph: definition, router, step executors and the runner.

pub mod definition;
pub mod events;
pub mod executor;
pub mod router;
pub mod steps;

pub use definition::{GraphBuilder, GraphDefinition, RouteTable, Step, Target, Transition};
pub use events::{RunEvent, RunEventPayload, RunEventSink, RunId};
pub use executor::{Executor, RunControl};
pub use router::{route, route_message, MessageKind, Route};
pub use steps::{summary_prompt, StepContext, ToolErrorPolicy};
