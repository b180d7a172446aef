//! AgentFlow core: routes a free-text agent request to a workflow, runs the
//! workflow's lookup tools and produces a fixed-shape response envelope.

pub mod agent;
pub mod dates;
pub mod error;
pub mod fixtures;
pub mod invoke;
pub mod normalize;
pub mod router;
pub mod tools;
pub mod trail;

pub use agent::{ActionEntry, ActionKind, AgentRequest, AgentResponse};
pub use router::{DecisionRouter, Route};
