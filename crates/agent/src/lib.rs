//! Agent composition: prompt assembly, the reasoning runtime, and the
//! demo fallback responder.

pub mod fallback;
pub mod prompt;
pub mod runtime;

pub use fallback::DemoResponder;
pub use prompt::PromptAssembler;
pub use runtime::{AgentRuntime, BoundAgent, RuntimeResult};
