pub mod context;
pub mod names;
pub mod resolver;

pub use context::UsageContext;
pub use resolver::{MatchStage, NameResolver, ResolvedName, UNRESOLVED_PREFIX};
