pub mod customresourcedefinition;
pub mod daemonset;
pub mod deployment;
pub mod namespace;
pub mod pod;
pub mod processor;
pub mod subject;

mod kind;

pub use kind::{ResourceKind, SubjectKind, UnknownKind};
