pub mod description;
pub mod operation;

#[cfg(test)]
mod description_test;

pub use description::{InterfaceDescription, SanitizedDescription, VersionToken};
pub use operation::{BodyShape, Operation, OperationParam, ParamLocation};
