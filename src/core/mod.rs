pub mod deadline;
pub mod validation;
