pub mod container;
pub mod control_model;
pub mod extractor;
pub mod label;
