pub mod accessor;
pub mod document;
