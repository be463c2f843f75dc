pub mod mapping;
pub mod profile;
pub mod resolver;
pub mod value_map;
