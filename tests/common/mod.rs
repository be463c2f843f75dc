#![allow(dead_code)]

pub mod synthetic;
pub mod utils;
