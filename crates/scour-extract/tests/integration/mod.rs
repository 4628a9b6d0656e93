pub mod common;

mod adapter_tests;
mod pipeline_tests;
