//! Storage engine tests

mod atomicity_tests;
mod property_tests;
