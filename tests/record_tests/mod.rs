//! Record codec tests

mod header_tests;
