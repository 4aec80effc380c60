mod common;
mod edit_tests;
mod resolve_tests;
