//! Tests for the relational resolvers.
//!
//! Storage wrappers in `mocks` count, reverse, or fail reads so the tests can
//! observe how many calls a flush makes and that results follow key order.

mod resolver_tests;
