// Aggregator for discovery-loop integration tests in `tests/discovery/`.

#[path = "discovery/poll_test.rs"]
mod poll_test;

#[path = "discovery/active_test.rs"]
mod active_test;

#[path = "discovery/listen_test.rs"]
mod listen_test;

#[path = "discovery/activation_test.rs"]
mod activation_test;
