//! SessionLifecycleCoordinator integration tests
//!
//! Tests session construction and wiring, live-event handling, and the
//! deactivate / clear / clear-all / reload teardown pipelines.

mod create;
mod events;
mod teardown;
