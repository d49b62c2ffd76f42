/*! Integration tests for Roster.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - registry: SessionRegistry add/remove/lookup and default-session rebuild
 * - lifecycle: session creation, listener wiring and teardown pipelines
 * - trust: certificate trust negotiation, deduplication and ignore cache
 * - backup: key-backup listener registration through session sync
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roster=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod lifecycle;
mod registry;
