//! The default exhaustion policy ends the process.
//!
//! `process::exit` cannot be observed in-process, so the test re-runs its
//! own binary as a child with an env guard and inspects how the child died.

use netbuf::{BufferPool, ExhaustionPolicy, PoolConfig};
use std::env;
use std::process::Command;

const CHILD_ENV: &str = "NETBUF_ABORT_CHILD";
const TEST_NAME: &str = "test_abort_policy_exits_process";

fn exhaust_pool() -> ! {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let pool = BufferPool::new(
        PoolConfig::new()
            .with_mem_limit_kb(8)
            .with_exhaustion_policy(ExhaustionPolicy::Abort),
    );
    let _first = pool.allocate_default().unwrap();
    // 4 + 4 >= 8
    let _second = pool.allocate_default();
    panic!("allocation past the ceiling returned under Abort");
}

#[test]
fn test_abort_policy_exits_process() {
    if env::var_os(CHILD_ENV).is_some() {
        exhaust_pool();
    }

    let output = Command::new(env::current_exe().unwrap())
        .args(["--exact", TEST_NAME, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "child stderr:\n{}", stderr);
    assert!(
        stderr.contains("buffer pool uses too much memory, exiting"),
        "child stderr:\n{}",
        stderr
    );
    assert!(!stderr.contains("returned under Abort"));
}

#[test]
fn test_abort_is_default_policy() {
    assert_eq!(PoolConfig::default().exhaustion_policy, ExhaustionPolicy::Abort);
}
