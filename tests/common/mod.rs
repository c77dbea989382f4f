#![allow(dead_code)]

pub use feater_test_utils::builders;
pub use feater_test_utils::fake_runner;
pub use feater_test_utils::fakes;
pub use feater_test_utils::{init_tracing, with_timeout};

use feater_exec::log::CommandLog;

/// Messages of every line in `log`, in order.
pub fn messages(log: &CommandLog) -> Vec<String> {
    log.messages().map(str::to_string).collect()
}

/// How many lines in `log` carry exactly `message`.
pub fn count(log: &CommandLog, message: &str) -> usize {
    log.messages().filter(|m| *m == message).count()
}
