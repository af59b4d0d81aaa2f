// logging.rs — `log` / `env_logger` setup for the cea binary
//
// Library code logs through the `log` facade: `debug!` for per-run
// summaries, `trace!` for per-operation decisions in the escape analysis.
// `RUST_LOG` always wins when set; otherwise the level passed here applies.
//
// Side effects: installs the global logger (once per process).

use std::io::Write;
use std::sync::Once;

use env_logger::{Builder, Env};
use log::LevelFilter;

static INIT: Once = Once::new();

/// Initialize logging at `level` unless `RUST_LOG` says otherwise.
///
/// Only the first call has any effect.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::from_env(Env::default().default_filter_or(level.as_str()))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "cea: [{:5}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to warnings only.
pub fn init_from_env() {
    init_with_level(LevelFilter::Warn);
}

/// Logger for tests: captured by the harness. `RUST_LOG` overrides the
/// default `warn` filter.
pub fn init_test() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}
