//! Structured logging setup (SPEC_FULL.md §4.9), driven by `config.log`.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install a global `tracing` subscriber filtered by `config.level`
/// (a standard `EnvFilter` directive string, e.g. `"info"` or
/// `"utapi_server=debug,info"`).
///
/// `config.dump_level`, when set, is layered in as an additional directive
/// so operators can turn on full per-command batch-result dumps
/// (`tracing::trace!` call sites in `utapi-client`/`utapi-reader`) without
/// raising the baseline level everywhere else.
pub fn init(config: &LogConfig) {
    let mut filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(dump_level) = &config.dump_level {
        if let Ok(directive) = dump_level.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
