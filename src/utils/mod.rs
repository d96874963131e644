// utils/mod.rs
//
// Small ambient helpers that don't belong to the engine's core state
// machine. `logger` is a file-backed execution-log writer, used alongside
// the `log`-crate macros sprinkled through `engine`: the crate's structured
// event trace goes through `log`/`env_logger`, while a full per-cycle
// transcript can additionally be captured to a file via `Logger` when
// `--log-file` is passed on the CLI.

pub mod logger;
