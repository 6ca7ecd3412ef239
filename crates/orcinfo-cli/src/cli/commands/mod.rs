//! CLI command handlers, one file per command.

mod collect;
mod completions;
mod inspect;

pub use collect::run_collect;
pub use completions::{run_completions, run_man};
pub use inspect::run_inspect;

#[cfg(test)]
pub(crate) use collect::apply_overrides;
#[cfg(test)]
pub(crate) use inspect::print_tail;
