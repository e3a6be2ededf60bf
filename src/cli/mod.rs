//! # Command-Line Interface
//!
//! Manage a network database and query translations from the shell.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Network setup and state | `init`, `status` |
//! | Sites | Sites and their relations | `site add`, `relate`, `unrelate` |
//! | Languages | Language table and site assignment | `language add`, `language assign` |
//! | Content | Posts, terms and links | `content add`, `link`, `unlink` |
//! | Lookup | Translation queries | `translations 42 --sort name` |
//! | Modules | Feature switches | `module enable trasher` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr. `RUST_LOG` selects what is shown; `--verbose` raises
//! the default level to `debug`:
//! ```bash
//! mlp --verbose translations 42
//! ```
//!
//! ## Entry Point
//!
//! Parse a [`Cli`] and pass it to [`run()`].

mod app;
mod content;
mod language;
mod module_cmd;
mod output;
mod runtime;
mod site;
mod translations;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
