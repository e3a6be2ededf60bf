//! Module CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::runtime::Runtime;
use crate::domain::ModuleId;
use crate::module::ModuleManager;
use crate::storage::Options;

#[derive(Subcommand)]
pub enum ModuleCommands {
    /// List persisted module states
    List,

    /// Switch a module on
    Enable {
        /// Module ID (e.g., trasher)
        module: ModuleId,
    },

    /// Switch a module off
    Disable {
        /// Module ID (e.g., trasher)
        module: ModuleId,
    },
}

pub fn run(cmd: ModuleCommands, output: &Output) -> Result<()> {
    let runtime = Runtime::open()?;
    let modules = ModuleManager::new(Options::new(runtime.database()));

    match cmd {
        ModuleCommands::List => list_modules(output, &modules),
        ModuleCommands::Enable { module } => {
            modules.enable(&module.slug())?;
            output.success(&format!("Enabled module {}", module));
            Ok(())
        }
        ModuleCommands::Disable { module } => {
            modules.disable(&module.slug())?;
            output.success(&format!("Disabled module {}", module));
            Ok(())
        }
    }
}

fn list_modules(output: &Output, modules: &ModuleManager) -> Result<()> {
    let states = modules.states_snapshot()?;

    if output.is_json() {
        output.data(&states);
    } else if states.is_empty() {
        println!("No modules found.");
    } else {
        output.header(&format!("{:<30} STATE", "MODULE"));
        for (slug, active) in &states {
            println!("{:<30} {}", slug, if *active { "enabled" } else { "disabled" });
        }
    }

    Ok(())
}
