// One submodule per subcommand.

pub mod add;
pub mod delete;
pub mod edit;
pub mod edit_occurrence;
pub mod exclude;
pub mod list;
pub mod occurrences;
pub mod overrides;
pub mod show;
