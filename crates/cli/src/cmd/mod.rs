mod build;
mod install;

pub use build::cmd_build;
pub use install::cmd_install;
