//! Command-line interface definitions for the `rtkernel` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Resolve PREEMPT_RT kernel releases and prepare their build configuration.
#[derive(Parser, Debug)]
#[command(name = "rtkernel")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Pick a kernel line and patch interactively, then print the links:\n",
    "    $ rtkernel select\n\n",
    "  Links for a known patch revision:\n",
    "    $ rtkernel links 5.10.78-rt55\n\n",
    "  Prepare a distribution config for a local RT build:\n",
    "    $ rtkernel config rt-preset linux-5.10.78/.config\n",
))]
pub struct Cli {
    /// Settings file [default: ~/.config/rtkernel/settings.json]
    #[arg(long, value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List RT kernel lines, e.g. 6.6
    Minors,

    /// List RT patch revisions of one kernel line
    Patches {
        /// Kernel line, e.g. 5.10
        minor: String,
    },

    /// Show the running kernel release and its line
    Current,

    /// Print download links for an RT patch and its base kernel
    Links {
        /// Full patch version, e.g. 5.10.78-rt55
        patch: String,
    },

    /// Choose a kernel line and patch interactively, then print the links
    Select,

    /// List Debian RT kernel image packages
    DebianPackages(DebianArgs),

    /// Resolve the .deb download link of a Debian package
    DebianLink {
        /// Package name, e.g. linux-image-6.1.0-13-rt-amd64
        package: String,

        #[command(flatten)]
        debian: DebianArgs,
    },

    /// Choose a Debian RT package interactively and print its .deb link
    DebianSelect(DebianArgs),

    /// Edit a kernel build configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Debian release and architecture, overriding settings
#[derive(Args, Debug, Clone, Default)]
pub struct DebianArgs {
    /// Release codename, e.g. trixie
    #[arg(long, env = "DEBIAN_VERSION")]
    pub codename: Option<String>,

    /// Package architecture, e.g. amd64
    #[arg(long, env = "ARCH")]
    pub arch: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Replace the value of KEY (quotes are part of VALUE)
    Replace {
        path: PathBuf,
        key: String,
        value: String,
    },

    /// Comment out the active definition of KEY
    CommentOut { path: PathBuf, key: String },

    /// Clear distribution signing keys so a local RT build succeeds
    RtPreset { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_links() {
        let cli = Cli::try_parse_from(["rtkernel", "links", "5.10.78-rt55"]).unwrap();
        assert!(matches!(cli.command, Command::Links { patch } if patch == "5.10.78-rt55"));
        assert!(!cli.debug);
    }

    #[test]
    fn test_parse_config_replace() {
        let cli = Cli::try_parse_from([
            "rtkernel",
            "config",
            "replace",
            ".config",
            "CONFIG_SYSTEM_TRUSTED_KEYS",
            "\"\"",
        ])
        .unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Replace { key, value, .. }) => {
                assert_eq!(key, "CONFIG_SYSTEM_TRUSTED_KEYS");
                assert_eq!(value, "\"\"");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_debian_flags() {
        let cli = Cli::try_parse_from([
            "rtkernel",
            "debian-packages",
            "--codename",
            "bookworm",
            "--arch",
            "arm64",
        ])
        .unwrap();
        match cli.command {
            Command::DebianPackages(args) => {
                assert_eq!(args.codename.as_deref(), Some("bookworm"));
                assert_eq!(args.arch.as_deref(), Some("arm64"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
