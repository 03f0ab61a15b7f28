//! CLI argument parsing.
//!
//! One positional revision plus mode flags; the default mode only writes the
//! manifest.
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "delta-deploy",
    version,
    about = "Build a metadata manifest from changed files and optionally retrieve or deploy it",
    after_help = "Modes:\n  (default)            write package.xml for the changed components\n  --retrieve-only      retrieve the changed components into the source tree\n  --changeset <NAME>   retrieve, stamp NAME as fullName, repackage, and deploy\n\nExamples:\n  delta-deploy main\n  delta-deploy main --output manifest/delta.xml\n  delta-deploy release/1.4 --retrieve-only --target-org uat\n  delta-deploy main --changeset \"Sprint 12\" --target-org prod",
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Revision to compare against (branch, tag, or commit)
    #[arg(value_name = "BRANCH", value_parser = NonEmptyStringValueParser::new())]
    pub branch: String,

    /// Revision holding the changes
    #[arg(long, value_name = "REV", default_value = "HEAD")]
    pub head: String,

    /// Retrieve the changed components into the local source tree and stop
    #[arg(long, conflicts_with = "changeset")]
    pub retrieve_only: bool,

    /// Deploy the changed components as a change set with this name
    #[arg(long, value_name = "NAME", value_parser = NonEmptyStringValueParser::new())]
    pub changeset: Option<String>,

    /// Where to write the manifest in the default mode (relative to the project root)
    #[arg(long, value_name = "PATH", conflicts_with_all = ["retrieve_only", "changeset"])]
    pub output: Option<PathBuf>,

    /// Project root containing the source tree and optional .delta-deploy.json
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Manifest API version (overrides the config file)
    #[arg(long, value_name = "X.Y")]
    pub api_version: Option<String>,

    /// Org alias or username passed to the platform CLI
    #[arg(long, value_name = "ALIAS")]
    pub target_org: Option<String>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// What to do with the generated manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ManifestOnly { output: Option<PathBuf> },
    RetrieveOnly,
    Deploy { changeset: String },
}

impl RootArgs {
    pub fn mode(&self) -> Mode {
        if let Some(changeset) = &self.changeset {
            return Mode::Deploy {
                changeset: changeset.clone(),
            };
        }
        if self.retrieve_only {
            return Mode::RetrieveOnly;
        }
        Mode::ManifestOnly {
            output: self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<RootArgs, clap::Error> {
        RootArgs::try_parse_from(std::iter::once("delta-deploy").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn branch_alone_selects_manifest_mode() {
        let args = parse(&["main"]).expect("parse");
        assert_eq!(args.branch, "main");
        assert_eq!(args.head, "HEAD");
        assert_eq!(args.mode(), Mode::ManifestOnly { output: None });
    }

    #[test]
    fn changeset_selects_deploy_mode() {
        let args = parse(&["main", "--changeset", "Sprint 12"]).expect("parse");
        assert_eq!(
            args.mode(),
            Mode::Deploy {
                changeset: "Sprint 12".to_string()
            }
        );
    }

    #[test]
    fn retrieve_only_selects_retrieve_mode() {
        let args = parse(&["main", "--retrieve-only"]).expect("parse");
        assert_eq!(args.mode(), Mode::RetrieveOnly);
    }

    #[test]
    fn missing_branch_is_a_usage_error() {
        let err = parse(&["--retrieve-only"]).expect_err("missing branch");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn no_arguments_shows_help() {
        let err = parse(&[]).expect_err("no args");
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn modes_conflict() {
        let err = parse(&["main", "--retrieve-only", "--changeset", "x"]).expect_err("conflict");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        let err = parse(&["main", "--output", "p.xml", "--changeset", "x"]).expect_err("conflict");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["main", "--deploy-everything"]).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn empty_changeset_is_rejected() {
        assert!(parse(&["main", "--changeset", ""]).is_err());
    }
}
