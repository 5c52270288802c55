use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nyron::backend::LocalBackend;
use nyron::config::{load_config, NyronConfig};
use nyron::domain::BumpType;
use nyron::error::NyronError;
use nyron::ops;
use nyron::store::Workspace;
use nyron::ui;

#[derive(Parser)]
#[command(
    name = "nyron",
    about = "Monorepo version bumping and changelog automation driven by git tags"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a starter nyron.toml and the .nyron workspace
    Init {
        #[arg(long, help = "Overwrite an existing nyron.toml")]
        force: bool,
    },

    /// Bump a project version: tag, changelog, ledgers, manifest
    Bump {
        #[arg(short, long, help = "Tag prefix of the project (e.g. sdk@)")]
        prefix: String,

        #[arg(short = 'M', long, help = "Major version bump")]
        major: bool,

        #[arg(short = 'm', long, help = "Minor version bump")]
        minor: bool,

        #[arg(long, help = "Patch version bump")]
        patch: bool,

        #[arg(long, help = "Prerelease bump on the beta channel")]
        prerelease: bool,
    },

    /// Regenerate the changelog between the two most recent tags
    Changelog {
        #[arg(short, long, help = "Tag prefix of the project")]
        prefix: String,
    },

    /// Create and push a release tag manually
    Tag {
        #[arg(short, long, help = "Tag prefix of the project")]
        prefix: String,

        #[arg(short, long, help = "Semantic version for the tag")]
        version: String,
    },

    /// Detect and repair drift between config, ledgers, and manifests
    Fix,

    /// Build release notes since the last global release marker
    Release {
        #[arg(long, help = "Print the changelog without creating anything")]
        dry_run: bool,

        #[arg(long, help = "Mint a fresh release marker tag")]
        new_tag: bool,
    },
}

fn fail(err: &NyronError) -> ! {
    ui::display_error(&err.to_string());
    if let Some(hint) = err.remediation() {
        ui::display_hint(hint);
    }
    std::process::exit(1);
}

fn load(args_config: Option<&PathBuf>) -> NyronConfig {
    match load_config(args_config.map(|p| p.as_path())) {
        Ok(config) => config,
        Err(e) => fail(&e),
    }
}

fn open_backend(config: &NyronConfig) -> LocalBackend {
    match LocalBackend::open(".", config.repo.clone()) {
        Ok(backend) => backend,
        Err(e) => fail(&e),
    }
}

fn bump_type(major: bool, minor: bool, patch: bool, prerelease: bool) -> BumpType {
    let selected = [major, minor, patch, prerelease]
        .iter()
        .filter(|b| **b)
        .count();
    if selected != 1 {
        ui::display_error("Exactly one of --major, --minor, --patch, --prerelease is required");
        std::process::exit(1);
    }
    if major {
        BumpType::Major
    } else if minor {
        BumpType::Minor
    } else if patch {
        BumpType::Patch
    } else {
        BumpType::Prerelease
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let workspace = match Workspace::discover() {
        Ok(workspace) => workspace,
        Err(e) => fail(&e),
    };

    match args.command {
        Command::Init { force } => {
            if let Err(e) = ops::init::init(&workspace, force, Utc::now()) {
                fail(&e);
            }
        }

        Command::Bump {
            prefix,
            major,
            minor,
            patch,
            prerelease,
        } => {
            let config = load(args.config.as_ref());
            let backend = open_backend(&config);
            let bump = bump_type(major, minor, patch, prerelease);

            let mut transaction = ops::BumpTransaction::new(&config, &workspace, &backend);
            match transaction.run(&prefix, bump) {
                Ok(report) => {
                    if config.on_push_reminder {
                        ui::display_status(&format!(
                            "Remember to push the changelog commit: git push origin HEAD ({})",
                            report.full_tag
                        ));
                    }
                }
                Err(e) => fail(&e),
            }
        }

        Command::Changelog { prefix } => {
            let config = load(args.config.as_ref());
            let backend = open_backend(&config);
            if let Err(e) = ops::changelog::changelog(&workspace, &backend, &prefix) {
                fail(&e);
            }
        }

        Command::Tag { prefix, version } => {
            let config = load(args.config.as_ref());
            let backend = open_backend(&config);
            if let Err(e) = ops::tag::tag(&config, &backend, &prefix, &version) {
                fail(&e);
            }
        }

        Command::Fix => {
            let config = load(args.config.as_ref());
            let backend = open_backend(&config);
            let mut confirm = |question: &str| ui::confirm(question);
            match ops::fix::fix(&workspace, &config, &backend, &mut confirm) {
                Ok(summary) => {
                    if !summary.fixes.is_empty() {
                        println!("\nApplied fixes:");
                        for (i, entry) in summary.fixes.iter().enumerate() {
                            println!("  {}. {}", i + 1, entry);
                        }
                        ui::display_success(&format!(
                            "Total: {} fix(es) applied.",
                            summary.fixes.len()
                        ));
                    }
                }
                Err(e) => fail(&e),
            }
        }

        Command::Release { dry_run, new_tag } => {
            let config = load(args.config.as_ref());
            let backend = open_backend(&config);
            let options = ops::ReleaseOptions { dry_run, new_tag };
            if let Err(e) =
                ops::release::release(&workspace, &config, &backend, None, options, Utc::now())
            {
                fail(&e);
            }
        }
    }

    Ok(())
}
