//! myst-exercise command-line entry point.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use myst_exercise::build;
use myst_exercise::config::Settings;

/// Exercise and solution admonitions for MyST Markdown builds
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every Markdown document under a project root
    #[command(visible_alias = "b")]
    Build {
        /// Project root directory
        #[arg(default_value = ".", value_hint = clap::ValueHint::DirPath)]
        root: PathBuf,

        /// Output format for rendered fragments
        #[arg(long, value_enum, default_value_t = Format::Html)]
        format: Format,

        /// Directory to write one fragment per document into; fragments go
        /// to stdout when omitted
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        out: Option<PathBuf>,

        /// Print the exercise registry as JSON instead of rendered output
        #[arg(long)]
        dump_registry: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Html,
    Latex,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Latex => "tex",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            root,
            format,
            out,
            dump_registry,
        } => run_build(&root, format, out.as_deref(), dump_registry),
    }
}

fn run_build(
    root: &std::path::Path,
    format: Format,
    out: Option<&std::path::Path>,
    dump_registry: bool,
) -> anyhow::Result<()> {
    let settings = Settings::new(root)?;
    let build = build::build(&settings, root)?;

    // Warnings are advisory; they never change the exit status.
    for warning in build.warnings.iter() {
        eprintln!("warning: {warning}");
    }

    if dump_registry {
        println!("{}", serde_json::to_string_pretty(&build.registry)?);
        return Ok(());
    }

    let fragments = match format {
        Format::Html => build.render_html(),
        Format::Latex => build.render_latex(),
    };

    match out {
        Some(out_dir) => {
            for (docname, fragment) in &fragments {
                let path = out_dir.join(format!("{docname}.{}", format.extension()));
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(&path, fragment)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
        None => {
            for fragment in fragments.values() {
                print!("{fragment}");
            }
        }
    }

    Ok(())
}
