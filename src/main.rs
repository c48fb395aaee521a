//! coursepack - SCORM course package compiler

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coursepack::media::project_id_from_name;
use coursepack::normalize::normalize_bytes;
use coursepack::render::RenderOptions;
use coursepack::{
    BuildConfig, CancelToken, Compiler, DirectoryStore, MediaStore, MemoryStore, NavigationGraph,
    NavigationMode, ScormVersion,
};

#[derive(Parser)]
#[command(name = "coursepack")]
#[command(version, about = "SCORM course package compiler", long_about = None)]
#[command(after_help = "EXAMPLES:
    coursepack build course.json -o course.zip                Build with no media
    coursepack build course.json -o course.zip --media-dir projects --project 123
    coursepack inspect course.json                            Show normalized pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a course document into a package
    Build {
        /// Course document (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output archive
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Media store root (`<DIR>/<project>/media`)
        #[arg(long, value_name = "DIR")]
        media_dir: Option<PathBuf>,

        /// Project id within the media store
        #[arg(long)]
        project: Option<String>,

        /// Build configuration (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Target SCORM version (1.2 or 2004)
        #[arg(long)]
        scorm_version: Option<ScormVersion>,

        /// Emit a strict Content-Security-Policy
        #[arg(long)]
        strict_csp: bool,

        /// Override the assessment pass mark (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        pass_mark: Option<u8>,

        /// Outline navigation (linear or free)
        #[arg(long)]
        navigation_mode: Option<NavigationMode>,

        /// Allow only one assessment attempt
        #[arg(long)]
        no_retake: bool,
    },
    /// Print the normalized course and navigation graph
    Inspect {
        /// Course document (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Build {
            input,
            output,
            media_dir,
            project,
            config,
            scorm_version,
            strict_csp,
            pass_mark,
            navigation_mode,
            no_retake,
        } => {
            let options = BuildArgs {
                media_dir,
                project,
                config,
                scorm_version,
                strict_csp,
                pass_mark,
                navigation_mode,
                no_retake,
            };
            build(&input, &output, options, cli.quiet).await
        }
        Command::Inspect { input } => inspect(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct BuildArgs {
    media_dir: Option<PathBuf>,
    project: Option<String>,
    config: Option<PathBuf>,
    scorm_version: Option<ScormVersion>,
    strict_csp: bool,
    pass_mark: Option<u8>,
    navigation_mode: Option<NavigationMode>,
    no_retake: bool,
}

fn load_config(args: &BuildArgs) -> coursepack::Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(version) = args.scorm_version {
        config = config.with_scorm_version(version);
    }
    if args.strict_csp {
        config = config.with_strict_content_policy(true);
    }
    if let Some(pass_mark) = args.pass_mark {
        config = config.with_pass_mark(pass_mark);
    }
    if let Some(project) = &args.project {
        config = config.with_project_id(project.clone());
    }
    if let Some(mode) = args.navigation_mode {
        config = config.with_navigation_mode(mode);
    }
    if args.no_retake {
        config = config.with_allow_retake(false);
    }
    Ok(config)
}

async fn build(input: &Path, output: &Path, args: BuildArgs, quiet: bool) -> Result<(), String> {
    let mut config = load_config(&args).map_err(|e| e.to_string())?;

    let store: Arc<dyn MediaStore> = match &args.media_dir {
        Some(dir) => {
            let project = config.project_id.clone().unwrap_or_else(|| {
                let name = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                project_id_from_name(&name)
            });
            config.project_id = Some(project.clone());
            Arc::new(DirectoryStore::new(dir.clone(), &project))
        }
        None => Arc::new(MemoryStore::new()),
    };

    let bytes = std::fs::read(input).map_err(|e| format!("{}: {e}", input.display()))?;
    let content = normalize_bytes(&bytes).map_err(|e| e.to_string())?;

    let compiler = Compiler::new(config, store);
    let output_data = compiler
        .build_content(&content, &CancelToken::new())
        .await
        .map_err(|e| e.to_string())?;

    for warning in &output_data.warnings {
        if !quiet {
            eprintln!("warning: {warning}");
        }
    }
    std::fs::write(output, &output_data.archive)
        .map_err(|e| format!("{}: {e}", output.display()))?;

    if !quiet {
        println!(
            "{} -> {} ({} files, {} bytes)",
            input.display(),
            output.display(),
            output_data.manifest_files.len(),
            output_data.archive.len()
        );
    }
    Ok(())
}

fn inspect(input: &Path) -> Result<(), String> {
    let bytes = std::fs::read(input).map_err(|e| format!("{}: {e}", input.display()))?;
    let content = normalize_bytes(&bytes).map_err(|e| e.to_string())?;
    let options = RenderOptions::new(&content, &BuildConfig::default());
    let graph = NavigationGraph::from_content(&content, options.pass_mark);

    let report = serde_json::json!({
        "course": content,
        "navigation": graph,
    });
    let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
