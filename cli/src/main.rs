mod test_runner;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{debug, warn};

use editor::{DocumentHost, Editor, MemoryHost, SceneEntry};
use screenplay::config::ImportConfig;
use screenplay::document::Document;
use screenplay::transcript::classify;

#[derive(Parser)]
#[command(name = "screenplay", version, about = "Screenplay block editing core")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log decisions to stderr (repeat for more detail; RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a "Speaker: line" transcript into screenplay blocks
    Import(ImportArgs),

    /// Print the scene index of a listing
    Scenes(ScenesArgs),

    /// Run .test.md editing scenarios
    Test(TestArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Listing,
    Json,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Transcript file, or `-` for stdin
    file: String,

    /// TOML file with [scene] details and [characters] mappings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interior/exterior marker, e.g. "EXT."
    #[arg(long)]
    int_ext: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    time: Option<String>,

    /// Speaker mapping FROM=TO. Repeatable; TO is uppercased.
    #[arg(short, long = "map", value_name = "FROM=TO")]
    maps: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Listing)]
    format: Format,

    /// Print the scene index of the result instead of the blocks
    #[arg(long)]
    scenes: bool,
}

#[derive(clap::Args)]
struct ScenesArgs {
    /// Listing file (`type: text` per line), or `-` for stdin
    file: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose, cli.no_color);

    match cli.command {
        Command::Import(args) => do_import(args),
        Command::Scenes(args) => do_scenes(args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn setup_tracing(verbose: u8, no_color: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn read_input(file: &str) -> String {
    let result = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        std::fs::read_to_string(file)
    };
    match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    }
}

fn do_import(args: ImportArgs) {
    let mut config = match &args.config {
        Some(path) => match ImportConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => ImportConfig::default(),
    };

    if let Some(int_ext) = args.int_ext {
        config.scene.int_ext = int_ext;
    }
    if let Some(location) = args.location {
        config.scene.location = location;
    }
    if let Some(time) = args.time {
        config.scene.time = time;
    }
    for row in &args.maps {
        let Some((from, to)) = row.split_once('=') else {
            eprintln!("error: invalid --map '{}' (expected FROM=TO)", row);
            process::exit(2);
        };
        if !config.add_mapping(from, to) {
            warn!(mapping = %row, "skipping mapping with an empty side");
        }
    }

    let raw = read_input(&args.file);
    let blocks = classify(&raw, &config.scene, &config.characters);
    debug!(blocks = blocks.len(), heading = %config.scene.heading(), "transcript classified");

    let mut editor = Editor::new(MemoryHost::default());
    if let Err(e) = editor.host_mut().load(Document::new(blocks)) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    if args.scenes {
        print_scenes(&editor.scene_index());
        return;
    }

    let document = editor.host().document();
    match args.format {
        Format::Listing => print!("{}", document),
        Format::Json => match serde_json::to_string_pretty(document) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize document: {}", e);
                process::exit(1);
            }
        },
    }
}

fn do_scenes(args: ScenesArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = read_input(&args.file);
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = screenplay::parser::Parser::new(source, file_id);
    let listing = match parser.parse() {
        Ok(listing) => listing,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    let entries: Vec<SceneEntry> = editor::scene_index::scan(&listing.document).collect();
    print_scenes(&entries);
}

fn print_scenes(entries: &[SceneEntry]) {
    for entry in entries {
        println!("{}\t{}", entry.position, entry.label);
    }
}
