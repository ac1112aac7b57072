//! gltf-draco
//!
//! Compress glTF meshes with Draco, inspect documents, and embed or
//! separate their resources.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use draco_gltf::{Embed, MeshAttribute};
use env_logger::Env;

mod commands;
mod error;

use commands::CompressSettings;

#[derive(Parser)]
#[command(name = "gltf-draco")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Draco compression for glTF 2.0 documents", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress every mesh with KHR_draco_mesh_compression
    Compress {
        /// Input .gltf or .glb file
        input: PathBuf,

        /// Directory receiving the document and its resources
        output_dir: PathBuf,

        /// JSON export configuration; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Encoding speed (0-10)
        #[arg(long, value_parser = clap::value_parser!(i32).range(0..=10))]
        encoding_speed: Option<i32>,

        /// Decoding speed (0-10)
        #[arg(long, value_parser = clap::value_parser!(i32).range(0..=10))]
        decoding_speed: Option<i32>,

        /// Quantization level per attribute class, e.g. position=10
        #[arg(long, value_name = "CLASS=LEVEL", value_parser = commands::parse_quantize)]
        quantize: Vec<(MeshAttribute, i32)>,

        /// What happens to buffers and images
        #[arg(long, value_enum)]
        embed: Option<EmbedArg>,
    },

    /// Print meshes, primitives and attributes
    Inspect {
        /// Input .gltf or .glb file
        input: PathBuf,
    },

    /// Embed every buffer and image as a data uri
    Embed {
        input: PathBuf,
        output_dir: PathBuf,
    },

    /// Write every embedded buffer and image to its own file
    Separate {
        input: PathBuf,
        output_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedArg {
    Keep,
    None,
    All,
}

impl From<EmbedArg> for Embed {
    fn from(arg: EmbedArg) -> Self {
        match arg {
            EmbedArg::Keep => Embed::Keep,
            EmbedArg::None => Embed::None,
            EmbedArg::All => Embed::All,
        }
    }
}

fn print_path(path: PathBuf) {
    println!("{}", path.display());
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Compress {
            input,
            output_dir,
            config,
            encoding_speed,
            decoding_speed,
            quantize,
            embed,
        } => {
            let settings = CompressSettings {
                config,
                encoding_speed,
                decoding_speed,
                quantize,
                embed: embed.map(Embed::from),
            };
            commands::compress(&input, &output_dir, &settings).map(print_path)
        }
        Commands::Inspect { input } => commands::inspect(&input, &mut io::stdout().lock()),
        Commands::Embed { input, output_dir } => {
            commands::repackage(&input, &output_dir, Embed::All).map(print_path)
        }
        Commands::Separate { input, output_dir } => {
            commands::repackage(&input, &output_dir, Embed::None).map(print_path)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            for line in e.lines() {
                eprintln!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}
