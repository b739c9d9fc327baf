use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use swfdata::ShapeVersion;
use swfrip::decompile::{Decompiler, Options};
use swfrip::svg::SvgRenderer;
use swfrip::Extractor;

#[derive(Parser)]
#[command(name = "swfrip", about = "SWF asset extraction and decompilation toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every asset from a SWF container into a directory.
    Extract {
        /// Input .swf file (FWS or CWS).
        input: PathBuf,
        /// Output directory; created if missing.
        output_dir: PathBuf,
    },
    /// Render a previously extracted shape payload as an SVG document.
    #[command(name = "shape-to-svg")]
    ShapeToSvg {
        /// A shape_<id>.dat payload produced by `extract`.
        shape: PathBuf,
        /// Shape tag version (1-4); the payload does not carry it.
        version: u8,
        /// Output .svg path.
        output: PathBuf,
    },
    /// Decompile an ABC bytecode file to ActionScript-like source.
    Abcdec {
        /// An .abc image, with or without a leading doABC tag header.
        file: PathBuf,
        /// Output directory for the class tree.
        #[arg(long, default_value = "outputABC_decompiled")]
        out_dir: PathBuf,
        /// Keep comments for suppressed and unknown opcodes.
        #[arg(long)]
        opcode_comments: bool,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Extract { input, output_dir } => cmd_extract(&input, &output_dir),
        Command::ShapeToSvg {
            shape,
            version,
            output,
        } => cmd_shape_to_svg(&shape, version, &output),
        Command::Abcdec {
            file,
            out_dir,
            opcode_comments,
        } => cmd_abcdec(&file, &out_dir, opcode_comments),
    }
}

fn cmd_extract(input: &Path, output_dir: &Path) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("failed to open {}", input.display()))?;
    let mut extractor = Extractor::new(output_dir)?;
    extractor.run(&raw)
}

fn cmd_shape_to_svg(shape: &Path, version: u8, output: &Path) -> Result<()> {
    if !(1..=4).contains(&version) {
        bail!("shape version must be 1-4, got {version}");
    }
    let data = fs::read(shape).with_context(|| format!("failed to open {}", shape.display()))?;
    let decoded = swfdata::shape::decode_shape(&data, ShapeVersion(version))?;
    let document = SvgRenderer::render(&decoded);
    fs::write(output, document)
        .with_context(|| format!("failed to write {}", output.display()))?;
    eprintln!("[shape] wrote {}", output.display());
    Ok(())
}

fn cmd_abcdec(file: &Path, out_dir: &Path, opcode_comments: bool) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("failed to open {}", file.display()))?;
    let image = abcdata::strip_do_abc_header(&raw);
    let abc = abcdata::Abc::parse(image)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    eprintln!(
        "[abc] version {}.{}, {} class(es), {} body(ies)",
        abc.major_version,
        abc.minor_version,
        abc.classes.len(),
        abc.bodies.len()
    );
    let decompiler = Decompiler::new(&abc, Options { opcode_comments });
    let written = decompiler.write_classes(out_dir)?;
    println!("Exported {written} class(es) to {}", out_dir.display());
    Ok(())
}
