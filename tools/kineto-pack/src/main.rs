//! kineto-pack - build and check Kineto video files
//!
//! # Usage
//!
//! ```bash
//! # Raw RGB888 frames, e.g. from
//! #   ffmpeg -i in.mp4 -vf scale=240:-1 -pix_fmt rgb24 -f rawvideo frames.rgb
//! kineto-pack pack frames.rgb video.vid --width 240 --height 180 --fps 30 --format rgb888
//!
//! # Header, index and per-frame decode check
//! kineto-pack inspect video.vid
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

mod inspect;
mod pack;

use pack::{PackOptions, PixelFormat};

#[derive(Parser, Debug)]
#[command(name = "kineto-pack")]
#[command(about = "Pack raw frames into Kineto video files", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode raw frames into a video file
    Pack {
        /// Raw frame stream, frames back to back
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Video file to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Frame width in pixels
        #[arg(long)]
        width: u16,

        /// Frame height in pixels
        #[arg(long)]
        height: u16,

        /// Playback rate
        #[arg(long, default_value_t = 30)]
        fps: u8,

        /// Pixel layout of the input
        #[arg(short, long, value_enum, default_value = "rgb888")]
        format: PixelFormat,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u32>,
    },

    /// Print the header and check that every frame decodes
    Inspect {
        /// Video file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// List every frame's offset and size
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Pack {
            input,
            output,
            width,
            height,
            fps,
            format,
            max_frames,
        } => {
            let options = PackOptions {
                width,
                height,
                fps,
                format,
            };
            let input_len = std::fs::metadata(&input)
                .with_context(|| format!("failed to stat '{}'", input.display()))?
                .len();
            let mut frame_count = options.frames_in(input_len)?;
            if let Some(max) = max_frames {
                frame_count = frame_count.min(max);
            }

            let reader = BufReader::new(
                File::open(&input)
                    .with_context(|| format!("failed to open '{}'", input.display()))?,
            );
            let writer = BufWriter::new(
                File::create(&output)
                    .with_context(|| format!("failed to create '{}'", output.display()))?,
            );

            let summary = pack::pack(reader, writer, frame_count, &options)?;
            println!("{}", summary);
            Ok(())
        }
        Command::Inspect { file, verbose } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("failed to open '{}'", file.display()))?,
            );
            let report = inspect::inspect(reader)?;
            println!("{}", report);
            if verbose {
                for (frame, entry) in report.entries.iter().enumerate() {
                    println!("  frame {:>6}: offset {:>10}  {:>7} bytes", frame, entry.offset, entry.length);
                }
            }
            if !report.bad_frames.is_empty() {
                bail!(
                    "{} frame(s) do not decode to {} pixels (first: {})",
                    report.bad_frames.len(),
                    report.header.pixels_per_frame(),
                    report.bad_frames[0]
                );
            }
            Ok(())
        }
    }
}
