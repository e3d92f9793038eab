//! Build script for kineto-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates player.toml and turns it into constants

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use kineto_core::PlayerConfig;
use serde::Deserialize;

/// Highest address reachable with 3-byte SPI flash addressing
const FLASH_ADDRESS_LIMIT: u64 = 0x0100_0000;

/// One `[[flash_file]]` entry
#[derive(Debug, Deserialize)]
struct FlashFileEntry {
    name: String,
    offset: u32,
    len: u32,
}

#[derive(Debug, Default, Deserialize)]
struct FlashTable {
    #[serde(default)]
    flash_file: Vec<FlashFileEntry>,
}

fn main() {
    setup_linker();
    let (config, table) = validate_config();
    generate_constants(&config, &table);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate player.toml
fn validate_config() -> (PlayerConfig, FlashTable) {
    println!("cargo:rerun-if-changed=player.toml");

    let config_path = Path::new("player.toml");
    if !config_path.exists() {
        fail(
            "player.toml not found",
            &["The firmware requires a player.toml in the kineto-firmware directory."],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read player.toml", &[&e.to_string()]),
    };

    let config: PlayerConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail("Invalid player.toml", &error_lines(&e.to_string())),
    };
    let table: FlashTable = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => fail("Invalid [[flash_file]] table", &error_lines(&e.to_string())),
    };

    let mut errors = Vec::new();
    if let Err(e) = config.validate() {
        errors.push(e.to_string());
    }
    validate_flash_table(&config, &table, &mut errors);

    if !errors.is_empty() {
        let lines: Vec<&str> = errors.iter().map(String::as_str).collect();
        fail("player.toml validation failed", &lines);
    }

    println!("cargo:warning=player.toml validated successfully");
    (config, table)
}

fn validate_flash_table(config: &PlayerConfig, table: &FlashTable, errors: &mut Vec<String>) {
    if table.flash_file.is_empty() {
        errors.push("no [[flash_file]] entries".into());
    }

    for (i, file) in table.flash_file.iter().enumerate() {
        if file.name.is_empty() {
            errors.push(format!("flash_file #{} has an empty name", i));
        }
        if file.len == 0 {
            errors.push(format!("flash_file '{}' has zero length", file.name));
        }
        let end = file.offset as u64 + file.len as u64;
        if end > FLASH_ADDRESS_LIMIT {
            errors.push(format!(
                "flash_file '{}' ends at 0x{:X}, beyond 16 MiB",
                file.name, end
            ));
        }
        for other in &table.flash_file[i + 1..] {
            if other.name == file.name {
                errors.push(format!("flash_file '{}' is listed twice", file.name));
            }
            let other_end = other.offset as u64 + other.len as u64;
            if (file.offset as u64) < other_end && (other.offset as u64) < end {
                errors.push(format!(
                    "flash_file '{}' overlaps '{}'",
                    file.name, other.name
                ));
            }
        }
    }

    if !table
        .flash_file
        .iter()
        .any(|f| f.name == config.video_path.as_str())
    {
        errors.push(format!(
            "video_path '{}' is not in the flash table",
            config.video_path
        ));
    }
}

/// Write `$OUT_DIR/player_config.rs`
fn generate_constants(config: &PlayerConfig, table: &FlashTable) {
    let mut out = String::new();
    writeln!(out, "// Generated from player.toml by build.rs").unwrap();
    writeln!(out, "pub const VIDEO_PATH: &str = {:?};", config.video_path.as_str()).unwrap();
    writeln!(out, "pub const SCREEN_WIDTH: u16 = {};", config.screen_width).unwrap();
    writeln!(out, "pub const SCREEN_HEIGHT: u16 = {};", config.screen_height).unwrap();
    writeln!(
        out,
        "pub const COMPRESSED_BUFFER_BYTES: usize = {};",
        config.compressed_buffer_bytes
    )
    .unwrap();
    writeln!(
        out,
        "pub const SEGMENT_BUFFER_PIXELS: usize = {};",
        config.segment_pixels()
    )
    .unwrap();

    writeln!(
        out,
        "pub static FLASH_FILES: [FlashFile; {}] = [",
        table.flash_file.len()
    )
    .unwrap();
    for file in &table.flash_file {
        writeln!(
            out,
            "    FlashFile {{ name: {:?}, offset: 0x{:06X}, len: 0x{:06X} }},",
            file.name, file.offset, file.len
        )
        .unwrap();
    }
    writeln!(out, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("player_config.rs"), out).unwrap();
}

fn error_lines(msg: &str) -> Vec<&str> {
    msg.lines().filter(|l| !l.trim().is_empty()).collect()
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[&str]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}
