use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::convert::{convert, Summary};
use crate::format::Format;

/// Converts a BMFont descriptor between the text, XML and binary formats.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the .fnt file to convert in place; the original is kept as `<path>.old`
    pub path: Option<PathBuf>,
    /// Target format: t (text), x (XML) or b (binary). Anything else falls back to a prompt
    pub format: Option<String>,
    /// Write the result here instead, leaving the original untouched
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Runs the converter, prompting on `input`/`output` for anything missing from `args`.
///
/// Returns `Ok(None)` when the user entered nothing at a prompt.
///
/// # Errors
///
/// Fails if the backup or conversion fails. The backup is left in place for manual recovery.
pub fn run<I: BufRead, O: Write>(args: Args, input: &mut I, output: &mut O) -> Result<Option<Summary>> {
    let Some((path, from)) = resolve_source(args.path, input, output)? else {
        writeln!(output, "Nothing entered, quitting")?;
        return Ok(None);
    };
    let Some(to) = resolve_target(args.format, input, output)? else {
        writeln!(output, "Nothing entered, quitting")?;
        return Ok(None);
    };

    let started = Instant::now();
    info!("Converting {} from {from} to {to}...", path.display());
    let summary = match args.output.filter(|out| !is_same_file(out, &path)) {
        Some(destination) => convert_file(&path, from, &destination, to)?,
        None => {
            let (backup, summary) = convert_in_place(&path, from, to)?;
            info!("Old file saved as {}", backup.display());
            summary
        }
    };
    info!(
        "Conversion complete (took {} seconds): {} pages, {} chars, {} kerning pairs",
        started.elapsed().as_secs_f64(),
        summary.pages,
        summary.chars,
        summary.kernings.unwrap_or(0)
    );
    Ok(Some(summary))
}

/// Renames `path` to `<path>.old` and converts the backup into a new file at `path`.
///
/// # Errors
///
/// Fails if the rename or the conversion fails.
pub fn convert_in_place(path: &Path, from: Format, to: Format) -> Result<(PathBuf, Summary)> {
    let backup = backup_path(path);
    fs::rename(path, &backup).with_context(|| {
        format!("failed to back up {} to {}", path.display(), backup.display())
    })?;
    let summary = convert_file(&backup, from, path, to)?;
    Ok((backup, summary))
}

/// Converts the descriptor at `source` into a new file at `destination`.
///
/// # Errors
///
/// Fails if either file cannot be opened or the conversion fails.
pub fn convert_file(source: &Path, from: Format, destination: &Path, to: Format) -> Result<Summary> {
    let reader = File::open(source)
        .map(BufReader::new)
        .with_context(|| format!("failed to open {}", source.display()))?;
    let writer = File::create(destination)
        .map(BufWriter::new)
        .with_context(|| format!("failed to create {}", destination.display()))?;
    convert(reader, from, writer, to).with_context(|| {
        format!(
            "failed to convert {} into {}",
            source.display(),
            destination.display()
        )
    })
}

/// Whether `a` and `b` name the same file. `a` need not exist yet.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

/// Absolute form of `path` with links and `..` resolved, even if the file itself is missing.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(path) = fs::canonicalize(path) {
        return Some(path);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}

/// The path the original descriptor is moved to before conversion.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".old");
    PathBuf::from(backup)
}

fn resolve_source<I: BufRead, O: Write>(
    path: Option<PathBuf>,
    input: &mut I,
    output: &mut O,
) -> io::Result<Option<(PathBuf, Format)>> {
    if let Some(path) = path {
        match Format::detect(&path) {
            Some(format) => return Ok(Some((path, format))),
            None => warn!("{} is not a BMFont descriptor", path.display()),
        }
    }
    loop {
        let Some(answer) = prompt(input, output, "Enter the file path to a BMFont .fnt file:")?
        else {
            return Ok(None);
        };
        let path = PathBuf::from(answer);
        if let Some(format) = Format::detect(&path) {
            return Ok(Some((path, format)));
        }
        writeln!(output, "File path does not lead to a valid BMFont .fnt file")?;
    }
}

fn resolve_target<I: BufRead, O: Write>(
    code: Option<String>,
    input: &mut I,
    output: &mut O,
) -> io::Result<Option<Format>> {
    if let Some(code) = code {
        match code.parse() {
            Ok(format) => return Ok(Some(format)),
            Err(_) => writeln!(output, "Invalid selection for output format")?,
        }
    }
    let choices = [Format::Text, Format::Xml, Format::Binary]
        .map(|format| format!("{} for {format}", format.code()))
        .join(", ");
    let question = format!("Enter the desired output format ({choices}):");
    loop {
        let Some(answer) = prompt(input, output, &question)? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(format) => return Ok(Some(format)),
            Err(_) => writeln!(output, "Invalid selection for output format")?,
        }
    }
}

/// Asks `question` and returns the trimmed answer, or `None` if it was empty.
fn prompt<I: BufRead, O: Write>(input: &mut I, output: &mut O, question: &str) -> io::Result<Option<String>> {
    writeln!(output, "{question}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_owned()))
}
