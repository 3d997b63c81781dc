use std::{cell::Cell, fs::OpenOptions, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

mod table;

pub use table::{OptionRow, TableRow, render_table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Pretty,
    Table,
    Quiet,
}

/// Destination and format of command output.
#[derive(Clone, Debug)]
pub struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
    // the file is truncated by the first write of a command, later writes append
    started: Cell<bool>,
}

impl Output {
    pub fn new(format: OutputFormat, path: Option<PathBuf>) -> Self {
        Self {
            format,
            path,
            started: Cell::new(false),
        }
    }

    pub fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }

    pub fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let data = match self.format {
            OutputFormat::Quiet => return Ok(()),
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Json | OutputFormat::Table => serde_json::to_string(value)?,
        };
        self.write(&data)
    }

    /// Table for `--table`, json array otherwise.
    pub fn emit_table<T: TableRow + Serialize>(&self, items: &[T]) -> Result<()> {
        match self.format {
            OutputFormat::Table => self.write(&render_table(items)),
            OutputFormat::Quiet => Ok(()),
            OutputFormat::Json | OutputFormat::Pretty => self.emit_json(items),
        }
    }

    pub fn emit_text(&self, text: &str) -> Result<()> {
        if self.format == OutputFormat::Quiet {
            return Ok(());
        }
        self.write(text)
    }

    fn write(&self, data: &str) -> Result<()> {
        let mut output = data.to_string();
        if !output.ends_with('\n') {
            output.push('\n');
        }
        match &self.path {
            Some(path) => {
                let mut options = OpenOptions::new();
                options.create(true);
                if self.started.replace(true) {
                    options.append(true);
                } else {
                    options.write(true).truncate(true);
                }
                options
                    .open(path)
                    .and_then(|mut file| file.write_all(output.as_bytes()))
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            None => print!("{output}"),
        }
        Ok(())
    }
}
