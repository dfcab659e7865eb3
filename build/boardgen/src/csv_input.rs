// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loading of the board (`pins.csv`) and alternate function (`af.csv`)
//! tables into a [`PinGenerator`].
//!
//! Both readers take one row per line, skipping blank lines and rows whose
//! first field starts with `#`.
//! A [`PinGeneratorError`](crate::PinGeneratorError) raised while handling a
//! row comes back prefixed with `FILE:LINE: `.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::annotate;
use crate::pin::{AlternateFunction, PortPin};
use crate::PinGenerator;

/// Marks a board or cpu name as hidden from Python.
const HIDDEN_PREFIX: char = '-';

/// Layout of an AF CSV file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AfLayout {
    /// Number of non-blank, non-comment rows to treat as headers.
    pub header_rows: usize,
    /// Column holding the cpu pin name.
    pub pin_col: usize,
    /// First column holding alternate functions.
    pub af_col: usize,
}

impl Default for AfLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            pin_col: 0,
            af_col: 1,
        }
    }
}

fn parse_line(text: &str) -> Result<csv::StringRecord> {
    let mut record = csv::StringRecord::new();
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .read_record(&mut record)?;
    Ok(record)
}

/// Yields `(line, record)` for every row that isn't blank or a comment.
///
/// Each physical line is one row; `line` is its 1-based position in the
/// input, with LF or CRLF endings.
fn rows<'a, R: Read + 'a>(
    input: R,
    filename: &'a Path,
) -> impl Iterator<Item = Result<(u64, csv::StringRecord)>> + 'a {
    BufReader::new(input).lines().zip(1u64..).filter_map(
        move |(text, line)| {
            let record = text
                .map_err(anyhow::Error::from)
                .and_then(|text| {
                    if text.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_line(&text).map(Some)
                    }
                })
                .with_context(|| {
                    format!("failed to read {}:{line}", filename.display())
                });
            match record {
                Err(e) => Some(Err(e)),
                Ok(None) => None,
                Ok(Some(record))
                    if record.get(0).is_some_and(|f| f.starts_with('#')) =>
                {
                    log::debug!(
                        "{}:{line}: skipping comment",
                        filename.display()
                    );
                    None
                }
                Ok(Some(record)) => Some(Ok((line, record))),
            }
        },
    )
}

fn strip_hidden(name: &str) -> (&str, bool) {
    match name.strip_prefix(HIDDEN_PREFIX) {
        Some(rest) => (rest, true),
        None => (name, false),
    }
}

impl<P: PortPin> PinGenerator<P> {
    /// Loads the board->cpu mapping from `filename`.
    pub fn parse_board_csv(&mut self, filename: &Path) -> Result<()> {
        let file = File::open(filename)
            .with_context(|| format!("failed to open {}", filename.display()))?;
        self.parse_board_csv_from(file, filename)
    }

    /// As [`Self::parse_board_csv`], reading from `input`. `filename` is only
    /// used in messages.
    pub fn parse_board_csv_from<R: Read>(
        &mut self,
        input: R,
        filename: &Path,
    ) -> Result<()> {
        for row in rows(input, filename) {
            let (line, record) = row?;
            self.board_row(&record)
                .map_err(|e| annotate(e, filename, line))?;
        }
        Ok(())
    }

    fn board_row(&mut self, record: &csv::StringRecord) -> Result<()> {
        // Lines must be pairs of names.
        if record.len() != 2 {
            crate::pin_bail!("Expecting two entries in each row");
        }
        let board_pin_name = record[0].trim();
        let (cpu_pin_name, cpu_hidden) = strip_hidden(record[1].trim());

        P::validate_cpu_pin_name(cpu_pin_name)?;
        let pin = self.add_cpu_pin(cpu_pin_name, true)?;
        pin.set_hidden(cpu_hidden);

        if !board_pin_name.is_empty() {
            let (board_pin_name, board_hidden) = strip_hidden(board_pin_name);
            P::validate_board_pin_name(board_pin_name)?;
            pin.add_board_pin_name(board_pin_name, board_hidden);
        }
        Ok(())
    }

    /// Loads alternate functions from `filename`, handing each non-empty
    /// cell to [`PortPin::add_af`].
    pub fn parse_af_csv(
        &mut self,
        filename: &Path,
        layout: AfLayout,
    ) -> Result<()> {
        let file = File::open(filename)
            .with_context(|| format!("failed to open {}", filename.display()))?;
        self.parse_af_csv_from(file, filename, layout)
    }

    /// As [`Self::parse_af_csv`], reading from `input`.
    pub fn parse_af_csv_from<R: Read>(
        &mut self,
        input: R,
        filename: &Path,
        layout: AfLayout,
    ) -> Result<()> {
        let mut headings = BTreeMap::new();
        let mut header_rows = layout.header_rows;

        for row in rows(input, filename) {
            let (line, record) = row?;

            if header_rows > 0 {
                // Only the first header row supplies headings.
                if headings.is_empty() {
                    for (af_idx, heading) in
                        record.iter().skip(layout.af_col).enumerate()
                    {
                        headings.insert(af_idx, heading.trim().to_string());
                    }
                }
                header_rows -= 1;
                continue;
            }

            self.af_row(&record, &headings, layout)
                .map_err(|e| annotate(e, filename, line))?;
        }
        Ok(())
    }

    fn af_row(
        &mut self,
        record: &csv::StringRecord,
        headings: &BTreeMap<usize, String>,
        layout: AfLayout,
    ) -> Result<()> {
        let needed = layout.pin_col.max(layout.af_col) + 1;
        if record.len() < needed {
            crate::pin_bail!("Expecting {needed} entries in each row");
        }

        let cpu_pin_name = record[layout.pin_col].trim();
        if cpu_pin_name == "-" {
            return Ok(());
        }
        P::validate_cpu_pin_name(cpu_pin_name)?;
        let pin = self.find_pin_by_cpu_pin_name(cpu_pin_name, true)?;

        for (index, af) in record.iter().skip(layout.af_col).enumerate() {
            let af = af.trim();
            if af.is_empty() {
                continue;
            }
            let label = match headings.get(&index) {
                Some(label) => label.clone(),
                None => {
                    log::warn!(
                        "no heading for AF column {index} ({cpu_pin_name}: {af})"
                    );
                    String::new()
                }
            };
            pin.port_mut().add_af(AlternateFunction {
                index,
                label,
                value: af.to_string(),
            })?;
        }
        Ok(())
    }
}
