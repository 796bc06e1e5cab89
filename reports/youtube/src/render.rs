//! Console and CSV output for [`Report`]s.

use crate::youtube_api::Report;
use std::io::{self, Write};

/// Printed instead of a table when a report has no rows.
pub const NO_RESULTS: &str = "no results found.";

/// Every console cell is right-justified to this width.
pub const COLUMN_WIDTH: usize = 30;

/// Prints a report as a fixed-width table: a header line, one line per row, then a blank line.
pub fn write_console_table(out: &mut impl Write, report: &Report) -> io::Result<()> {
    if report.is_empty() {
        return writeln!(out, "{NO_RESULTS}");
    }

    for header in &report.headers {
        write!(out, "{:>COLUMN_WIDTH$}", header.name)?;
    }
    writeln!(out)?;

    for row in &report.rows {
        for cell in row {
            write!(out, "{cell:>COLUMN_WIDTH$}")?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// Appends one report to a CSV file as its own section.
///
/// The section starts with a CRLF blank line, followed by a line holding `title`, a line of
/// `column_titles`, and one line per report row. Every line ends in a separator, so each
/// record carries a trailing empty field.
pub fn write_csv_section(
    out: &mut impl Write,
    title: &str,
    column_titles: &[&str],
    report: &Report,
) -> eyre::Result<()> {
    out.write_all(b"\r\n")?;

    let mut writer = csv::WriterBuilder::new()
        // the title line has fewer fields than the rows
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record([title, ""])?;
    writer.write_record(column_titles.iter().copied().chain([""]))?;
    for row in &report.rows {
        writer.write_record(row.iter().map(ToString::to_string).chain([String::new()]))?;
    }
    writer.flush()?;
    Ok(())
}
