//! Table, CSV and JSON-lines rendering of report records.

use std::io::{self, Write};

use super::{OutputFormat, ProbeRecord};

const COLUMNS: [&str; 8] = [
    "file_path",
    "file_length",
    "num_stripes",
    "raw_data_size",
    "number_of_rows",
    "compression",
    "error_kind",
    "error",
];

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn cells(record: &ProbeRecord) -> [String; 8] {
    [
        record.file_path.clone(),
        opt(&record.file_length),
        opt(&record.num_stripes),
        opt(&record.raw_data_size),
        opt(&record.number_of_rows),
        opt(&record.compression),
        opt(&record.error_kind),
        opt(&record.error),
    ]
}

pub fn render(format: OutputFormat, records: &[ProbeRecord], out: &mut dyn Write) -> io::Result<()> {
    match format {
        OutputFormat::Table => render_table(records, out),
        OutputFormat::Csv => render_csv(records, out),
        OutputFormat::Json => render_json_lines(records, out),
    }
}

/// Left-aligned text columns, numbers right-aligned.
pub fn render_table(records: &[ProbeRecord], out: &mut dyn Write) -> io::Result<()> {
    let rows: Vec<[String; 8]> = records.iter().map(cells).collect();
    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let numeric = |i: usize| (1..=4).contains(&i);

    let header: Vec<String> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| pad(name, widths[i], numeric(i)))
        .collect();
    writeln!(out, "{}", header.join("  ").trim_end())?;
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i], numeric(i)))
            .collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }
    Ok(())
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    if right {
        format!("{:>width$}", cell, width = width)
    } else {
        format!("{:<width$}", cell, width = width)
    }
}

/// RFC 4180 CSV with a header row, written even when there are no records.
pub fn render_csv(records: &[ProbeRecord], out: &mut dyn Write) -> io::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()
}

pub fn render_json_lines(records: &[ProbeRecord], out: &mut dyn Write) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
