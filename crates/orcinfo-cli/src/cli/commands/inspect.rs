//! `orcinfo inspect` – print the decoded tail of one file.

use anyhow::{Context, Result};
use orcinfo_core::accessor::RouterAccessor;
use orcinfo_core::config::ProbeConfig;
use orcinfo_core::orc::proto::{type_kind_name, writer_name};
use orcinfo_core::orc::FileTail;
use orcinfo_core::target::ObjectLocation;
use orcinfo_core::trailer::Locator;
use std::io::{self, Write};

pub async fn run_inspect(cfg: &ProbeConfig, target: &str) -> Result<()> {
    cfg.validate()?;
    let location = ObjectLocation::parse(target)?;
    let accessor = RouterAccessor::from_config(cfg)?;
    let locator = Locator::from_config(cfg);

    let tail = tokio::task::spawn_blocking(move || locator.locate_tail(&accessor, &location))
        .await
        .context("inspect task panicked")??;

    let mut out = io::stdout().lock();
    print_tail(target, &tail, &mut out)?;
    out.flush()?;
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn print_tail(target: &str, tail: &FileTail, out: &mut dyn Write) -> io::Result<()> {
    let ps = &tail.postscript;
    let footer = &tail.footer;
    let version = if ps.version.is_empty() {
        "-".to_string()
    } else {
        ps.version
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    };

    writeln!(out, "file:             {}", target)?;
    writeln!(out, "file length:      {}", tail.file_length)?;
    writeln!(out, "format version:   {}", version)?;
    writeln!(
        out,
        "compression:      {} (block size {})",
        tail.compression,
        tail.block_size()
    )?;
    writeln!(out, "stripes:          {}", footer.stripes.len())?;
    writeln!(out, "rows:             {}", opt(footer.number_of_rows))?;
    writeln!(out, "raw data size:    {}", opt(tail.raw_data_size()))?;
    writeln!(out, "content length:   {}", opt(footer.content_length))?;
    writeln!(out, "row index stride: {}", opt(footer.row_index_stride))?;
    writeln!(
        out,
        "writer:           {} (writer version {})",
        footer.writer.map(writer_name).unwrap_or("-"),
        opt(ps.writer_version)
    )?;
    if let Some(software) = &footer.software_version {
        writeln!(out, "software:         {}", software)?;
    }
    writeln!(
        out,
        "tail:             footer {} bytes at {}, postscript {} bytes, metadata {} bytes",
        opt(ps.footer_length),
        tail.footer_offset(),
        tail.postscript_length,
        opt(ps.metadata_length)
    )?;

    if !footer.stripes.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{:>6}  {:>12}  {:>10}  {:>12}  {:>8}  {:>10}",
            "stripe", "offset", "index", "data", "footer", "rows"
        )?;
        for (i, s) in footer.stripes.iter().enumerate() {
            writeln!(
                out,
                "{:>6}  {:>12}  {:>10}  {:>12}  {:>8}  {:>10}",
                i,
                opt(s.offset),
                opt(s.index_length),
                opt(s.data_length),
                opt(s.footer_length),
                opt(s.number_of_rows)
            )?;
        }
    }

    // Type 0 is the root struct; its subtypes index the top-level columns.
    if let Some(root) = footer.types.first() {
        writeln!(out)?;
        writeln!(out, "schema:")?;
        for (i, name) in root.field_names.iter().enumerate() {
            let kind = root
                .subtypes
                .get(i)
                .and_then(|&t| footer.types.get(t as usize))
                .and_then(|t| t.kind)
                .map(type_kind_name)
                .unwrap_or("unknown");
            writeln!(out, "  {}: {}", name, kind)?;
        }
    }
    Ok(())
}
