//! Synthetic ORC files.
//!
//! Stripe bodies are zero filler; only the tail is real. Enough for every
//! trailer reader in this crate, and byte-for-byte deterministic.

use prost::Message;

use super::compression::{self, Compression, DEFAULT_BLOCK_SIZE};
use super::proto::{ColumnStatistics, Footer, PostScript, StripeInformation, Type};
use super::tail::ORC_MAGIC;

const STRIPE_BYTES: u64 = 16;
const STRUCT_KIND: i32 = 12;

/// Builder for an ORC file with a valid tail.
#[derive(Debug, Clone)]
pub struct SyntheticOrc {
    stripe_rows: Vec<u64>,
    content_length: Option<u64>,
    bytes_on_disk: Vec<Option<u64>>,
    compression: Compression,
    block_size: u64,
    file_length: Option<u64>,
    metadata_length: u64,
    magic: String,
    columns: Vec<(String, i32)>,
    software_version: Option<String>,
}

impl SyntheticOrc {
    /// `stripes` stripes of 1000 rows each, two columns, no compression.
    pub fn new(stripes: u32) -> Self {
        Self {
            stripe_rows: vec![1000; stripes as usize],
            content_length: None,
            bytes_on_disk: Vec::new(),
            compression: Compression::None,
            block_size: DEFAULT_BLOCK_SIZE,
            file_length: None,
            metadata_length: 0,
            magic: ORC_MAGIC.to_string(),
            columns: vec![("id".to_string(), 4), ("name".to_string(), 7)],
            software_version: None,
        }
    }

    pub fn content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Per-column `bytesOnDisk`; one statistics entry per element.
    pub fn bytes_on_disk(mut self, sizes: Vec<Option<u64>>) -> Self {
        self.bytes_on_disk = sizes;
        self
    }

    pub fn compression(mut self, codec: Compression) -> Self {
        self.compression = codec;
        self
    }

    pub fn block_size(mut self, size: u64) -> Self {
        self.block_size = size;
        self
    }

    /// Pad the stripe area so the file is exactly `len` bytes. Ignored when
    /// the natural layout is already longer.
    pub fn file_length(mut self, len: u64) -> Self {
        self.file_length = Some(len);
        self
    }

    /// Filler bytes between the stripes and the footer.
    pub fn metadata_length(mut self, len: u64) -> Self {
        self.metadata_length = len;
        self
    }

    pub fn magic(mut self, magic: &str) -> Self {
        self.magic = magic.to_string();
        self
    }

    /// Add `count` extra bigint columns, which grows the footer.
    pub fn wide(mut self, count: usize) -> Self {
        for i in 0..count {
            self.columns.push((format!("col_{:05}", i), 4));
        }
        self
    }

    pub fn software_version(mut self, version: &str) -> Self {
        self.software_version = Some(version.to_string());
        self
    }

    pub fn footer(&self) -> Footer {
        let header_len = ORC_MAGIC.len() as u64;
        let stripes = self
            .stripe_rows
            .iter()
            .enumerate()
            .map(|(i, rows)| StripeInformation {
                offset: Some(header_len + i as u64 * STRIPE_BYTES),
                index_length: Some(4),
                data_length: Some(STRIPE_BYTES - 8),
                footer_length: Some(4),
                number_of_rows: Some(*rows),
            })
            .collect();

        let mut types = vec![Type {
            kind: Some(STRUCT_KIND),
            subtypes: (1..=self.columns.len() as u32).collect(),
            field_names: self.columns.iter().map(|(name, _)| name.clone()).collect(),
        }];
        types.extend(self.columns.iter().map(|(_, kind)| Type {
            kind: Some(*kind),
            ..Default::default()
        }));

        let rows: u64 = self.stripe_rows.iter().sum();
        let statistics = self
            .bytes_on_disk
            .iter()
            .map(|bytes| ColumnStatistics {
                number_of_values: Some(rows),
                has_null: Some(false),
                bytes_on_disk: *bytes,
            })
            .collect();

        Footer {
            header_length: Some(header_len),
            content_length: self.content_length,
            stripes,
            types,
            number_of_rows: Some(rows),
            statistics,
            row_index_stride: Some(10_000),
            writer: Some(1),
            software_version: self.software_version.clone(),
        }
    }

    /// Encoded footer as it sits in the file.
    fn footer_bytes(&self) -> Vec<u8> {
        let plain = self.footer().encode_to_vec();
        if self.compression == Compression::None {
            return plain;
        }
        match compression::compress(self.compression, self.block_size, &plain) {
            Ok(packed) => packed,
            // Codecs we cannot encode get one "compressed" chunk holding the
            // plain bytes; readers reject them on the codec before decoding.
            Err(_) => {
                let header = (plain.len() as u32) << 1;
                let mut out = header.to_le_bytes()[..3].to_vec();
                out.extend_from_slice(&plain);
                out
            }
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let footer = self.footer_bytes();
        let postscript = PostScript {
            footer_length: Some(footer.len() as u64),
            compression: Some(self.compression.proto_id()),
            compression_block_size: (self.compression != Compression::None)
                .then_some(self.block_size),
            version: vec![0, 12],
            metadata_length: Some(self.metadata_length),
            writer_version: Some(9),
            stripe_statistics_length: None,
            magic: Some(self.magic.clone()),
        }
        .encode_to_vec();

        let body = ORC_MAGIC.len() as u64 + self.stripe_rows.len() as u64 * STRIPE_BYTES;
        let natural = body + self.metadata_length + footer.len() as u64 + postscript.len() as u64 + 1;
        let padding = self.file_length.unwrap_or(natural).saturating_sub(natural);

        let mut out = Vec::with_capacity((natural + padding) as usize);
        out.extend_from_slice(ORC_MAGIC.as_bytes());
        out.resize((body + padding + self.metadata_length) as usize, 0);
        out.extend_from_slice(&footer);
        out.extend_from_slice(&postscript);
        out.push(u8::try_from(postscript.len()).unwrap_or(u8::MAX));
        out
    }
}
