//! ORC tail protobuf messages (subset of `orc_proto.proto`).
//!
//! Only the fields needed for the trailer summary and `inspect` are declared;
//! prost skips everything else on decode. Enum-typed fields are kept as raw
//! `int32` values and mapped by the caller so unknown ids stay visible.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct PostScript {
    #[prost(uint64, optional, tag = "1")]
    pub footer_length: Option<u64>,
    #[prost(int32, optional, tag = "2")]
    pub compression: Option<i32>,
    #[prost(uint64, optional, tag = "3")]
    pub compression_block_size: Option<u64>,
    #[prost(uint32, repeated, tag = "4")]
    pub version: Vec<u32>,
    #[prost(uint64, optional, tag = "5")]
    pub metadata_length: Option<u64>,
    #[prost(uint32, optional, tag = "6")]
    pub writer_version: Option<u32>,
    #[prost(uint64, optional, tag = "7")]
    pub stripe_statistics_length: Option<u64>,
    #[prost(string, optional, tag = "8000")]
    pub magic: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Footer {
    #[prost(uint64, optional, tag = "1")]
    pub header_length: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub content_length: Option<u64>,
    #[prost(message, repeated, tag = "3")]
    pub stripes: Vec<StripeInformation>,
    #[prost(message, repeated, tag = "4")]
    pub types: Vec<Type>,
    #[prost(uint64, optional, tag = "6")]
    pub number_of_rows: Option<u64>,
    #[prost(message, repeated, tag = "7")]
    pub statistics: Vec<ColumnStatistics>,
    #[prost(uint32, optional, tag = "8")]
    pub row_index_stride: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
    pub writer: Option<u32>,
    #[prost(string, optional, tag = "12")]
    pub software_version: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct StripeInformation {
    #[prost(uint64, optional, tag = "1")]
    pub offset: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub index_length: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub data_length: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub footer_length: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub number_of_rows: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Type {
    #[prost(int32, optional, tag = "1")]
    pub kind: Option<i32>,
    #[prost(uint32, repeated, tag = "2")]
    pub subtypes: Vec<u32>,
    #[prost(string, repeated, tag = "3")]
    pub field_names: Vec<String>,
}

/// Only the size-related members; value statistics are not decoded.
#[derive(Clone, PartialEq, Message)]
pub struct ColumnStatistics {
    #[prost(uint64, optional, tag = "1")]
    pub number_of_values: Option<u64>,
    #[prost(bool, optional, tag = "10")]
    pub has_null: Option<bool>,
    #[prost(uint64, optional, tag = "11")]
    pub bytes_on_disk: Option<u64>,
}

/// Human-readable name of an ORC `Type.Kind` id.
pub fn type_kind_name(kind: i32) -> &'static str {
    match kind {
        0 => "boolean",
        1 => "tinyint",
        2 => "smallint",
        3 => "int",
        4 => "bigint",
        5 => "float",
        6 => "double",
        7 => "string",
        8 => "binary",
        9 => "timestamp",
        10 => "array",
        11 => "map",
        12 => "struct",
        13 => "uniontype",
        14 => "decimal",
        15 => "date",
        16 => "varchar",
        17 => "char",
        18 => "timestamp with local time zone",
        _ => "unknown",
    }
}

/// Human-readable name of the footer `writer` id.
pub fn writer_name(writer: u32) -> &'static str {
    match writer {
        0 => "ORC Java",
        1 => "ORC C++",
        2 => "Presto",
        3 => "Scritchley Go",
        4 => "Trino",
        5 => "CUDF",
        _ => "unknown",
    }
}
