//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了JSON序列化器的实现。

use super::Serializer;
use crate::error::{DataError, Result};
use serde::{de::DeserializeOwned, Serialize};

/// JSON序列化器
///
/// 基于serde_json；可选 gzip 压缩（需要 `compression` 特性）
#[derive(Clone, Debug, Default)]
pub struct JsonSerializer {
    compress: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// 创建启用压缩的JSON序列化器
    ///
    /// 未启用 `compression` 特性时退化为普通 JSON
    pub fn with_compression() -> Self {
        Self { compress: true }
    }

    pub fn is_compressed(&self) -> bool {
        self.compress && cfg!(feature = "compression")
    }
}

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let json_bytes =
            serde_json::to_vec(value).map_err(|e| DataError::Serialization(e.to_string()))?;

        if !self.is_compressed() {
            return Ok(json_bytes);
        }

        #[cfg(feature = "compression")]
        {
            use flate2::write::GzEncoder;
            use flate2::Compression;
            use std::io::Write;

            let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
            encoder
                .write_all(&json_bytes)
                .map_err(|e| DataError::Serialization(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| DataError::Serialization(e.to_string()))
        }

        #[cfg(not(feature = "compression"))]
        {
            Ok(json_bytes)
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        if !self.is_compressed() {
            return serde_json::from_slice(data)
                .map_err(|e| DataError::Serialization(e.to_string()));
        }

        #[cfg(feature = "compression")]
        {
            use flate2::read::GzDecoder;
            use std::io::Read;

            let mut decoder = GzDecoder::new(data);
            let mut decoded = Vec::new();
            decoder
                .read_to_end(&mut decoded)
                .map_err(|e| DataError::Serialization(e.to_string()))?;
            serde_json::from_slice(&decoded).map_err(|e| DataError::Serialization(e.to_string()))
        }

        #[cfg(not(feature = "compression"))]
        {
            serde_json::from_slice(data).map_err(|e| DataError::Serialization(e.to_string()))
        }
    }
}
