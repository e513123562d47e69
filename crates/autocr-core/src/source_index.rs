//! Line-offset table for mapping parser spans to 1-based source lines.
//!
//! SWC reports spans as UTF-8 byte offsets shifted by the file's start
//! position in its source map. Rust strings are UTF-8, so once the module
//! start is subtracted a span offset indexes the source directly and the
//! lookup reduces to a binary search over line start offsets.

#[derive(Debug, Clone)]
pub struct SourceIndex {
    module_start: u32,
    line_offsets: Vec<u32>,
}

impl SourceIndex {
    pub fn new(source: &str, module_start: u32) -> Self {
        let mut line_offsets = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_offsets.push(i as u32 + 1);
            }
        }
        Self {
            module_start,
            line_offsets,
        }
    }

    pub fn module_start(&self) -> u32 {
        self.module_start
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    /// 1-based line containing the given span byte offset.
    pub fn line_of_byte(&self, byte_offset: u32) -> usize {
        let pos = byte_offset.saturating_sub(self.module_start);
        self.line_offsets.partition_point(|&start| start <= pos)
    }
}
