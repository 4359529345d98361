//! Source span and node identity tracking for diagnostics and the export map

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const INVALID: FileId = FileId(u32::MAX);

    /// Reserved for synthetic nodes created by the builtins catalog
    pub const BUILTIN: FileId = FileId(u32::MAX - 1);

    pub fn new(id: u32) -> Self {
        FileId(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn is_builtin(self) -> bool {
        self == FileId::BUILTIN
    }
}

impl Default for FileId {
    fn default() -> Self {
        FileId::INVALID
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_builtin() {
            write!(f, "file:builtin")
        } else {
            write!(f, "file:{}", self.0)
        }
    }
}

/// Byte offset in a source file (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ByteOffset(pub u32);

impl ByteOffset {
    pub fn new(offset: u32) -> Self {
        ByteOffset(offset)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn advance(self, by: u32) -> Self {
        ByteOffset(self.0 + by)
    }
}

/// Span in a source file (inclusive start, exclusive end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub file_id: FileId,
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    pub fn new(file_id: FileId, start: ByteOffset, end: ByteOffset) -> Self {
        Span { file_id, start, end }
    }

    pub fn single(file_id: FileId, offset: ByteOffset) -> Self {
        Span {
            file_id,
            start: offset,
            end: offset.advance(1),
        }
    }

    pub fn len(&self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(&self) -> bool {
        self.start.0 >= self.end.0
    }

    /// Smallest span covering both; the file of `self` wins.
    pub fn merge(self, other: Span) -> Span {
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, offset: ByteOffset) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.file_id, self.start.0, self.end.0)
    }
}

/// Stable identity of a syntax node.
///
/// Ids are unique within a file; pairing them with the file id makes them
/// unique across a whole-program run, so they can key the export map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId {
    #[serde(default)]
    pub file: FileId,
    #[serde(default)]
    pub index: u32,
}

impl NodeId {
    pub fn new(file: FileId, index: u32) -> Self {
        NodeId { file, index }
    }

    pub fn builtin(index: u32) -> Self {
        NodeId {
            file: FileId::BUILTIN,
            index,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.index)
    }
}
