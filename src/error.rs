//! Error types for the converter.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to read folder {}", .path.display())]
    ReadFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory {}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create output file {}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {} to {}", .format, .path.display())]
    Encode {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid file name: {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("quality {0} is outside 1-100")]
    InvalidQuality(u8),

    #[error("chunk of files {first}-{last} aborted: {reason}")]
    ChunkAborted {
        first: usize,
        last: usize,
        reason: String,
    },
}

pub type ConvertResult<T> = Result<T, ConvertError>;

impl ConvertError {
    /// Message followed by every `source()` in the chain, one per line.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str("\n  caused by: ");
            out.push_str(&err.to_string());
            cause = std::error::Error::source(err);
        }
        out
    }
}
