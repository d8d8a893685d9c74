//! Output format mapping: format names, MIME types, quality and file naming.
//!
//! Three output formats are supported. Lookups by *name* match the three
//! exact lowercase names and resolve anything else to WebP rather than
//! failing, so a stale or foreign format string still produces a usable
//! encoding. Parsing with [`FromStr`] rejects unknown names, accepts a few
//! spellings people actually type (`JPG`, ` png`), and is what config files
//! and the CLI use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Logical name, also used as the output file extension.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    pub fn extension(self) -> &'static str {
        self.name()
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Whether the encoder honours the quality setting.
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }

    /// Resolve a format name, falling back to WebP for anything that is not
    /// exactly `webp`, `jpeg` or `png`.
    pub fn from_name_or_default(name: &str) -> Self {
        match name {
            "jpeg" => OutputFormat::Jpeg,
            "png" => OutputFormat::Png,
            _ => OutputFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned by [`OutputFormat::from_str`] for names outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported output format '{0}' (expected webp, jpeg or png)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// MIME type for a format name. Unknown names get WebP's MIME type.
pub fn mime_for(name: &str) -> &'static str {
    OutputFormat::from_name_or_default(name).mime_type()
}

/// Interpret a quality percentage as a 0.0–1.0 fraction.
pub fn quality_fraction(percent: u32) -> f32 {
    percent as f32 / 100.0
}

/// Derive the output file name: the original name minus its final
/// extension, plus the format's extension.
///
/// Only a dot followed by at least one character that is not a path
/// separator counts as an extension. Names without one keep their full text
/// as the base.
pub fn output_name(original_name: &str, format: OutputFormat) -> String {
    let (base, _) = split_extension(original_name);
    format!("{}.{}", base, format.extension())
}

/// Split a file name into its base and final extension, by the same rule
/// [`output_name`] uses.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                (name, None)
            } else {
                (&name[..dot], Some(ext))
            }
        }
        None => (name, None),
    }
}
