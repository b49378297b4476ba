//! Target shader dialects.
//!
//! A dialect is a concrete target language + profile combination. The set
//! is closed and every property a stage needs (file extensions, the
//! conditional-inclusion token of the generated header, bytecode support)
//! hangs off the enum, so adding a dialect is a compile-error checklist.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Desktop OpenGL 3.3 core profile
    Glsl330,
    /// OpenGL ES 2.0 / WebGL
    Glsl100,
    /// OpenGL ES 3.0 / WebGL2
    Glsl300Es,
    /// Direct3D 11 shader model 5.0
    Hlsl5,
    /// Metal on macOS
    MetalMacos,
    /// Metal on iOS
    MetalIos,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Glsl330,
        Dialect::Glsl100,
        Dialect::Glsl300Es,
        Dialect::Hlsl5,
        Dialect::MetalMacos,
        Dialect::MetalIos,
    ];

    /// The tag used on the command line and in generated symbol names.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Glsl330 => "glsl330",
            Self::Glsl100 => "glsl100",
            Self::Glsl300Es => "glsl300es",
            Self::Hlsl5 => "hlsl5",
            Self::MetalMacos => "metal_macos",
            Self::MetalIos => "metal_ios",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.tag() == tag)
    }

    /// Parses a colon-separated tag list (`glsl330:hlsl5:metal_macos`).
    ///
    /// Order is preserved and duplicates are dropped, so the caller's
    /// dialect order drives every downstream iteration deterministically.
    pub fn from_tag_list(list: &str) -> Result<Vec<Self>, String> {
        let mut dialects = Vec::new();
        for tag in list.split(':').filter(|t| !t.is_empty()) {
            let dialect = Self::from_tag(tag).ok_or_else(|| {
                format!(
                    "unknown target dialect '{}' (expected one of: {})",
                    tag,
                    Self::ALL.map(Self::tag).join(", ")
                )
            })?;
            if !dialects.contains(&dialect) {
                dialects.push(dialect);
            }
        }
        if dialects.is_empty() {
            return Err("no target dialect given".to_string());
        }
        Ok(dialects)
    }

    /// Extension for translated source files.
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Glsl330 | Self::Glsl100 | Self::Glsl300Es => ".glsl",
            Self::Hlsl5 => ".hlsl",
            Self::MetalMacos | Self::MetalIos => ".metal",
        }
    }

    /// Extension for compiled bytecode, for dialects that have a binary form.
    #[must_use]
    pub fn binary_extension(self) -> Option<&'static str> {
        match self {
            Self::Glsl330 | Self::Glsl100 | Self::Glsl300Es => None,
            Self::Hlsl5 => Some(".fxc"),
            Self::MetalMacos | Self::MetalIos => Some(".metallib"),
        }
    }

    #[must_use]
    pub fn has_bytecode(self) -> bool {
        self.binary_extension().is_some()
    }

    /// Preprocessor token gating this dialect's section of the header.
    #[must_use]
    pub fn ifdef_token(self) -> &'static str {
        match self {
            Self::Glsl330 => "SOKOL_GLCORE33",
            Self::Glsl100 => "SOKOL_GLES2",
            Self::Glsl300Es => "SOKOL_GLES3",
            Self::Hlsl5 => "SOKOL_D3D11",
            Self::MetalMacos | Self::MetalIos => "SOKOL_METAL",
        }
    }

    /// Whether vertex attributes carry HLSL-style binding semantics.
    #[must_use]
    pub fn uses_semantics(self) -> bool {
        matches!(self, Self::Hlsl5)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for dialect in Dialect::ALL {
            assert_eq!(Dialect::from_tag(dialect.tag()), Some(dialect));
        }
        assert_eq!(Dialect::from_tag("glsl420"), None);
    }

    #[test]
    fn test_tag_list() {
        let dialects = Dialect::from_tag_list("glsl330:hlsl5:glsl330:metal_ios").unwrap();
        assert_eq!(dialects, vec![Dialect::Glsl330, Dialect::Hlsl5, Dialect::MetalIos]);
    }

    #[test]
    fn test_tag_list_rejects_unknown() {
        assert!(Dialect::from_tag_list("glsl330:wgsl").is_err());
        assert!(Dialect::from_tag_list("").is_err());
    }

    #[test]
    fn test_binary_extensions() {
        assert_eq!(Dialect::Hlsl5.binary_extension(), Some(".fxc"));
        assert_eq!(Dialect::MetalMacos.binary_extension(), Some(".metallib"));
        assert_eq!(Dialect::Glsl330.binary_extension(), None);
        assert!(!Dialect::Glsl100.has_bytecode());
    }
}
