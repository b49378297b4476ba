//! Shader reflection data model.
//!
//! Reflection describes the external surface of one translated shader:
//! vertex attributes, uniform blocks with member layout, image bindings
//! and the entry point. It is extracted from the translator's module
//! representation and normalised into the small closed sets below, so the
//! header generator never sees dialect-specific conventions.
//!
//! Offsets are recorded exactly as the translator reports them; this
//! module only verifies them against the layout rules (16-byte alignment
//! of array elements, no overlaps, block size rounded up to 16).

use crate::utils::roundup;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vs",
            Self::Fragment => "fs",
        }
    }
}

/// Uniform block member types.
///
/// The set is closed on purpose: these are the types the host-side
/// graphics API can push as uniform data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Mat4,
}

impl UniformType {
    /// Size in bytes of a single element.
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Float2 | Self::Int2 => 8,
            Self::Float3 | Self::Int3 => 12,
            Self::Float4 | Self::Int4 => 16,
            Self::Mat4 => 64,
        }
    }

    /// Array stride for the types that may be array elements.
    #[must_use]
    pub fn array_stride(self) -> Option<u32> {
        match self {
            Self::Float4 | Self::Int4 => Some(16),
            Self::Mat4 => Some(64),
            _ => None,
        }
    }

    /// Total byte size of a member with the given array count.
    #[must_use]
    pub fn byte_size(self, array_count: u32) -> u32 {
        if array_count > 1 {
            self.array_stride().unwrap_or_else(|| self.size()) * array_count
        } else {
            self.size()
        }
    }

    /// The GLSL spelling, which is also the key of the `@type` alias map.
    #[must_use]
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "vec2",
            Self::Float3 => "vec3",
            Self::Float4 => "vec4",
            Self::Int => "int",
            Self::Int2 => "ivec2",
            Self::Int3 => "ivec3",
            Self::Int4 => "ivec4",
            Self::Mat4 => "mat4",
        }
    }

    /// The `SG_UNIFORMTYPE_*` suffix used by the generated header.
    #[must_use]
    pub fn sg_name(self) -> &'static str {
        match self {
            Self::Float => "FLOAT",
            Self::Float2 => "FLOAT2",
            Self::Float3 => "FLOAT3",
            Self::Float4 => "FLOAT4",
            Self::Int => "INT",
            Self::Int2 => "INT2",
            Self::Int3 => "INT3",
            Self::Int4 => "INT4",
            Self::Mat4 => "MAT4",
        }
    }
}

/// One vertex shader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttr {
    /// Attribute location as seen by the target dialect.
    pub slot: u32,
    pub name: String,
    /// HLSL semantic name, empty for dialects without semantics.
    pub sem_name: String,
    pub sem_index: u32,
}

/// One uniform block member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    pub name: String,
    pub ty: UniformType,
    /// 1 for non-array members.
    pub array_count: u32,
    /// Byte offset inside the block, as reported by the translator.
    pub offset: u32,
}

/// A uniform buffer with its member layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub slot: u32,
    /// Total size in bytes, rounded up to a multiple of 16.
    pub size: u32,
    pub name: String,
    pub uniforms: Vec<Uniform>,
}

/// Sampled image dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Image2D,
    ImageCube,
    Image3D,
    ImageArray,
}

impl ImageKind {
    /// The `SG_IMAGETYPE_*` suffix used by the generated header.
    #[must_use]
    pub fn sg_name(self) -> &'static str {
        match self {
            Self::Image2D => "2D",
            Self::ImageCube => "CUBE",
            Self::Image3D => "3D",
            Self::ImageArray => "ARRAY",
        }
    }
}

/// One sampled image binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub slot: u32,
    pub name: String,
    pub kind: ImageKind,
}

/// The reflected external surface of one translated shader.
#[derive(Debug, Clone)]
pub struct Reflection {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// Vertex attributes, ordered by slot; empty for fragment shaders.
    pub attrs: Vec<VertexAttr>,
    /// Uniform blocks ordered by bind slot.
    pub uniform_blocks: Vec<UniformBlock>,
    /// Sampled images ordered by bind slot.
    pub images: Vec<Image>,
}

/// Verifies a block's member layout and computes the padded block size.
///
/// Checks that array members sit on 16-byte offsets, that no two members
/// overlap, and returns the end of the last member rounded up to 16.
pub fn block_size(block_name: &str, uniforms: &[Uniform]) -> Result<u32, String> {
    let mut sorted: Vec<&Uniform> = uniforms.iter().collect();
    sorted.sort_by_key(|u| u.offset);
    let mut end = 0u32;
    for uniform in sorted {
        if uniform.array_count > 1 && uniform.offset % 16 != 0 {
            return Err(format!(
                "array uniform '{}.{}' must sit on a 16-byte offset (found {})",
                block_name, uniform.name, uniform.offset
            ));
        }
        if uniform.offset < end {
            return Err(format!(
                "uniform '{}.{}' overlaps the previous member",
                block_name, uniform.name
            ));
        }
        end = uniform.offset + uniform.ty.byte_size(uniform.array_count);
    }
    Ok(roundup(end, 16))
}

impl Reflection {
    /// Extracts reflection from a translator module.
    ///
    /// `location_semantics` enables HLSL-style attribute semantics: the
    /// target annotates every location-bound input with `LOC<slot>`, so
    /// the semantic name/index pair is derived from the slot. Other
    /// dialects get an empty semantic name and index zero.
    pub fn from_module(module: &naga::Module, location_semantics: bool) -> Result<Self, String> {
        let entry_point = module
            .entry_points
            .first()
            .ok_or_else(|| "shader has no entry point".to_string())?;
        let stage = match entry_point.stage {
            naga::ShaderStage::Vertex => ShaderStage::Vertex,
            naga::ShaderStage::Fragment => ShaderStage::Fragment,
            naga::ShaderStage::Compute => {
                return Err("compute shaders are not supported".to_string());
            }
        };

        let mut attrs = Vec::new();
        if stage == ShaderStage::Vertex {
            for argument in &entry_point.function.arguments {
                collect_attrs(module, argument, location_semantics, &mut attrs)?;
            }
            attrs.sort_by_key(|attr| attr.slot);
        }

        let mut uniform_blocks = Vec::new();
        let mut images = Vec::new();
        for (_, var) in module.global_variables.iter() {
            match var.space {
                naga::AddressSpace::Uniform => {
                    uniform_blocks.push(reflect_uniform_block(module, var)?);
                }
                naga::AddressSpace::Handle => {
                    if let Some(image) = reflect_image(module, var)? {
                        images.push(image);
                    }
                }
                _ => {}
            }
        }
        uniform_blocks.sort_by_key(|block| block.slot);
        images.sort_by_key(|image| image.slot);

        Ok(Self {
            stage,
            entry_point: entry_point.name.clone(),
            attrs,
            uniform_blocks,
            images,
        })
    }

    /// Logs the reflection tables at debug level.
    pub fn dump_debug(&self) {
        log::debug!("    stage: {}, entry: {}", self.stage.as_str(), self.entry_point);
        for attr in &self.attrs {
            log::debug!(
                "    attr #{}: {} (sem '{}' {})",
                attr.slot,
                attr.name,
                attr.sem_name,
                attr.sem_index
            );
        }
        for block in &self.uniform_blocks {
            log::debug!("    uniform block '{}' slot {} size {}", block.name, block.slot, block.size);
            for uniform in &block.uniforms {
                log::debug!(
                    "      {} {}[{}] offset {}",
                    uniform.ty.glsl_name(),
                    uniform.name,
                    uniform.array_count,
                    uniform.offset
                );
            }
        }
        for image in &self.images {
            log::debug!(
                "    image '{}' slot {} type {}",
                image.name,
                image.slot,
                image.kind.sg_name()
            );
        }
    }
}

/// Collects location-bound vertex inputs from an entry point argument,
/// flattening struct arguments.
fn collect_attrs(
    module: &naga::Module,
    argument: &naga::FunctionArgument,
    location_semantics: bool,
    attrs: &mut Vec<VertexAttr>,
) -> Result<(), String> {
    let push = |name: Option<&str>, binding: &naga::Binding, attrs: &mut Vec<VertexAttr>| {
        if let naga::Binding::Location { location, .. } = *binding {
            let (sem_name, sem_index) = if location_semantics {
                ("LOC".to_string(), location)
            } else {
                (String::new(), 0)
            };
            attrs.push(VertexAttr {
                slot: location,
                name: name.unwrap_or_default().to_string(),
                sem_name,
                sem_index,
            });
        }
    };
    if let Some(binding) = &argument.binding {
        push(argument.name.as_deref(), binding, attrs);
        return Ok(());
    }
    match &module.types[argument.ty].inner {
        naga::TypeInner::Struct { members, .. } => {
            for member in members {
                if let Some(binding) = &member.binding {
                    push(member.name.as_deref(), binding, attrs);
                }
            }
            Ok(())
        }
        _ => Err("vertex input without location binding".to_string()),
    }
}

fn reflect_uniform_block(
    module: &naga::Module,
    var: &naga::GlobalVariable,
) -> Result<UniformBlock, String> {
    let ty = &module.types[var.ty];
    let name = var
        .name
        .clone()
        .or_else(|| ty.name.clone())
        .unwrap_or_default();
    let binding = var
        .binding
        .as_ref()
        .ok_or_else(|| format!("uniform block '{name}' has no binding"))?;
    let naga::TypeInner::Struct { members, .. } = &ty.inner else {
        return Err(format!("uniform block '{name}' is not a struct"));
    };
    let mut uniforms = Vec::new();
    for member in members {
        let member_name = member.name.clone().unwrap_or_default();
        let (uniform_type, array_count) = classify_member(module, member.ty)
            .map_err(|err| format!("uniform '{name}.{member_name}': {err}"))?;
        uniforms.push(Uniform {
            name: member_name,
            ty: uniform_type,
            array_count,
            offset: member.offset,
        });
    }
    let size = block_size(&name, &uniforms)?;
    Ok(UniformBlock {
        slot: binding.binding,
        size,
        name,
        uniforms,
    })
}

/// Maps a member type to the closed [`UniformType`] set plus array count.
fn classify_member(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
) -> Result<(UniformType, u32), String> {
    match &module.types[ty].inner {
        naga::TypeInner::Array { base, size, .. } => {
            let count = match size {
                naga::ArraySize::Constant(count) => count.get(),
                naga::ArraySize::Dynamic => {
                    return Err("dynamically sized arrays are not supported".to_string());
                }
            };
            let (element, element_count) = classify_member(module, *base)?;
            if element_count != 1 {
                return Err("nested arrays are not supported".to_string());
            }
            if element.array_stride().is_none() {
                return Err(format!(
                    "array element type '{}' is not supported (use vec4, ivec4 or mat4)",
                    element.glsl_name()
                ));
            }
            Ok((element, count))
        }
        inner => Ok((scalar_member(inner)?, 1)),
    }
}

fn scalar_member(inner: &naga::TypeInner) -> Result<UniformType, String> {
    use naga::{ScalarKind, VectorSize};
    match *inner {
        naga::TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Float => Ok(UniformType::Float),
            ScalarKind::Sint => Ok(UniformType::Int),
            _ => Err("unsupported scalar kind in uniform block".to_string()),
        },
        naga::TypeInner::Vector { size, scalar } => match (scalar.kind, size) {
            (ScalarKind::Float, VectorSize::Bi) => Ok(UniformType::Float2),
            (ScalarKind::Float, VectorSize::Tri) => Ok(UniformType::Float3),
            (ScalarKind::Float, VectorSize::Quad) => Ok(UniformType::Float4),
            (ScalarKind::Sint, VectorSize::Bi) => Ok(UniformType::Int2),
            (ScalarKind::Sint, VectorSize::Tri) => Ok(UniformType::Int3),
            (ScalarKind::Sint, VectorSize::Quad) => Ok(UniformType::Int4),
            _ => Err("unsupported vector type in uniform block".to_string()),
        },
        naga::TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float => Ok(UniformType::Mat4),
        _ => Err("unsupported uniform member type".to_string()),
    }
}

/// Maps a handle-space global to an image binding; samplers yield `None`.
fn reflect_image(
    module: &naga::Module,
    var: &naga::GlobalVariable,
) -> Result<Option<Image>, String> {
    let name = var.name.clone().unwrap_or_default();
    match &module.types[var.ty].inner {
        naga::TypeInner::Image { dim, arrayed, class } => {
            let naga::ImageClass::Sampled { .. } = class else {
                return Err(format!("image '{name}' is not a sampled image"));
            };
            let kind = image_kind(*dim, *arrayed)
                .ok_or_else(|| format!("image '{name}' has an unsupported dimensionality"))?;
            let binding = var
                .binding
                .as_ref()
                .ok_or_else(|| format!("image '{name}' has no binding"))?;
            Ok(Some(Image {
                slot: binding.binding,
                name,
                kind,
            }))
        }
        _ => Ok(None),
    }
}

fn image_kind(dim: naga::ImageDimension, arrayed: bool) -> Option<ImageKind> {
    use naga::ImageDimension as Dim;
    match (dim, arrayed) {
        (Dim::D2, false) => Some(ImageKind::Image2D),
        (Dim::D2, true) => Some(ImageKind::ImageArray),
        (Dim::Cube, false) => Some(ImageKind::ImageCube),
        (Dim::D3, false) => Some(ImageKind::Image3D),
        _ => None,
    }
}
