//! Names that generated identifiers must never take.
//!
//! A candidate is reserved when it is a GLSL keyword or builtin, a swizzle, an HLSL register name
//! or carries a prefix/suffix owned by the platform. Each rule is its own predicate so it can be
//! tested in isolation; [`is_reserved`] composes them.

use std::collections::HashSet;
use std::sync::LazyLock;

/// GLSL keywords, builtins, layout qualifiers and preprocessor words that are never renamed
pub const RESERVED_WORDS: &[&str] = &[
    "EmitStreamVertex", "EmitVertex", "EndPrimitive", "EndStreamPrimitive", "__VERSION__",
    "__pixel_localEXT", "__pixel_local_inEXT", "__pixel_local_outEXT", "abs", "acos", "acosh",
    "all", "allInvocations", "allInvocationsEqual", "any", "anyInvocation", "asin", "asinh", "atan",
    "atanh", "atomicAdd", "atomicAnd", "atomicCompSwap", "atomicCounter", "atomicCounterAdd",
    "atomicCounterAnd", "atomicCounterCompSwap", "atomicCounterDecrement", "atomicCounterExchange",
    "atomicCounterIncrement", "atomicCounterMax", "atomicCounterMin", "atomicCounterOr",
    "atomicCounterSubtract", "atomicCounterXor", "atomicExchange", "atomicMax", "atomicMin",
    "atomicOr", "atomicXor", "barrier", "beginFragmentShaderOrderingINTEL",
    "beginInvocationInterlockARB", "beginInvocationInterlockNV", "binding", "bitCount",
    "bitfieldExtract", "bitfieldInsert", "bitfieldReverse", "blend_support_all_equations",
    "blend_support_colorburn", "blend_support_colordodge", "blend_support_darken",
    "blend_support_difference", "blend_support_exclusion", "blend_support_hardlight",
    "blend_support_lighten", "blend_support_multiply", "blend_support_overlay",
    "blend_support_screen", "blend_support_softlight", "bool", "break", "buffer", "bvec2", "bvec3",
    "bvec4", "case", "ceil", "centroid", "clamp", "coherent", "const", "constant_id", "continue",
    "cos", "cosh", "cross", "dFdx", "dFdxCoarse", "dFdxFine", "dFdy", "dFdyCoarse", "dFdyFine",
    "default", "defined", "degrees", "determinant", "discard", "distance", "do", "dot", "elif",
    "else", "enable", "endInvocationInterlockARB", "endInvocationInterlockNV", "endif", "equal",
    "exp", "exp2", "extension", "faceforward", "false", "findLSB", "findMSB", "flat", "float",
    "floatBitsToInt", "floatBitsToUint", "floor", "fma", "for", "fract", "frexp", "ftransform",
    "fwidth", "fwidthCoarse", "fwidthFine", "greaterThan", "greaterThanEqual", "groupMemoryBarrier",
    "highp", "if", "iimage2D", "image2D", "imageAtomicAdd", "imageAtomicAnd", "imageAtomicCompSwap",
    "imageAtomicExchange", "imageAtomicMax", "imageAtomicMin", "imageAtomicOr", "imageAtomicXor",
    "imageLoad", "imageSamples", "imageSize", "imageStore", "imulExtended", "in", "inout",
    "input_attachment_index", "int", "intBitsToFloat", "interpolateAtCentroid",
    "interpolateAtOffset", "interpolateAtSample", "invariant", "inverse", "inversesqrt",
    "isampler2D", "isampler2DArray", "isampler3D", "isamplerCube", "isinf", "isnan", "ivec2",
    "ivec3", "ivec4", "layout", "ldexp", "length", "lessThan", "lessThanEqual", "location", "log",
    "log2", "lowp", "main", "mat2", "mat2x2", "mat2x3", "mat2x4", "mat3", "mat3x2", "mat3x3",
    "mat3x4", "mat4", "mat4x2", "mat4x3", "mat4x4", "matrixCompMult", "max", "mediump",
    "memoryBarrier", "memoryBarrierAtomicCounter", "memoryBarrierBuffer", "memoryBarrierImage",
    "memoryBarrierShared", "min", "mix", "mod", "modf", "noise1", "noise2", "noise3", "noise4",
    "noperspective", "normalize", "not", "notEqual", "out", "outerProduct", "packDouble2x32",
    "packHalf2x16", "packSnorm2x16", "packSnorm4x8", "packUnorm2x16", "packUnorm4x8",
    "pixelLocalLoadANGLE", "pixelLocalStoreANGLE", "pow", "pragma", "precision", "r16f", "r32f",
    "r32ui", "radians", "readonly", "reflect", "refract", "require", "return", "rg16f", "rgb_2_yuv",
    "rgba8", "rgba8i", "rgba8ui", "round", "roundEven", "sampler", "sampler2D", "sampler2DArray",
    "sampler2DArrayShadow", "sampler2DShadow", "sampler3D", "samplerCube", "samplerCubeShadow",
    "set", "shadow1D", "shadow1DLod", "shadow1DProj", "shadow1DProjLod", "shadow2D", "shadow2DEXT",
    "shadow2DLod", "shadow2DProj", "shadow2DProjEXT", "shadow2DProjLod", "sign", "sin", "sinh",
    "smooth", "smoothstep", "sqrt", "std140", "std430", "step", "struct", "subpassInput",
    "subpassLoad", "switch", "tan", "tanh", "texelFetch", "texelFetchOffset", "texture",
    "texture1D", "texture1DLod", "texture1DProj", "texture1DProjLod", "texture2D",
    "texture2DGradEXT", "texture2DLod", "texture2DLodEXT", "texture2DProj", "texture2DProjGradEXT",
    "texture2DProjLod", "texture2DProjLodEXT", "texture2DRect", "texture2DRectProj", "texture3D",
    "texture3DLod", "texture3DProj", "texture3DProjLod", "textureCube", "textureCubeGradEXT",
    "textureCubeLod", "textureCubeLodEXT", "textureGather", "textureGatherOffset",
    "textureGatherOffsets", "textureGrad", "textureGradOffset", "textureLod", "textureLodOffset",
    "textureOffset", "textureProj", "textureProjGrad", "textureProjGradOffset", "textureProjLod",
    "textureProjLodOffset", "textureProjOffset", "textureQueryLevels", "textureQueryLod",
    "textureSamples", "textureSize", "textureVideoWEBGL", "transpose", "true", "trunc", "uaddCarry",
    "uimage2D", "uint", "uintBitsToFloat", "umulExtended", "uniform", "unpackDouble2x32",
    "unpackHalf2x16", "unpackSnorm2x16", "unpackSnorm4x8", "unpackUnorm2x16", "unpackUnorm4x8",
    "usampler2D", "usampler2DArray", "usampler3D", "usamplerCube", "usubBorrow", "usubpassInput",
    "utexture2D", "uvec2", "uvec3", "uvec4", "vec2", "vec3", "vec4", "void", "volatile", "while",
    "yuv_2_rgb",
];

static RESERVED_WORD_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| RESERVED_WORDS.iter().copied().collect());

/// Canonical vector component alphabet. `rgba` and `stpq` accessors are rewritten to it, so only
/// this alphabet needs to be kept out of the generated names.
pub const SWIZZLE_COMPONENTS: &str = "xyzw";

/// HLSL register base names; a macro argument with one of these names would be pasted into a
/// register (e.g. `t##IDX`)
pub const HLSL_REGISTER_BASE_NAMES: &[&str] = &["t", "s", "u", "b"];

pub const RESERVED_PREFIXES: &[&str] = &["gl_", "GL_", "__pixel_local"];

pub const RESERVED_SUFFIXES: &[&str] = &["ANGLE"];

pub fn is_keyword(name: &str) -> bool {
    RESERVED_WORD_SET.contains(name)
}

/// 1 to 4 characters drawn from [`SWIZZLE_COMPONENTS`]
pub fn is_swizzle(name: &str) -> bool {
    (1..=4).contains(&name.len()) && name.chars().all(|c| SWIZZLE_COMPONENTS.contains(c))
}

pub fn is_register_base_name(name: &str) -> bool {
    HLSL_REGISTER_BASE_NAMES.contains(&name)
}

/// A register base letter followed by digits, e.g. `t0` or `u12`
pub fn is_register(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('t' | 's' | 'u' | 'b')) && {
        let digits = chars.as_str();
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

pub fn has_reserved_affix(name: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) || RESERVED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Returns true if `name` may neither be renamed nor be produced by renaming
///
/// `name` must already have its sigil stripped.
pub fn is_reserved(name: &str) -> bool {
    is_keyword(name) || is_swizzle(name) || is_register_base_name(name) || is_register(name) || has_reserved_affix(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_builtins() {
        for name in ["vec4", "texture", "main", "defined", "endif", "__VERSION__", "pixelLocalLoadANGLE"] {
            assert!(is_reserved(name), "{name} should be reserved");
        }
        assert!(!is_reserved("myColor"));
    }

    #[test]
    fn test_swizzle_patterns() {
        assert!(is_swizzle("x"));
        assert!(is_swizzle("wzyx"));
        assert!(!is_swizzle("xyzwx"));
        assert!(!is_swizzle(""));
        // rgba/stpq are canonicalized at emission, so they remain available as names.
        assert!(!is_swizzle("rg"));
        assert!(!is_reserved("rg"));
    }

    #[test]
    fn test_register_patterns() {
        for name in ["t", "s", "u", "b", "t0", "u12", "b7"] {
            assert!(is_reserved(name), "{name} should be reserved");
        }
        assert!(!is_register("t0a"));
        assert!(!is_register("c0"));
        assert!(!is_reserved("c0"));
    }

    #[test]
    fn test_prefixes_and_suffixes() {
        assert!(is_reserved("gl_FragCoord"));
        assert!(is_reserved("GL_EXT_shader_pixel_local_storage"));
        assert!(is_reserved("__pixel_local_storage"));
        assert!(is_reserved("fooANGLE"));
        assert!(!is_reserved("_internal"));
    }
}
