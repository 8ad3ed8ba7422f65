//! The descriptor layout header shared between C++ and HLSL: register bases
//! and heap indices computed from constants mined out of the renderer
//! source.

use std::path::Path;

use anyhow::{Result, bail};

use crate::console;
use crate::emit;
use crate::extract;

#[derive(Debug)]
struct Layout {
    frame_count: u64,
    max_heightmaps: u64,
    max_sky: u64,
    max_models: u64,
}

fn mine_layout(content: &str) -> Result<Layout> {
    let mut missing: Vec<&str> = Vec::new();
    let mut grab = |name: &'static str| {
        let value = extract::find_uint_constant(content, name);
        if value.is_none() {
            missing.push(name);
        }
        value.unwrap_or(0)
    };
    let layout = Layout {
        frame_count: grab("g_FrameCount"),
        max_heightmaps: grab("MAX_HEIGHTMAP_TEXTURES"),
        max_sky: grab("MAX_SKY_TEXTURES"),
        max_models: grab("MAX_LOADED_MODELS"),
    };
    if !missing.is_empty() {
        bail!("could not find constants: {}", missing.join(", "));
    }
    Ok(layout)
}

fn render(layout: &Layout) -> String {
    let Layout {
        frame_count,
        max_heightmaps,
        max_sky,
        max_models,
    } = *layout;

    // shader register bases
    let heightmap_reg_base = 1u64;
    let sky_reg_base = heightmap_reg_base + max_heightmaps;
    let albedo_reg_base = sky_reg_base + max_sky;

    // descriptor heap indices (C++ only)
    let per_frame_start = 0u64;
    let per_scene_cbv = frame_count;
    let texture_srv = per_scene_cbv + 1;
    let heightmap_srv = texture_srv + 1;
    let sky_srv = heightmap_srv + max_heightmaps;
    let model_albedo_srv = sky_srv + max_sky;
    let num_descriptors = model_albedo_srv + max_models;

    format!(
        "#pragma once

// ----------------------------------------------------------------------------
// Constants (shared between C++ and HLSL)
// ----------------------------------------------------------------------------
#define MAX_HEIGHTMAP_TEXTURES {max_heightmaps}
#define MAX_SKY_TEXTURES        {max_sky}
#define MAX_LOADED_MODELS       {max_models}

#ifdef __cplusplus
// ----------------------------------------------------------------------------
// C++ specific: register bases and descriptor heap indices
// ----------------------------------------------------------------------------
namespace RegisterLayout {{
    constexpr UINT HEIGHTMAP_REGISTER_BASE = {heightmap_reg_base};
    constexpr UINT HEIGHTMAP_COUNT          = MAX_HEIGHTMAP_TEXTURES;
    constexpr UINT SKY_REGISTER_BASE        = HEIGHTMAP_REGISTER_BASE + HEIGHTMAP_COUNT;
    constexpr UINT SKY_COUNT                 = MAX_SKY_TEXTURES;
    constexpr UINT ALBEDO_REGISTER_BASE      = SKY_REGISTER_BASE + SKY_COUNT;
    constexpr UINT ALBEDO_COUNT               = MAX_LOADED_MODELS;
}}

namespace DescriptorIndices {{
    constexpr UINT PER_FRAME_CBV_START = {per_frame_start};
    constexpr UINT PER_SCENE_CBV       = {per_scene_cbv};
    constexpr UINT TEXTURE_SRV          = {texture_srv};
    constexpr UINT HEIGHTMAP_SRV        = {heightmap_srv};
    constexpr UINT SKY_SRV              = {sky_srv};
    constexpr UINT MODEL_ALBEDO_SRV     = {model_albedo_srv};
    constexpr UINT NUM_DESCRIPTORS      = {num_descriptors};
}}
#else // HLSL
// ----------------------------------------------------------------------------
// HLSL specific: register bases as preprocessor macros (literal values)
// ----------------------------------------------------------------------------
#define HEIGHTMAP_REGISTER_BASE t{heightmap_reg_base}
#define SKY_REGISTER_BASE       t{sky_reg_base}
#define ALBEDO_REGISTER_BASE    t{albedo_reg_base}
#endif
"
    )
}

pub fn generate(input: &Path, output: &Path, force: bool) -> Result<bool> {
    let content = emit::read_source(input)?;
    let layout = mine_layout(&content)?;
    console::info(format!(
        "Found: g_FrameCount={}, MAX_HEIGHTMAP_TEXTURES={}, MAX_SKY_TEXTURES={}, MAX_LOADED_MODELS={}",
        layout.frame_count, layout.max_heightmaps, layout.max_sky, layout.max_models
    ));

    let code = render(&layout);
    let header = emit::make_header(Some("metagen descriptors"), "DESCRIPTOR LAYOUT");
    emit::write_if_changed(output, &format!("{header}{code}"), force)
}

// ------------------------------- Tests ------------------------------------ //
