//! Pipeline creation code for every shader variant, emitted as an `.inl`
//! block to be included inside `LoadAssets()`.

use std::path::Path;

use anyhow::Result;

use crate::emit;

/// One shader variant. Names must match the `RenderPipeline` enum in
/// render_pipeline_data.h; add entries here when a new variant is needed.
struct PipelineDef {
    name: &'static str,
    vs_entry: &'static str,
    ps_entry: &'static str,
    defines: &'static [(&'static str, &'static str)],
}

const PIPELINES: &[PipelineDef] = &[
    PipelineDef {
        name: "RENDER_DEFAULT",
        vs_entry: "VSMain",
        ps_entry: "PSMain",
        defines: &[],
    },
    PipelineDef {
        name: "RENDER_TRIPLANAR",
        vs_entry: "VSMain",
        ps_entry: "PSMain",
        defines: &[("TRIPLANAR", "1")],
    },
    PipelineDef {
        name: "RENDER_HEIGHTFIELD",
        vs_entry: "VSMain",
        ps_entry: "PSMain",
        defines: &[("HEIGHTFIELD", "1")],
    },
];

fn push_compile(lines: &mut Vec<String>, entry: &str, target: &str, slot: &str, def_var: &str) {
    lines.push(format!(
        "if (!CompileShader(L\"shader_source\\\\shaders.hlsl\", \"{entry}\", \"{target}\", &{slot}, {def_var})) {{"
    ));
    lines.push("    HRAssert(E_FAIL);".into());
    lines.push("    return false;".into());
    lines.push("}".into());
    lines.push(String::new());
}

fn render() -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("// This file is included inside LoadAssets() - do not edit manually.".into());
    lines.push(String::new());
    lines.push("// It expects the following to be in scope:".into());
    lines.push("//   - msaa_state, pipeline_dx12 (global structs)".into());
    lines.push("//   - inputElementDescs (local array)".into());
    lines.push("//   - msaa_state.m_supported, msaa_state.m_sampleCounts".into());
    lines.push("//   - pipeline_dx12.m_pipelineStates[tech][msaaIdx]".into());
    lines.push(String::new());
    lines.push("ID3DBlob* vertexShaders[RENDER_COUNT] = {};".into());
    lines.push("ID3DBlob* pixelShaders[RENDER_COUNT] = {};".into());
    lines.push(String::new());

    for pipeline in PIPELINES {
        let def_var = if pipeline.defines.is_empty() {
            "nullptr".to_string()
        } else {
            format!("{}_defines", pipeline.name.to_lowercase())
        };

        if !pipeline.defines.is_empty() {
            lines.push(format!("static const D3D_SHADER_MACRO {def_var}[] = {{"));
            for (name, value) in pipeline.defines {
                lines.push(format!("    {{\"{name}\", \"{value}\"}},"));
            }
            lines.push("    {nullptr, nullptr}".into());
            lines.push("};".into());
            lines.push(String::new());
        }

        let vs_slot = format!("vertexShaders[{}]", pipeline.name);
        let ps_slot = format!("pixelShaders[{}]", pipeline.name);
        push_compile(&mut lines, pipeline.vs_entry, "vs_5_0", &vs_slot, &def_var);
        push_compile(&mut lines, pipeline.ps_entry, "ps_5_0", &ps_slot, &def_var);
    }

    lines.extend(
        [
            "// Create PSO for each supported MSAA level",
            "for (UINT msaaIdx = 0; msaaIdx < 4; ++msaaIdx)",
            "{",
            "    if (!msaa_state.m_supported[msaaIdx]) continue;",
            "",
            "    D3D12_GRAPHICS_PIPELINE_STATE_DESC psoDesc = {};",
            "    psoDesc.InputLayout = {inputElementDescs, _countof(inputElementDescs)};",
            "    psoDesc.pRootSignature = pipeline_dx12.m_rootSignature;",
            "    psoDesc.RasterizerState = CD3DX12_RASTERIZER_DESC(D3D12_DEFAULT);",
            "    psoDesc.BlendState = CD3DX12_BLEND_DESC(D3D12_DEFAULT);",
            "    psoDesc.DepthStencilState = CD3DX12_DEPTH_STENCIL_DESC(D3D12_DEFAULT);",
            "    psoDesc.DepthStencilState.DepthEnable = true;",
            "    psoDesc.DepthStencilState.DepthWriteMask = D3D12_DEPTH_WRITE_MASK_ALL;",
            "    psoDesc.DepthStencilState.DepthFunc = D3D12_COMPARISON_FUNC_LESS;",
            "    psoDesc.DSVFormat = DXGI_FORMAT_D32_FLOAT;",
            "    psoDesc.SampleMask = UINT_MAX;",
            "    psoDesc.PrimitiveTopologyType = D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE;",
            "    psoDesc.NumRenderTargets = 1;",
            "    psoDesc.RTVFormats[0] = g_screenFormat;",
            "    psoDesc.SampleDesc.Count = msaa_state.m_sampleCounts[msaaIdx];",
            "    psoDesc.SampleDesc.Quality = 0;",
            "",
            "    for (UINT tech = 0; tech < RENDER_COUNT; ++tech)",
            "    {",
            "        if (vertexShaders[tech] && pixelShaders[tech])",
            "        {",
            "            psoDesc.VS = CD3DX12_SHADER_BYTECODE(vertexShaders[tech]);",
            "            psoDesc.PS = CD3DX12_SHADER_BYTECODE(pixelShaders[tech]);",
            "            HRAssert(pipeline_dx12.m_device->CreateGraphicsPipelineState(",
            "                &psoDesc,",
            "                IID_PPV_ARGS(&pipeline_dx12.m_pipelineStates[tech][msaaIdx])));",
            "        }",
            "    }",
            "}",
            "",
            "// Release shader blobs",
            "for (UINT tech = 0; tech < RENDER_COUNT; ++tech)",
            "{",
            "    if (vertexShaders[tech]) vertexShaders[tech]->Release();",
            "    if (pixelShaders[tech]) pixelShaders[tech]->Release();",
            "}",
        ]
        .map(String::from),
    );
    lines.join("\n")
}

pub fn generate(output: &Path, force: bool) -> Result<bool> {
    let code = render();
    let header = emit::make_header(Some("metagen pipelines"), "PIPELINE CREATION");
    emit::write_if_changed(output, &format!("{header}{code}"), force)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_compiles_both_shader_stages() {
        let rendered = render();
        for name in ["RENDER_DEFAULT", "RENDER_TRIPLANAR", "RENDER_HEIGHTFIELD"] {
            assert!(rendered.contains(&format!("&vertexShaders[{name}]")));
            assert!(rendered.contains(&format!("&pixelShaders[{name}]")));
        }
        assert!(rendered.contains("\"VSMain\", \"vs_5_0\""));
        assert!(rendered.contains("\"PSMain\", \"ps_5_0\""));
    }

    #[test]
    fn defines_become_shader_macro_arrays() {
        let rendered = render();
        assert!(rendered.contains("static const D3D_SHADER_MACRO render_triplanar_defines[] = {"));
        assert!(rendered.contains("    {\"TRIPLANAR\", \"1\"},"));
        assert!(rendered.contains("render_heightfield_defines"));
        // the default variant has no macro array
        assert!(!rendered.contains("render_default_defines"));
        assert!(rendered.contains(", nullptr)) {"));
    }

    #[test]
    fn pso_loop_covers_msaa_levels_and_techniques() {
        let rendered = render();
        assert!(rendered.contains("for (UINT msaaIdx = 0; msaaIdx < 4; ++msaaIdx)"));
        assert!(rendered.contains("for (UINT tech = 0; tech < RENDER_COUNT; ++tech)"));
        assert!(rendered.contains("m_pipelineStates[tech][msaaIdx]"));
        // blobs are released after PSO creation
        let pso = rendered.find("CreateGraphicsPipelineState").unwrap();
        let release = rendered.find("// Release shader blobs").unwrap();
        assert!(pso < release);
    }
}
