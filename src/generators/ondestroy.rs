//! The `OnDestroy()` release sequence, generated from the renderer's COM
//! handles. Release order is fixed by a priority table keyed on field name;
//! constant buffers get an `Unmap` before their `Release`.

use std::path::Path;

use anyhow::Result;

use crate::console;
use crate::emit;
use crate::resources::{self, ResourceDescriptor};

/// Structs mined for COM handles.
const STRUCT_NAMES: &[&str] = &["pipeline_dx12", "graphics_resources", "sync_state"];

/// Type-name prefixes that mark an owned native handle.
const HANDLE_PREFIXES: &[&str] = &["ID3D", "IDXGI"];

/// Release priority by bare field name (an `m_` prefix is ignored). Lower
/// releases earlier; names not listed release last.
const PRIORITY: &[(&str, u32)] = &[
    // sync objects first
    ("fence", 0),
    // constant buffers need an Unmap
    ("constantBuffer", 1),
    // graphics resources
    ("texture", 2),
    ("vertexBuffer", 2),
    ("depthStencil", 2),
    // pipeline objects
    ("rootSignature", 3),
    ("pipelineState", 3),
    ("commandList", 3),
    // per-frame resources
    ("commandAllocators", 4),
    ("renderTargets", 4),
    // descriptor heaps
    ("dsvHeap", 5),
    ("mainHeap", 5),
    ("rtvHeap", 5),
    // swap chain
    ("swapChain", 6),
    // command queue
    ("commandQueue", 7),
    // device last
    ("device", 8),
];

fn bare_name(name: &str) -> &str {
    name.strip_prefix("m_").unwrap_or(name)
}

fn priority_of(resource: &ResourceDescriptor) -> u32 {
    let bare = bare_name(&resource.name);
    PRIORITY
        .iter()
        .find(|(name, _)| *name == bare)
        .map(|&(_, priority)| priority)
        .unwrap_or(999)
}

fn category_comment(name: &str) -> &'static str {
    match bare_name(name) {
        "fence" => "Release sync objects",
        "texture" | "vertexBuffer" | "indexBuffer" | "depthStencil" => {
            "Release graphics resources"
        }
        "rootSignature" | "pipelineState" | "commandList" => "Release pipeline objects",
        "commandAllocators" | "renderTargets" => "Release per-frame resources",
        "dsvHeap" | "mainHeap" | "rtvHeap" => "Release descriptor heaps",
        "swapChain" => "Release swap chain",
        "commandQueue" => "Release command queue",
        "device" => "Release device (last)",
        _ => "Release other resources",
    }
}

fn is_constant_buffer(resource: &ResourceDescriptor) -> bool {
    resource.name.to_lowercase().contains("constantbuffer")
}

fn push_release_block(lines: &mut Vec<String>, resource: &ResourceDescriptor, unmap: bool) {
    let target = format!("{}.{}", resource.struct_name, resource.name);
    if resource.is_array {
        // unsized arrays in these structs are per-frame
        let mut size = resource.array_size.as_deref().unwrap_or("g_FrameCount");
        if resource.struct_name == "pipeline_dx12" && resource.name == "m_pipelineStates" {
            size = "4";
        }
        lines.push(format!("    for (UINT i = 0; i < {size}; i++)"));
        lines.push("    {".into());
        lines.push(format!("        if ({target}[i])"));
        lines.push("        {".into());
        if unmap {
            lines.push(format!("            {target}[i]->Unmap(0, nullptr);"));
        }
        lines.push(format!("            {target}[i]->Release();"));
        lines.push(format!("            {target}[i] = nullptr;"));
        if unmap && resource.struct_name == "graphics_resources" {
            lines.push("            graphics_resources.m_pCbvDataBegin[i] = nullptr;".into());
        }
        lines.push("        }".into());
        lines.push("    }".into());
    } else {
        lines.push(format!("    if ({target})"));
        lines.push("    {".into());
        if unmap {
            lines.push(format!("        {target}->Unmap(0, nullptr);"));
        }
        lines.push(format!("        {target}->Release();"));
        lines.push(format!("        {target} = nullptr;"));
        lines.push("    }".into());
    }
}

fn render(resources: &[ResourceDescriptor]) -> String {
    let mut lines: Vec<String> = vec![
        "#pragma once".into(),
        "#include \"renderer_dx12.cpp\"".into(),
        "#define ONDESTROY_GENERATED_CPP".into(),
        String::new(),
        "void OnDestroy()".into(),
        "{".into(),
        "    // Ensure that the GPU is no longer referencing resources that are about to be"
            .into(),
        "    // cleaned up by the destructor.".into(),
        "    WaitForGpu();".into(),
        String::new(),
    ];

    let constant_buffers: Vec<&ResourceDescriptor> =
        resources.iter().filter(|r| is_constant_buffer(r)).collect();
    if !constant_buffers.is_empty() {
        lines.push("    // Unmap and release constant buffers".into());
        for resource in &constant_buffers {
            push_release_block(&mut lines, resource, true);
        }
        lines.push(String::new());
    }

    let mut current_category: Option<&str> = None;
    for resource in resources.iter().filter(|r| !is_constant_buffer(r)) {
        let category = category_comment(&resource.name);
        if current_category != Some(category) {
            if current_category.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("    // {category}"));
            current_category = Some(category);
        }
        push_release_block(&mut lines, resource, false);
    }

    lines.extend([
        String::new(),
        "    // Close fence event handle".into(),
        "    if (sync_state.m_fenceEvent)".into(),
        "    {".into(),
        "        CloseHandle(sync_state.m_fenceEvent);".into(),
        "        sync_state.m_fenceEvent = nullptr;".into(),
        "    }".into(),
        "}".into(),
    ]);
    lines.join("\n")
}

pub fn generate(input: &Path, output: &Path, force: bool) -> Result<bool> {
    let content = emit::read_source(input)?;

    let mut resources = resources::collect_handle_fields(&content, STRUCT_NAMES, HANDLE_PREFIXES);
    console::info(format!("Found {} COM resources", resources.len()));
    for resource in &resources {
        let suffix = match (&resource.array_size, resource.is_array) {
            (Some(size), _) => format!("[{size}]"),
            (None, true) => "[]".into(),
            (None, false) => String::new(),
        };
        console::debug(format!(
            "  - {}.{}{suffix} ({})",
            resource.struct_name, resource.name, resource.base_type
        ));
    }

    resources::sort_for_release(&mut resources, priority_of);

    let code = render(&resources);
    let header = emit::make_header(Some("metagen ondestroy"), "GENERATED ONDESTROY");
    emit::write_if_changed(output, &format!("{header}{code}"), force)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERER: &str = "\
static struct
{
    UINT64 m_fenceValues[g_FrameCount];
    ID3D12Fence *m_fence;
    HANDLE m_fenceEvent;
    UINT m_frameIndex;
} sync_state;

static struct
{
    ID3D12Device *m_device;
    IDXGISwapChain3 *m_swapChain;
    ID3D12DescriptorHeap *m_rtvHeap;
    ID3D12Resource *m_renderTargets[g_FrameCount];
    ID3D12RootSignature *m_rootSignature;
} pipeline_dx12;

static struct
{
    ID3D12Resource *m_texture;
    ID3D12Resource *m_PerFrameConstantBuffer[g_FrameCount];
    UINT8 *m_pCbvDataBegin[g_FrameCount];
} graphics_resources;
";

    fn mined() -> Vec<ResourceDescriptor> {
        let mut resources =
            resources::collect_handle_fields(RENDERER, STRUCT_NAMES, HANDLE_PREFIXES);
        resources::sort_for_release(&mut resources, priority_of);
        resources
    }

    #[test]
    fn release_order_runs_fence_first_device_last() {
        // constant buffers sort by the unmap pass, not the priority table
        let names: Vec<String> = mined()
            .iter()
            .filter(|r| !is_constant_buffer(r))
            .map(|r| r.name.clone())
            .collect();
        let pos = |name: &str| names.iter().position(|n| n == name).unwrap();
        assert_eq!(pos("m_fence"), 0);
        assert!(pos("m_texture") < pos("m_rootSignature"));
        assert!(pos("m_renderTargets") < pos("m_rtvHeap"));
        assert!(pos("m_swapChain") < pos("m_device"));
        assert_eq!(names.last().map(String::as_str), Some("m_device"));
    }

    #[test]
    fn constant_buffers_are_unmapped_before_release() {
        let rendered = render(&mined());
        assert!(rendered.contains("// Unmap and release constant buffers"));
        let unmap = rendered
            .find("graphics_resources.m_PerFrameConstantBuffer[i]->Unmap(0, nullptr);")
            .unwrap();
        let release = rendered
            .find("graphics_resources.m_PerFrameConstantBuffer[i]->Release();")
            .unwrap();
        assert!(unmap < release);
        assert!(rendered.contains("graphics_resources.m_pCbvDataBegin[i] = nullptr;"));
    }

    #[test]
    fn per_frame_arrays_loop_over_their_size_token() {
        let rendered = render(&mined());
        assert!(rendered.contains("for (UINT i = 0; i < g_FrameCount; i++)"));
        assert!(rendered.contains("if (pipeline_dx12.m_renderTargets[i])"));
    }

    #[test]
    fn category_comments_delimit_the_blocks() {
        let rendered = render(&mined());
        for comment in [
            "// Release sync objects",
            "// Release graphics resources",
            "// Release per-frame resources",
            "// Release descriptor heaps",
            "// Release swap chain",
            "// Release device (last)",
        ] {
            assert!(rendered.contains(comment), "missing {comment:?}");
        }
    }

    #[test]
    fn the_fence_event_is_closed_at_the_end() {
        let rendered = render(&mined());
        let close = rendered.find("CloseHandle(sync_state.m_fenceEvent);").unwrap();
        let device = rendered.find("pipeline_dx12.m_device->Release();").unwrap();
        assert!(device < close);
    }

    #[test]
    fn non_handle_fields_never_appear() {
        let rendered = render(&mined());
        assert!(!rendered.contains("m_frameIndex"));
        assert!(!rendered.contains("m_fenceValues"));
    }
}
