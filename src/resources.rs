//! Owned-handle field mining, the specialization behind cleanup-order
//! generation. A handle is recognised purely by type-name prefix; both the
//! struct allow-list and the prefix set come from the caller.

use crate::console;
use crate::extract;

/// One native-handle field of an allow-listed struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub struct_name: String,
    pub base_type: String,
    pub name: String,
    pub is_array: bool,
    pub array_size: Option<String>,
}

/// Collect the fields whose base type starts with one of `type_prefixes`
/// from each struct in `struct_names`, concatenated in allow-list order and
/// declaration order within a struct. A struct missing from the source logs
/// a warning and contributes nothing.
pub fn collect_handle_fields(
    content: &str,
    struct_names: &[&str],
    type_prefixes: &[&str],
) -> Vec<ResourceDescriptor> {
    let mut resources = Vec::new();
    for &struct_name in struct_names {
        let fields = match extract::parse_struct_fields(content, struct_name) {
            Ok(fields) => fields,
            Err(err) => {
                console::warn(err);
                continue;
            }
        };
        for field in fields {
            if type_prefixes
                .iter()
                .any(|prefix| field.base_type.starts_with(prefix))
            {
                resources.push(ResourceDescriptor {
                    struct_name: struct_name.to_string(),
                    base_type: field.base_type,
                    name: field.name,
                    is_array: field.is_array,
                    array_size: field.array_size,
                });
            }
        }
    }
    resources
}

/// Stable release-order sort: lower priority releases earlier. Callers map
/// names they do not know to a large value so those fields sort last, and
/// ties keep the original discovery order.
pub fn sort_for_release(
    resources: &mut [ResourceDescriptor],
    priority_of: impl Fn(&ResourceDescriptor) -> u32,
) {
    resources.sort_by_key(|resource| priority_of(resource));
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "\
static struct
{
    ID3D12Resource *m_texture;
    int m_frameIndex;
    IDXGISwapChain1 *m_swapChain;
} graphics;
";

    #[test]
    fn only_prefix_matched_fields_survive_in_declaration_order() {
        let resources = collect_handle_fields(SRC, &["graphics"], &["ID3D", "IDXGI"]);
        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["m_texture", "m_swapChain"]);
        assert_eq!(resources[0].base_type, "ID3D12Resource");
        assert_eq!(resources[1].base_type, "IDXGISwapChain1");
    }

    #[test]
    fn allow_list_order_drives_concatenation_order() {
        let src = "\
static struct { ID3D12Fence *m_fence; } sync_state;
static struct { ID3D12Device *m_device; } pipeline;
";
        let resources = collect_handle_fields(src, &["pipeline", "sync_state"], &["ID3D"]);
        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["m_device", "m_fence"]);
        assert_eq!(resources[0].struct_name, "pipeline");
    }

    #[test]
    fn a_missing_struct_is_skipped_not_fatal() {
        let resources = collect_handle_fields(SRC, &["no_such_struct"], &["ID3D"]);
        assert!(resources.is_empty());
    }

    #[test]
    fn array_shape_is_carried_through() {
        let src = "static struct { ID3D12Resource *m_renderTargets[g_FrameCount]; } rt;";
        let resources = collect_handle_fields(src, &["rt"], &["ID3D"]);
        assert!(resources[0].is_array);
        assert_eq!(resources[0].array_size.as_deref(), Some("g_FrameCount"));
    }

    #[test]
    fn release_sort_is_stable_with_unknowns_last() {
        let src = "\
static struct
{
    ID3D12Device *m_device;
    ID3D12Heap *m_oddOne;
    ID3D12Fence *m_fence;
    ID3D12Heap *m_otherOdd;
} s;
";
        let mut resources = collect_handle_fields(src, &["s"], &["ID3D"]);
        sort_for_release(&mut resources, |r| match r.name.as_str() {
            "m_fence" => 0,
            "m_device" => 8,
            _ => 999,
        });
        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["m_fence", "m_device", "m_oddOne", "m_otherOdd"]);
    }
}
