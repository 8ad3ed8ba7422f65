//! cJSON (de)serialization for the scene structs: `Scene` as the container,
//! one JSON object per `SceneObject` with fields dispatched on their
//! declared type.

use std::path::Path;

use anyhow::{Result, bail};

use crate::decl::Field;
use crate::emit;
use crate::extract;

/// Fields mined out of `SceneObject` that describe the object itself.
/// Declarations originating inside the per-type union carry brace fragments
/// in their base type and are not plain members.
fn plain_members(fields: Vec<Field>) -> Vec<Field> {
    fields
        .into_iter()
        .filter(|field| !field.base_type.contains(['{', '}']))
        .collect()
}

fn push_save_field(lines: &mut Vec<String>, field: &Field) {
    let name = &field.name;
    match field.base_type.as_str() {
        "char" if field.is_array => {
            lines.push(format!(
                "        cJSON_AddStringToObject(objJson, \"{name}\", obj->{name});"
            ));
        }
        "DirectX::XMFLOAT3" | "DirectX::XMFLOAT4" => {
            let count = if field.base_type.ends_with('4') { 4 } else { 3 };
            lines.push(format!(
                "        cJSON* {name}Arr = cJSON_CreateFloatArray((float*)&obj->{name}, {count});"
            ));
            lines.push(format!(
                "        cJSON_AddItemToObject(objJson, \"{name}\", {name}Arr);"
            ));
        }
        // enums and numerics both serialise as numbers
        _ => {
            lines.push(format!(
                "        cJSON_AddNumberToObject(objJson, \"{name}\", obj->{name});"
            ));
        }
    }
}

fn push_load_field(lines: &mut Vec<String>, field: &Field) {
    let name = &field.name;
    lines.push(format!(
        "            cJSON* {name}Item = cJSON_GetObjectItem(objJson, \"{name}\");"
    ));
    match field.base_type.as_str() {
        "char" if field.is_array => {
            lines.push(format!(
                "            if (cJSON_IsString({name}Item)) strncpy(obj->{name}, {name}Item->valuestring, sizeof(obj->{name})-1);"
            ));
        }
        "DirectX::XMFLOAT3" | "DirectX::XMFLOAT4" => {
            let count = if field.base_type.ends_with('4') { 4 } else { 3 };
            lines.push(format!(
                "            if (cJSON_IsArray({name}Item) && cJSON_GetArraySize({name}Item) == {count}) {{"
            ));
            lines.push(format!("                for (int j = 0; j < {count}; ++j)"));
            lines.push(format!(
                "                    ((float*)&obj->{name})[j] = (float)cJSON_GetArrayItem({name}Item, j)->valuedouble;"
            ));
            lines.push("            }".into());
        }
        ty if ty.ends_with("Type") || ty == "RenderPipeline" => {
            // enum fields round-trip through their integer value
            lines.push(format!(
                "            if (cJSON_IsNumber({name}Item)) obj->{name} = ({ty}){name}Item->valueint;"
            ));
        }
        _ => {
            lines.push(format!(
                "            if (cJSON_IsNumber({name}Item)) obj->{name} = {name}Item->valuedouble;"
            ));
        }
    }
}

fn render(object_fields: &[Field]) -> String {
    let mut lines: Vec<String> = vec![
        "#include <cJSON.h>".into(),
        "#include \"../scene_data.h\"".into(),
        "#include \"mesh_data.h\"".into(),
        "#include <string.h>".into(),
        String::new(),
        "// ------------------------------------------------------------".into(),
        "// Serialise Scene -> JSON string (caller must free with cJSON_free)".into(),
        "// ------------------------------------------------------------".into(),
        "char* scene_to_json(const Scene* scene) {".into(),
        "    cJSON* root = cJSON_CreateObject();".into(),
        String::new(),
        "    // objectCount".into(),
        "    cJSON_AddNumberToObject(root, \"objectCount\", scene->objectCount);".into(),
        String::new(),
        "    // objects array".into(),
        "    cJSON* objectsArray = cJSON_CreateArray();".into(),
        "    for (int i = 0; i < scene->objectCount; ++i) {".into(),
        "        const SceneObject* obj = &scene->objects[i];".into(),
        "        cJSON* objJson = cJSON_CreateObject();".into(),
    ];
    for field in object_fields {
        push_save_field(&mut lines, field);
    }
    lines.extend([
        "        cJSON_AddItemToArray(objectsArray, objJson);".into(),
        "    }".into(),
        "    cJSON_AddItemToObject(root, \"objects\", objectsArray);".into(),
        String::new(),
        "    char* result = cJSON_Print(root);".into(),
        "    cJSON_Delete(root);".into(),
        "    return result;".into(),
        "}".into(),
        String::new(),
        "// ------------------------------------------------------------".into(),
        "// Parse JSON -> Scene (returns 1 on success, 0 on failure)".into(),
        "// ------------------------------------------------------------".into(),
        "int scene_from_json(const char* json, Scene* scene) {".into(),
        "    cJSON* root = cJSON_Parse(json);".into(),
        "    if (!root) return 0;".into(),
        String::new(),
        "    // Clear scene first (set defaults)".into(),
        "    memset(scene, 0, sizeof(Scene));".into(),
        "    scene->objectCount = 0;".into(),
        String::new(),
        "    // objectCount (optional)".into(),
        "    cJSON* countItem = cJSON_GetObjectItem(root, \"objectCount\");".into(),
        "    if (cJSON_IsNumber(countItem)) scene->objectCount = countItem->valueint;".into(),
        String::new(),
        "    // objects array".into(),
        "    cJSON* objArray = cJSON_GetObjectItem(root, \"objects\");".into(),
        "    if (cJSON_IsArray(objArray)) {".into(),
        "        int arraySize = cJSON_GetArraySize(objArray);".into(),
        "        for (int i = 0; i < arraySize && i < MAX_SCENE_OBJECTS; ++i) {".into(),
        "            cJSON* objJson = cJSON_GetArrayItem(objArray, i);".into(),
        "            SceneObject* obj = &scene->objects[i];".into(),
    ]);
    for field in object_fields {
        push_load_field(&mut lines, field);
    }
    lines.extend([
        "        }".into(),
        "        // Update objectCount if array was present".into(),
        "        if (arraySize > 0) scene->objectCount = arraySize;".into(),
        "    }".into(),
        String::new(),
        "    cJSON_Delete(root);".into(),
        "    return 1;".into(),
        "}".into(),
    ]);
    lines.join("\n")
}

pub fn generate(input: &Path, output: &Path, force: bool) -> Result<bool> {
    let content = emit::read_source(input)?;

    let scene_fields = extract::parse_struct_fields(&content, "Scene")
        .map_err(|err| anyhow::anyhow!("{err} in {}", input.display()))?;
    if scene_fields.is_empty() {
        bail!("could not parse Scene struct in {}", input.display());
    }

    let object_fields = extract::parse_struct_fields(&content, "SceneObject")
        .map_err(|err| anyhow::anyhow!("{err} in {}", input.display()))?;
    let object_fields = plain_members(object_fields);
    if object_fields.is_empty() {
        bail!("could not parse SceneObject struct in {}", input.display());
    }

    let code = render(&object_fields);
    let header = emit::make_header(Some("metagen scene-json"), "GENERATED SCENE JSON");
    emit::write_if_changed(output, &format!("{header}\n{code}"), force)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_HEADER: &str = "\
typedef struct {
    char nametag[128];
    DirectX::XMFLOAT3 pos;
    DirectX::XMFLOAT4 rot;
    DirectX::XMFLOAT3 scale;
    ObjectType objectType;
    union {
        struct {
            PrimitiveType primitiveType;
        } primitive;
        struct {
            float choppiness;
        } water;
    } data;
} SceneObject;

typedef struct {
    SceneObject objects[MAX_SCENE_OBJECTS];
    int objectCount;
} Scene;
";

    fn object_fields() -> Vec<Field> {
        plain_members(extract::parse_struct_fields(SCENE_HEADER, "SceneObject").unwrap())
    }

    #[test]
    fn union_fragments_are_filtered_from_the_object_members() {
        let names: Vec<String> = object_fields().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, ["nametag", "pos", "rot", "scale", "objectType"]);
    }

    #[test]
    fn char_arrays_serialise_as_strings() {
        let rendered = render(&object_fields());
        assert!(rendered.contains("cJSON_AddStringToObject(objJson, \"nametag\", obj->nametag);"));
        assert!(rendered.contains(
            "strncpy(obj->nametag, nametagItem->valuestring, sizeof(obj->nametag)-1);"
        ));
    }

    #[test]
    fn float_vectors_serialise_with_their_arity() {
        let rendered = render(&object_fields());
        assert!(rendered.contains("cJSON_CreateFloatArray((float*)&obj->pos, 3);"));
        assert!(rendered.contains("cJSON_CreateFloatArray((float*)&obj->rot, 4);"));
        assert!(rendered.contains("cJSON_GetArraySize(rotItem) == 4"));
    }

    #[test]
    fn enum_fields_round_trip_through_integers() {
        let rendered = render(&object_fields());
        assert!(rendered.contains(
            "cJSON_AddNumberToObject(objJson, \"objectType\", obj->objectType);"
        ));
        assert!(rendered.contains(
            "obj->objectType = (ObjectType)objectTypeItem->valueint;"
        ));
    }

    #[test]
    fn both_directions_are_emitted_with_the_scene_loop() {
        let rendered = render(&object_fields());
        assert!(rendered.contains("char* scene_to_json(const Scene* scene)"));
        assert!(rendered.contains("int scene_from_json(const char* json, Scene* scene)"));
        assert!(rendered.contains("i < arraySize && i < MAX_SCENE_OBJECTS"));
    }
}
