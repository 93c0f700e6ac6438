//! Direct scan of a compiled module's raw SPIR-V words for execution-mode
//! and struct-layout facts `spirv_cross`'s resource walk in [`crate::reflect`]
//! doesn't surface on its own: workgroup sizes, tessellation patch size,
//! early fragment tests, geometry input topology, and struct member
//! offsets/array strides. SPIR-V's binary layout is a stable public format,
//! so this reads the instruction stream directly rather than depending on
//! a reflection library's execution-mode surface.

use crate::types::TopologyMask;
use std::collections::HashMap;

const OP_EXECUTION_MODE: u16 = 16;
const OP_TYPE_STRUCT: u16 = 30;
const OP_CONSTANT: u16 = 43;
const OP_SPEC_CONSTANT: u16 = 50;
const OP_DECORATE: u16 = 71;
const OP_MEMBER_DECORATE: u16 = 72;
const OP_EXECUTION_MODE_ID: u16 = 331;

const DECORATION_SPEC_ID: u32 = 1;
const DECORATION_ARRAY_STRIDE: u32 = 6;
const DECORATION_OFFSET: u32 = 35;

const MODE_EARLY_FRAGMENT_TESTS: u32 = 9;
const MODE_INPUT_POINTS: u32 = 19;
const MODE_INPUT_LINES: u32 = 20;
const MODE_INPUT_LINES_ADJACENCY: u32 = 21;
const MODE_TRIANGLES: u32 = 22;
const MODE_INPUT_TRIANGLES_ADJACENCY: u32 = 23;
const MODE_OUTPUT_VERTICES: u32 = 26;
const MODE_LOCAL_SIZE: u32 = 17;
const MODE_LOCAL_SIZE_ID: u32 = 38;

/// Execution-mode and layout facts pulled from a single compiled module.
/// A compiled module emitted by `glslc`/`glslangValidator` from a single
/// `#version`-stamped source always carries exactly one entry point, so
/// these facts aren't keyed by entry-point id.
#[derive(Debug, Clone, Default)]
pub struct ExecutionModes {
    /// Local workgroup size, compute/mesh/task stages only.
    pub local_size: Option<[u32; 3]>,
    /// Specialization-constant id overriding each `local_size` component.
    pub local_size_spec_ids: Option<[Option<u32>; 3]>,
    /// Tessellation-control output patch vertex count.
    pub output_vertices: Option<u32>,
    /// Whether `EarlyFragmentTests` was declared.
    pub early_fragment_tests: bool,
    /// Geometry-stage declared input primitive, translated to the closest
    /// [`TopologyMask`] bit(s).
    pub geometry_input: Option<TopologyMask>,
}

/// Struct member layout facts keyed by the struct type's result id.
#[derive(Debug, Clone, Default)]
struct StructFacts {
    member_types: Vec<u32>,
    first_member_offset: Option<u32>,
}

/// Scan `words` (a full SPIR-V module, header included) for execution
/// modes and struct layout facts.
pub fn scan(words: &[u32]) -> ExecutionModes {
    let mut modes = ExecutionModes::default();
    let mut spec_ids: HashMap<u32, u32> = HashMap::new();
    let mut constant_values: HashMap<u32, u32> = HashMap::new();
    let mut pending_local_size_id: Option<[u32; 3]> = None;

    for_each_instruction(words, |opcode, operands| match opcode {
        OP_DECORATE if operands.len() >= 3 && operands[1] == DECORATION_SPEC_ID => {
            spec_ids.insert(operands[0], operands[2]);
        }
        OP_CONSTANT | OP_SPEC_CONSTANT if operands.len() >= 3 => {
            constant_values.insert(operands[1], operands[2]);
        }
        OP_EXECUTION_MODE if operands.len() >= 2 => {
            apply_mode(&mut modes, operands[1], &operands[2..], &mut pending_local_size_id);
        }
        OP_EXECUTION_MODE_ID if operands.len() >= 5 && operands[1] == MODE_LOCAL_SIZE_ID => {
            pending_local_size_id = Some([operands[2], operands[3], operands[4]]);
        }
        _ => {}
    });

    if let Some(ids) = pending_local_size_id {
        modes.local_size = Some(ids.map(|id| constant_values.get(&id).copied().unwrap_or(1)));
        modes.local_size_spec_ids = Some(ids.map(|id| spec_ids.get(&id).copied()));
    }

    modes
}

fn apply_mode(modes: &mut ExecutionModes, mode: u32, operands: &[u32], pending_local_size_id: &mut Option<[u32; 3]>) {
    match mode {
        MODE_EARLY_FRAGMENT_TESTS => modes.early_fragment_tests = true,
        MODE_OUTPUT_VERTICES if !operands.is_empty() => modes.output_vertices = Some(operands[0]),
        MODE_LOCAL_SIZE if operands.len() >= 3 => {
            modes.local_size = Some([operands[0], operands[1], operands[2]]);
            modes.local_size_spec_ids = Some([None, None, None]);
            *pending_local_size_id = None;
        }
        MODE_INPUT_POINTS => modes.geometry_input = Some(TopologyMask::POINT_LIST),
        MODE_INPUT_LINES | MODE_INPUT_LINES_ADJACENCY => modes.geometry_input = Some(TopologyMask::LINE_LIST),
        MODE_TRIANGLES | MODE_INPUT_TRIANGLES_ADJACENCY => modes.geometry_input = Some(TopologyMask::TRIANGLE_LIST),
        _ => {}
    }
}

/// First declared member's byte offset and the array stride of the
/// struct's trailing array member (`0` if it has none), for the struct
/// type with result id `type_id`.
pub struct MemberLayout {
    /// Byte offset of member 0, from its `Offset` decoration.
    pub first_member_offset: Option<u32>,
    /// `ArrayStride` of the trailing member, if it is an array.
    pub trailing_array_stride: u32,
}

/// Scan `words` for the member-offset and array-stride facts of the struct
/// type declared with result id `type_id`.
#[must_use]
pub fn struct_member_layout(words: &[u32], type_id: u32) -> MemberLayout {
    let mut structs: HashMap<u32, StructFacts> = HashMap::new();
    let mut array_strides: HashMap<u32, u32> = HashMap::new();

    for_each_instruction(words, |opcode, operands| match opcode {
        OP_TYPE_STRUCT if !operands.is_empty() => {
            structs.entry(operands[0]).or_default().member_types = operands[1..].to_vec();
        }
        OP_MEMBER_DECORATE if operands.len() >= 3 && operands[1] == 0 && operands[2] == DECORATION_OFFSET => {
            if operands.len() >= 4 {
                structs.entry(operands[0]).or_default().first_member_offset = Some(operands[3]);
            }
        }
        OP_DECORATE if operands.len() >= 3 && operands[1] == DECORATION_ARRAY_STRIDE => {
            array_strides.insert(operands[0], operands[2]);
        }
        _ => {}
    });

    let first_member_offset = structs.get(&type_id).and_then(|s| s.first_member_offset);
    let trailing_array_stride = structs
        .get(&type_id)
        .and_then(|s| s.member_types.last())
        .and_then(|member_type| array_strides.get(member_type))
        .copied()
        .unwrap_or(0);

    MemberLayout { first_member_offset, trailing_array_stride }
}

/// Walk `words` (a full module, header included) as a stream of
/// instructions, calling `f(opcode, operands)` for each one, where
/// `operands` is the instruction's words after the opcode word.
fn for_each_instruction(words: &[u32], mut f: impl FnMut(u16, &[u32])) {
    const HEADER_LEN: usize = 5;
    if words.len() <= HEADER_LEN {
        return;
    }
    let mut idx = HEADER_LEN;
    while idx < words.len() {
        let word0 = words[idx];
        let word_count = (word0 >> 16) as usize;
        let opcode = (word0 & 0xFFFF) as u16;
        if word_count == 0 || idx + word_count > words.len() {
            break;
        }
        f(opcode, &words[idx + 1..idx + word_count]);
        idx += word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(opcode: u16, operands: &[u32]) -> Vec<u32> {
        let mut words = vec![((operands.len() as u32 + 1) << 16) | u32::from(opcode)];
        words.extend_from_slice(operands);
        words
    }

    fn module(instructions: &[Vec<u32>]) -> Vec<u32> {
        let mut words = vec![0x0723_0203, 0x0001_0000, 0, 1, 0];
        for instruction in instructions {
            words.extend_from_slice(instruction);
        }
        words
    }

    #[test]
    fn local_size_literal_is_captured() {
        let words = module(&[instr(OP_EXECUTION_MODE, &[1, MODE_LOCAL_SIZE, 8, 4, 1])]);
        let modes = scan(&words);
        assert_eq!(modes.local_size, Some([8, 4, 1]));
        assert_eq!(modes.local_size_spec_ids, Some([None, None, None]));
    }

    #[test]
    fn early_fragment_tests_is_detected() {
        let words = module(&[instr(OP_EXECUTION_MODE, &[1, MODE_EARLY_FRAGMENT_TESTS])]);
        assert!(scan(&words).early_fragment_tests);
    }

    #[test]
    fn output_vertices_sets_patch_size() {
        let words = module(&[instr(OP_EXECUTION_MODE, &[1, MODE_OUTPUT_VERTICES, 3])]);
        assert_eq!(scan(&words).output_vertices, Some(3));
    }

    #[test]
    fn geometry_input_triangles_maps_to_triangle_list() {
        let words = module(&[instr(OP_EXECUTION_MODE, &[1, MODE_TRIANGLES])]);
        assert_eq!(scan(&words).geometry_input, Some(TopologyMask::TRIANGLE_LIST));
    }

    #[test]
    fn local_size_id_resolves_through_spec_constant() {
        let words = module(&[
            instr(OP_SPEC_CONSTANT, &[100, 10, 64]),
            instr(OP_DECORATE, &[10, DECORATION_SPEC_ID, 0]),
            instr(OP_EXECUTION_MODE_ID, &[1, MODE_LOCAL_SIZE_ID, 10, 10, 10]),
        ]);
        let modes = scan(&words);
        assert_eq!(modes.local_size, Some([64, 64, 64]));
        assert_eq!(modes.local_size_spec_ids, Some([Some(0), Some(0), Some(0)]));
    }

    #[test]
    fn struct_layout_reads_first_member_offset_and_trailing_stride() {
        let words = module(&[
            instr(OP_DECORATE, &[5, DECORATION_ARRAY_STRIDE, 16]),
            instr(OP_TYPE_STRUCT, &[20, 5]),
            instr(OP_MEMBER_DECORATE, &[20, 0, DECORATION_OFFSET, 0]),
        ]);
        let layout = struct_member_layout(&words, 20);
        assert_eq!(layout.first_member_offset, Some(0));
        assert_eq!(layout.trailing_array_stride, 16);
    }
}
