//! Program assembly: the emitted body wrapped in the target's full program
//! skeleton, plus the GLSL shader-test artifact.

use crate::cfg::{expected_path, StructuredCfg};
use crate::error::EmitError;
use crate::lang::{CodeType, Language};

use super::builder::CodeBuilder;
use super::fleshing::Fleshing;

/// A fully assembled, formatted source program for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProgram {
    /// The emission target.
    pub language: Language,
    /// The emission mode.
    pub code_type: CodeType,
    /// The complete formatted source text.
    pub source: String,
}

impl SourceProgram {
    /// Emit `cfg` as a complete program.
    ///
    /// `directions` is required for the local-array mode (the vector is
    /// embedded as a constant) and for the header-guard mode (the vector is
    /// compiled away); the global-array mode ignores it.
    ///
    /// # Errors
    ///
    /// Fails when the target does not support the mode, when the CFG
    /// violates the structured contract, or when required directions are
    /// missing or exhausted.
    pub fn generate(
        cfg: &StructuredCfg,
        language: Language,
        code_type: CodeType,
        directions: Option<&[u32]>,
    ) -> Result<Self, EmitError> {
        language.check_code_type(code_type)?;

        let body = CodeBuilder::new(cfg, language, code_type).build_code()?;

        let raw = match code_type {
            CodeType::GlobalArray => language.full_program(code_type, &body, None, None),
            CodeType::LocalArray => {
                let directions = directions.ok_or(EmitError::MissingDirections {
                    code_type: "local_array",
                })?;
                language.full_program(code_type, &body, None, Some(directions))
            }
            CodeType::HeaderGuard => {
                let directions = directions.ok_or(EmitError::MissingDirections {
                    code_type: "header_guard",
                })?;
                let fleshing = Fleshing::compute(cfg, language, directions)?;
                let declarations = fleshing.declarations();
                let skeleton =
                    language.full_program(code_type, &body, Some(&declarations), None);
                fleshing.substitute(&skeleton)
            }
        };

        Ok(SourceProgram {
            language,
            code_type,
            source: language.format_code(&raw),
        })
    }

    /// File-suffix hint for this program's source form.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.language.extension(true)
    }
}

fn space_separated(values: &[u32]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the shadertrap script that compiles a GLSL program, binds the
/// buffers, dispatches one workgroup, and asserts the observed path.
///
/// The observed-path buffer holds `len(expected) + 1` zero-filled 32-bit
/// slots, so a program that writes the right prefix but keeps writing is
/// still caught.
///
/// # Errors
///
/// Fails when the program is not GLSL, when global-array mode is missing
/// its directions, or when the oracle cannot complete the path.
pub fn glsl_shader_test(
    program: &SourceProgram,
    cfg: &StructuredCfg,
    directions: &[u32],
) -> Result<String, EmitError> {
    if program.language != Language::Glsl {
        return Err(EmitError::UnsupportedFeature {
            language: program.language.name(),
            feature: "shadertrap test generation".to_string(),
        });
    }

    let expected: Vec<u32> = expected_path(cfg, directions)?
        .iter()
        .map(|id| id.raw())
        .collect();

    let path_buffer_len = expected.len() + 1;
    let path_buffer_bytes = path_buffer_len * 4;
    let zeros = vec![0u32; path_buffer_len];

    let mut expected_padded = expected.clone();
    expected_padded.resize(path_buffer_len, 0);

    let is_global = program.code_type == CodeType::GlobalArray;
    let directions_buffer = if is_global {
        let directions_bytes = directions.len() * 4;
        format!(
            "CREATE_BUFFER directions SIZE_BYTES {directions_bytes} INIT_VALUES uint {}\n\n",
            space_separated(directions)
        )
    } else {
        String::new()
    };
    let directions_binding = if is_global {
        "BIND_SHADER_STORAGE_BUFFER BUFFER directions BINDING 1\n"
    } else {
        ""
    };

    Ok(format!(
        r"GL 4.5

CREATE_BUFFER actual_path SIZE_BYTES {path_buffer_bytes} INIT_VALUES
    uint {zeros}

{directions_buffer}CREATE_BUFFER expected_path SIZE_BYTES {path_buffer_bytes} INIT_VALUES
    uint {expected}

BIND_SHADER_STORAGE_BUFFER BUFFER actual_path BINDING 0
{directions_binding}
DECLARE_SHADER control_flow KIND COMPUTE

{source}

END

COMPILE_SHADER control_flow_compiled SHADER control_flow
CREATE_PROGRAM control_flow_prog SHADERS control_flow_compiled

RUN_COMPUTE
    PROGRAM control_flow_prog
    NUM_GROUPS 1 1 1

ASSERT_EQUAL BUFFERS expected_path actual_path",
        zeros = space_separated(&zeros),
        expected = space_separated(&expected_padded),
        source = program.source,
    ))
}

#[cfg(test)]
mod tests {
    use crate::cfg::examples;

    use super::*;

    #[test]
    fn global_array_programs_need_no_directions() {
        for language in Language::ALL {
            let cfg = examples::while_loop();
            let program =
                SourceProgram::generate(&cfg, language, CodeType::GlobalArray, None).unwrap();
            assert!(!program.source.is_empty());
        }
    }

    #[test]
    fn local_array_requires_directions() {
        let cfg = examples::if_else();
        let err = SourceProgram::generate(&cfg, Language::Wgsl, CodeType::LocalArray, None)
            .unwrap_err();
        assert!(matches!(err, EmitError::MissingDirections { .. }));
    }

    #[test]
    fn header_guard_substitutes_every_marker() {
        let cfg = examples::nested_while();
        let program = SourceProgram::generate(
            &cfg,
            Language::Glsl,
            CodeType::HeaderGuard,
            Some(&[1, 1, 0, 0]),
        )
        .unwrap();
        assert!(!program.source.contains("$$"), "{}", program.source);
        assert!(program.source.contains("cntrl_arr_var_4"));
    }

    #[test]
    fn wasm_global_array_assembles_a_module() {
        let cfg = examples::switch_no_fallthrough();
        let program =
            SourceProgram::generate(&cfg, Language::Wasm, CodeType::GlobalArray, None).unwrap();
        assert!(program.source.starts_with("(module"));
        assert_eq!(program.extension(), "wat");
    }

    #[test]
    fn shader_test_sizes_and_pads_the_buffers() {
        let cfg = examples::if_else();
        let program =
            SourceProgram::generate(&cfg, Language::Glsl, CodeType::GlobalArray, None).unwrap();
        let test = glsl_shader_test(&program, &cfg, &[1]).unwrap();
        // Path [1, 3, 4] plus one guard slot = 16 bytes.
        assert!(test.contains("CREATE_BUFFER actual_path SIZE_BYTES 16"));
        assert!(test.contains("uint 1 3 4 0"));
        assert!(test.contains("BIND_SHADER_STORAGE_BUFFER BUFFER directions BINDING 1"));
        assert!(test.contains("ASSERT_EQUAL BUFFERS expected_path actual_path"));
    }

    #[test]
    fn shader_test_rejects_non_glsl() {
        let cfg = examples::if_else();
        let program =
            SourceProgram::generate(&cfg, Language::Wgsl, CodeType::GlobalArray, None).unwrap();
        assert!(glsl_shader_test(&program, &cfg, &[1]).is_err());
    }

    #[test]
    fn emission_is_byte_identical_across_calls() {
        let cfg = examples::early_mixed_switch();
        let first =
            SourceProgram::generate(&cfg, Language::Glsl, CodeType::LocalArray, Some(&[1, 2, 0]))
                .unwrap();
        let second =
            SourceProgram::generate(&cfg, Language::Glsl, CodeType::LocalArray, Some(&[1, 2, 0]))
                .unwrap();
        assert_eq!(first.source, second.source);
    }
}
