//! Compiler/architecture enums exposed to build recipes, translated
//! straight into the `-G`/`-A`/`-T` arguments `cmake` expects.

use serde::{Deserialize, Serialize};

/// A generator recipes can request from [`crate::api::BuildScriptApi::cmake_generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ECompiler {
    /// Visual Studio 2017, default toolset.
    VisualStudio2017,
    /// Visual Studio 2019, default toolset.
    VisualStudio2019,
    /// Visual Studio 2019 forced onto the v141 toolset.
    #[serde(rename = "VisualStudio2019_v141")]
    VisualStudio2019V141,
}

/// Target architecture for a generated build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EArch {
    /// 32-bit x86.
    #[serde(rename = "x86")]
    X86,
    /// 64-bit x86.
    #[serde(rename = "x64")]
    X64,
}

impl ECompiler {
    /// The `cmake -G <generator>` argument for this compiler/arch pair,
    /// plus any trailing `-A`/`-T` arguments CMake needs alongside it.
    #[must_use]
    pub fn generator_args(self, arch: EArch) -> Vec<String> {
        match self {
            ECompiler::VisualStudio2017 => {
                let mut args = vec!["-G".to_string(), "Visual Studio 15 2017".to_string()];
                if arch == EArch::X64 {
                    args[1].push_str(" Win64");
                }
                args
            }
            ECompiler::VisualStudio2019 => {
                let mut args = vec!["-G".to_string(), "Visual Studio 16 2019".to_string()];
                if arch == EArch::X86 {
                    args.push("-A".to_string());
                    args.push("Win32".to_string());
                }
                args
            }
            ECompiler::VisualStudio2019V141 => {
                let mut args = vec!["-G".to_string(), "Visual Studio 16 2019".to_string(), "-T".to_string(), "v141".to_string()];
                if arch == EArch::X86 {
                    args.push("-A".to_string());
                    args.push("Win32".to_string());
                }
                args
            }
        }
    }
}

/// Identifier handed back to a client on `PUT /build`, and used to look
/// up status and to address `/build_status/<id>`. Rendered as lowercase
/// hex in the HTTP surface.
pub type BuildId = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vs2019_x86_adds_platform_flag() {
        let args = ECompiler::VisualStudio2019.generator_args(EArch::X86);
        assert_eq!(args, vec!["-G", "Visual Studio 16 2019", "-A", "Win32"]);
    }

    #[test]
    fn vs2017_x64_appends_win64_to_generator_name() {
        let args = ECompiler::VisualStudio2017.generator_args(EArch::X64);
        assert_eq!(args, vec!["-G", "Visual Studio 15 2017 Win64"]);
    }

    #[test]
    fn vs2019_v141_forces_toolset() {
        let args = ECompiler::VisualStudio2019V141.generator_args(EArch::X64);
        assert_eq!(args, vec!["-G", "Visual Studio 16 2019", "-T", "v141"]);
    }
}
