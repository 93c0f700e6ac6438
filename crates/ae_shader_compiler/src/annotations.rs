//! The `//@` annotation pass: a regex-driven scan of shader source (plus
//! any included files) for per-declaration metadata the GLSL language
//! itself has no syntax for.

use std::collections::HashMap;

/// Parsed `//@` directives attached to the declaration on the following
/// line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// `set <index> "<name>"` directives, keyed by set index.
    pub set_names: HashMap<u8, String>,
    /// Uniform/storage-buffer names marked `dynamic-offset`.
    pub dynamic_offset: Vec<String>,
    /// Storage image/buffer names marked `discard`.
    pub discard: Vec<String>,
}

/// Scan `source` (the caller concatenates included files onto this before
/// calling, if any) for `//@key[, @key...]` comments and the declaration
/// name on the following non-blank line.
#[must_use]
pub fn scan(source: &str) -> Annotations {
    let annotation_re = regex::Regex::new(r"^\s*//@(.+)$").unwrap();
    let set_re = regex::Regex::new(r#"set\s+(\d+)\s+"([^"]+)""#).unwrap();
    let decl_name_re = regex::Regex::new(r"\b(\w+)\s*[;\[=]").unwrap();

    let mut out = Annotations::default();
    let lines: Vec<&str> = source.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = annotation_re.captures(line) else { continue };
        let body = &caps[1];

        let Some(decl_line) = lines[i + 1..].iter().find(|l| !l.trim().is_empty()) else {
            continue;
        };
        let name = decl_name_re.captures(decl_line).map(|c| c[1].to_string());

        for key in body.split('@').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(set_caps) = set_re.captures(key) {
                if let Ok(index) = set_caps[1].parse::<u8>() {
                    out.set_names.insert(index, set_caps[2].to_string());
                }
                continue;
            }
            match key {
                "dynamic-offset" => {
                    if let Some(name) = &name {
                        out.dynamic_offset.push(name.clone());
                    }
                }
                "discard" => {
                    if let Some(name) = &name {
                        out.discard.push(name.clone());
                    }
                }
                other => log::warn!("unrecognized shader annotation key: {other}"),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_name_and_dynamic_offset() {
        let src = "//@set 0 \"global\"\nlayout(set = 0, binding = 0) uniform Globals { mat4 view; };\n//@dynamic-offset\nlayout(set = 1, binding = 0) uniform PerDraw { mat4 model; } per_draw;\n";
        let annotations = scan(src);
        assert_eq!(annotations.set_names.get(&0), Some(&"global".to_string()));
        assert_eq!(annotations.dynamic_offset, vec!["per_draw".to_string()]);
    }

    #[test]
    fn unknown_key_is_not_fatal() {
        let src = "//@frobnicate\nint x;\n";
        let annotations = scan(src);
        assert!(annotations.set_names.is_empty());
        assert!(annotations.dynamic_offset.is_empty());
    }
}
