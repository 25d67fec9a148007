use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

/// Process //!include directives in WGSL files
fn preprocess_wgsl_includes(
    source: &str,
    shader_path: &Path,
    processed: &mut HashSet<PathBuf>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut result = String::new();
    let shader_dir = shader_path.parent().unwrap_or(Path::new(""));

    for line in source.lines() {
        if let Some(include_path) = line.strip_prefix("//!include ") {
            let include_path = include_path.trim();
            let include_file = if include_path.starts_with("src/") {
                PathBuf::from(include_path)
            } else {
                shader_dir.join(include_path)
            };

            let canonical_path = include_file
                .canonicalize()
                .unwrap_or_else(|_| include_file.clone());

            // Each file is inlined once
            if !processed.insert(canonical_path.clone()) {
                continue;
            }
            println!("cargo:rerun-if-changed={}", canonical_path.display());

            let include_content = fs::read_to_string(&canonical_path).map_err(|e| {
                format!(
                    "Failed to read include file '{}': {}",
                    canonical_path.display(),
                    e
                )
            })?;

            let processed_include =
                preprocess_wgsl_includes(&include_content, &canonical_path, processed)?;
            result.push_str(&processed_include);
            result.push('\n');
        } else {
            result.push_str(line);
            result.push('\n');
        }
    }

    Ok(result)
}

/// Flatten one shader into the output directory
fn process_shader(shader_path: &Path, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", shader_path.display());

    let source = fs::read_to_string(shader_path)
        .map_err(|e| format!("Failed to read shader '{}': {}", shader_path.display(), e))?;
    let mut processed_files = HashSet::new();
    let processed_source = preprocess_wgsl_includes(&source, shader_path, &mut processed_files)?;

    let file_name = shader_path
        .file_name()
        .ok_or_else(|| format!("Shader path '{}' has no file name", shader_path.display()))?;
    fs::write(output_dir.join(file_name), processed_source)?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/shaders");

    let out_dir = env::var("OUT_DIR")?;
    let shader_out_dir = Path::new(&out_dir).join("shaders");
    fs::create_dir_all(&shader_out_dir)?;

    let shaders = ["src/shaders/body.wgsl"];

    for shader_path in &shaders {
        process_shader(Path::new(shader_path), &shader_out_dir)?;
    }

    Ok(())
}
