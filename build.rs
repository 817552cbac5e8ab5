use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy the page, templates and config next to the executable
    let target_dir = target_dir();
    for folder in ["web", "buttons"] {
        copy_assets(folder, &target_dir);
    }
    copy_config(&target_dir);
}

/// target/release (or target/debug) for this build.
fn target_dir() -> PathBuf {
    let out_dir = env::var("OUT_DIR").unwrap();
    // OUT_DIR is something like target/release/build/fast-react-xxx/out
    Path::new(&out_dir)
        .ancestors()
        .nth(3) // Go up 3 levels: out -> hash -> build -> release
        .expect("Could not find target directory")
        .to_path_buf()
}

fn copy_assets(folder: &str, target_dir: &Path) {
    let src = Path::new(folder);
    if src.exists() {
        copy_dir_recursive(src, &target_dir.join(folder));
        println!("cargo:rerun-if-changed={}/", folder);
    }
}

/// Recursively copies a directory and its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}

fn copy_config(target_dir: &Path) {
    let config_src = Path::new("config.json");
    if config_src.exists() {
        let _ = fs::copy(config_src, target_dir.join("config.json"));
        println!("cargo:rerun-if-changed=config.json");
    }
}
