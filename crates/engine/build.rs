use std::{fs, path::Path};

fn main() {
    println!("cargo::rerun-if-changed=../../bin/");
    println!("cargo::rerun-if-changed=shaders/");
    println!("cargo::rerun-if-changed=assets/");

    let Ok(out_dir) = std::env::var("OUT_DIR") else {
        println!("cargo::warning=OUT_DIR is not set");
        return;
    };
    // the directory the executable is placed in
    let target_dir = Path::new(&out_dir).join("../../../");

    copy_dll(&target_dir, "dxcompiler.dll");
    copy_dll(&target_dir, "dxil.dll");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let manifest_dir = Path::new(&manifest_dir);
    copy_dir(&manifest_dir.join("shaders"), &target_dir.join("shaders"));
    copy_dir(&manifest_dir.join("assets"), &target_dir.join("assets"));
}

/// The DLLs are optional: without them DXC is loaded from the system.
fn copy_dll(target_dir: &Path, dll: &str) {
    let src = Path::new("../../bin/").join(dll);
    if !src.exists() {
        return;
    }

    let dst = target_dir.join(dll);
    if let Err(e) = fs::copy(&src, &dst) {
        println!("cargo::warning=Failed to copy {}: {e}", src.display());
    }
}

fn copy_dir(src_dir: &Path, dst_dir: &Path) {
    if let Err(e) = fs::create_dir_all(dst_dir) {
        println!("cargo::warning=Failed to create {}: {e}", dst_dir.display());
        return;
    }

    let entries = match fs::read_dir(src_dir) {
        Ok(entries) => entries,
        Err(e) => {
            println!("cargo::warning=Failed to read {}: {e}", src_dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let src = entry.path();
        if !src.is_file() {
            continue;
        }
        let dst = dst_dir.join(entry.file_name());
        if let Err(e) = fs::copy(&src, &dst) {
            println!("cargo::warning=Failed to copy {}: {e}", src.display());
        }
    }
}
