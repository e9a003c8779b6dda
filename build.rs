use std::{env, fs, path::Path};

// Copies config.json next to the stockroom-server binary so it can be started
// from target/<profile>/ without extra arguments.
fn main() {
    println!("cargo:rerun-if-changed=config.json");

    let src = Path::new("config.json");
    if !src.exists() {
        return;
    }

    // OUT_DIR = target/<profile>/build/<crate>/out
    let Ok(out_dir) = env::var("OUT_DIR") else {
        println!("cargo:warning=OUT_DIR not set, config.json not copied");
        return;
    };
    let Some(exe_dir) = Path::new(&out_dir).ancestors().nth(3) else {
        println!("cargo:warning=Cannot find executable directory, config.json not copied");
        return;
    };

    let dst = exe_dir.join("config.json");
    if let Err(e) = fs::copy(src, &dst) {
        println!("cargo:warning=Could NOT copy config.json to {}: {}", dst.display(), e);
    }
}
