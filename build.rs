use std::{env, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-env-changed=OPENCL_LIB_DIR");
    println!("cargo:rerun-if-env-changed=POCL_RT_PATH");

    // explicit ICD loader location wins over whatever the system linker finds
    if let Ok(e) = env::var("OPENCL_LIB_DIR") {
        let opencl_lib_dir = PathBuf::from(e);
        println!("cargo:rustc-link-search=native={}", opencl_lib_dir.display());
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", opencl_lib_dir.display());
    }
    else if let Ok(e) = env::var("POCL_RT_PATH") {
        let mut pocl_runtime = PathBuf::from(e);
        pocl_runtime.push("lib");
        println!("cargo:rustc-link-search=native={}", pocl_runtime.display());
    }
}
