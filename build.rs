// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    env,
    path::{Path, PathBuf},
};

// Use the "built" crate to generate some useful build-time information,
// including the git hash and compiler version.
fn write_built(out_dir: &Path) {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    built::write_built_file_with_opts(Some(Path::new(&manifest_dir)), &out_dir.join("built.rs"))
        .expect("Failed to acquire build-time information");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR env. variable not defined!"));
    write_built(&out_dir);

    #[cfg(all(feature = "cuda", feature = "hip"))]
    compile_error!("Both 'cuda' and 'hip' features are enabled; only one can be used.");

    #[cfg(any(feature = "cuda", feature = "hip"))]
    gpu::build();
}

#[cfg(any(feature = "cuda", feature = "hip"))]
mod gpu {
    use std::env;

    #[cfg(feature = "cuda")]
    const DEFAULT_CUDA_ARCHES: &[u16] = &[60, 70, 80];
    #[cfg(feature = "cuda")]
    const DEFAULT_CUDA_SMS: &[u16] = &[60, 70, 75, 80, 86];

    #[cfg(feature = "cuda")]
    fn parse_and_validate_compute(c: &str, var: &str) -> Vec<u16> {
        let mut out = vec![];
        for compute in c.trim().split(',') {
            // Check that there's only two numeric characters.
            if compute.len() != 2 {
                panic!("When parsing {var}, found '{compute}', which is not a two-digit number!")
            }

            match compute.parse() {
                Ok(p) => out.push(p),
                Err(_) => panic!("'{compute}', part of {var}, couldn't be parsed into a number!"),
            }
        }
        out
    }

    pub(super) fn build() {
        // Find .cu and .h files; if any of them change, tell cargo to
        // recompile.
        let mut gpu_files = vec![];
        for entry in std::fs::read_dir("src_gpu").expect("src_gpu directory doesn't exist!") {
            let entry = entry.expect("Couldn't access file in src_gpu directory");
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            match path.extension().and_then(|os_str| os_str.to_str()) {
                Some("cu") => {
                    println!("cargo:rerun-if-changed={}", path.display());
                    gpu_files.push(path);
                }

                Some("h" | "cuh") => {
                    println!("cargo:rerun-if-changed={}", path.display());
                }

                _ => (),
            }
        }

        let mut gpu_target = cc::Build::new();

        #[cfg(feature = "cuda")]
        {
            println!("cargo:rerun-if-env-changed=ASTROIO_CUDA_COMPUTE");
            let (arches, sms) = match env::var("ASTROIO_CUDA_COMPUTE") {
                Ok(c) => {
                    let compute = parse_and_validate_compute(&c, "ASTROIO_CUDA_COMPUTE");
                    let sms = compute.clone();
                    (compute, sms)
                }
                Err(_) => {
                    println!("cargo:warning=No ASTROIO_CUDA_COMPUTE; Passing arch=compute_{DEFAULT_CUDA_ARCHES:?} and code=sm_{DEFAULT_CUDA_SMS:?} to nvcc");
                    (DEFAULT_CUDA_ARCHES.to_vec(), DEFAULT_CUDA_SMS.to_vec())
                }
            };

            gpu_target.cuda(true).cudart("shared");
            for arch in arches {
                for &sm in &sms {
                    if sm < arch {
                        continue;
                    }

                    gpu_target.flag("-gencode");
                    gpu_target.flag(&format!("arch=compute_{arch},code=sm_{sm}"));
                }
            }
        }

        #[cfg(feature = "hip")]
        {
            println!("cargo:rerun-if-env-changed=HIP_PATH");
            println!("cargo:rerun-if-env-changed=ASTROIO_HIP_ARCH");
            let hip_path = env::var("HIP_PATH").unwrap_or_else(|_| "/opt/rocm".to_string());
            gpu_target
                .compiler(format!("{hip_path}/bin/hipcc"))
                .cpp(true)
                .define("__HIP_PLATFORM_AMD__", None);
            if let Ok(arch) = env::var("ASTROIO_HIP_ARCH") {
                for a in arch.trim().split(',') {
                    gpu_target.flag(&format!("--offload-arch={a}"));
                }
            }
            println!("cargo:rustc-link-search=native={hip_path}/lib");
            println!("cargo:rustc-link-lib=dylib=amdhip64");
        }

        gpu_target.define(
            // The DEBUG env. variable is set by cargo. If running "cargo build
            // --release", DEBUG is "false", otherwise "true".
            match env::var("DEBUG").as_deref() {
                Ok("false") => "NDEBUG",
                _ => "DEBUG",
            },
            None,
        );

        for f in gpu_files {
            gpu_target.file(f);
        }
        gpu_target.compile("astroio_gpu");
    }
}
