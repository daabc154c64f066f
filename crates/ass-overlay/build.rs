fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "libass")]
    link_libass();
}

/// Locate the system libass for the native backend
///
/// `LIBASS_LIB_DIR` bypasses pkg-config for toolchains without it.
#[cfg(feature = "libass")]
fn link_libass() {
    println!("cargo:rerun-if-env-changed=LIBASS_LIB_DIR");
    if let Ok(dir) = std::env::var("LIBASS_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
        println!("cargo:rustc-link-lib=ass");
        return;
    }

    let probe = pkg_config::Config::new()
        .atleast_version("0.14.0")
        .probe("libass");
    let Err(err) = probe else {
        return;
    };

    if cfg!(target_os = "macos") {
        // Homebrew prefixes for Apple Silicon and Intel
        println!("cargo:warning=libass not found through pkg-config ({err}), using Homebrew paths");
        println!("cargo:rustc-link-search=native=/opt/homebrew/lib");
        println!("cargo:rustc-link-search=native=/usr/local/lib");
        println!("cargo:rustc-link-lib=ass");
    } else {
        panic!("libass >= 0.14 is required for the `libass` feature ({err}); set LIBASS_LIB_DIR or install the libass development package");
    }
}
