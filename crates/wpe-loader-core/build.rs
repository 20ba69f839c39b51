fn main() {
    // `WPE_BACKEND` is baked in with `option_env!`; rebuild when it changes.
    println!("cargo:rerun-if-env-changed=WPE_BACKEND");
    println!("cargo:rerun-if-changed=build.rs");
}
