fn main() {
    println!("cargo:rerun-if-env-changed=IMAGE_CUSTOMIZER_VERSION");
}
