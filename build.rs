fn main() {
    #[cfg(not(any(feature = "isahc", feature = "reqwest")))]
    compile_error!("At least one HTTP backend feature (isahc or reqwest) must be enabled");
}
