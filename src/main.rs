fn main() {
    hoist::cli::run();
}
