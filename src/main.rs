fn main() -> anyhow::Result<()> {
    ks_notes::cli::run()
}
