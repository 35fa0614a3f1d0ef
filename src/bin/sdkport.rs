fn main() -> anyhow::Result<()> {
    sdkport::cli::run_cli()
}
