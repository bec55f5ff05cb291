use anyhow::Result;

fn main() -> Result<()> {
    gearsum::cli::run()
}
