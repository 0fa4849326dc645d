use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("gpu-usage version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
