fn main() -> anyhow::Result<()> {
    faqledger::run()?;
    Ok(())
}
