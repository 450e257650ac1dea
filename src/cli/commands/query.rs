use centris::config::Settings;

/// Print the UpdateQuery body built from the configured filter.
pub fn cmd_query(settings: &Settings) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&settings.query.to_payload())?);
    Ok(())
}
